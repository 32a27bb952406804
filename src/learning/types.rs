//! Learning context data model
//!
//! Rotations, SMART goals, and the fixed per-category progress table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Skill domain a goal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningCategory {
    HistoryTaking,
    PhysicalExam,
    Investigations,
    Management,
    ClinicalReasoning,
    Communication,
    ProceduralSkills,
    MedicalKnowledge,
}

impl LearningCategory {
    /// Number of categories
    pub const COUNT: usize = 8;

    /// Every category, in table order
    pub const ALL: [LearningCategory; Self::COUNT] = [
        LearningCategory::HistoryTaking,
        LearningCategory::PhysicalExam,
        LearningCategory::Investigations,
        LearningCategory::Management,
        LearningCategory::ClinicalReasoning,
        LearningCategory::Communication,
        LearningCategory::ProceduralSkills,
        LearningCategory::MedicalKnowledge,
    ];

    /// Persisted identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningCategory::HistoryTaking => "history_taking",
            LearningCategory::PhysicalExam => "physical_exam",
            LearningCategory::Investigations => "investigations",
            LearningCategory::Management => "management",
            LearningCategory::ClinicalReasoning => "clinical_reasoning",
            LearningCategory::Communication => "communication",
            LearningCategory::ProceduralSkills => "procedural_skills",
            LearningCategory::MedicalKnowledge => "medical_knowledge",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            LearningCategory::HistoryTaking => "History Taking",
            LearningCategory::PhysicalExam => "Physical Exam",
            LearningCategory::Investigations => "Investigations",
            LearningCategory::Management => "Management",
            LearningCategory::ClinicalReasoning => "Clinical Reasoning",
            LearningCategory::Communication => "Communication",
            LearningCategory::ProceduralSkills => "Procedural Skills",
            LearningCategory::MedicalKnowledge => "Medical Knowledge",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for LearningCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for LearningCategory {
    type Err = String;

    /// Accepts `history_taking`, `history-taking` or `History Taking`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        LearningCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = LearningCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!("Unknown category '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

/// Table with exactly one slot per category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap<T>([T; LearningCategory::COUNT]);

impl<T> CategoryMap<T> {
    /// Build a table by computing each category's value
    pub fn from_fn(mut f: impl FnMut(LearningCategory) -> T) -> Self {
        Self(LearningCategory::ALL.map(&mut f))
    }

    /// Iterate slots in category order
    pub fn iter(&self) -> impl Iterator<Item = (LearningCategory, &T)> {
        LearningCategory::ALL.iter().copied().zip(self.0.iter())
    }

    /// Iterate values in category order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Default> Default for CategoryMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<LearningCategory> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: LearningCategory) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<LearningCategory> for CategoryMap<T> {
    fn index_mut(&mut self, category: LearningCategory) -> &mut T {
        &mut self.0[category.index()]
    }
}

/// Where the learner currently is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationContext {
    pub specialty: String,
    pub setting: String,
}

impl RotationContext {
    pub fn new(specialty: impl Into<String>, setting: impl Into<String>) -> Self {
        Self {
            specialty: specialty.into(),
            setting: setting.into(),
        }
    }

    /// True when a goal was created under this rotation
    pub fn matches(&self, goal: &SmartGoal) -> bool {
        goal.specialty == self.specialty && goal.setting == self.setting
    }
}

/// A single learning objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartGoal {
    pub id: String,
    pub category: LearningCategory,
    pub original_input: String,
    pub smart_version: String,
    pub specialty: String,
    pub setting: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Timestamp reading that accepts RFC 3339 and offset-less ISO-8601.
///
/// Offset-less values are taken as UTC. Writing always uses RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(s: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
            .ok_or_else(|| format!("invalid ISO-8601 timestamp '{}'", s))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

impl SmartGoal {
    /// Create an active goal with a fresh id, snapshotting the rotation
    pub fn new(
        category: LearningCategory,
        original_input: &str,
        smart_version: &str,
        rotation: &RotationContext,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            original_input: original_input.to_string(),
            smart_version: smart_version.to_string(),
            specialty: rotation.specialty.clone(),
            setting: rotation.setting.clone(),
            created_at,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Per-category aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: LearningCategory,
    /// In completion order
    pub completed_goals: Vec<SmartGoal>,
    /// Goals ever added to this category, including the active one
    pub total_goals: u32,
}

impl CategoryProgress {
    pub fn empty(category: LearningCategory) -> Self {
        Self {
            category,
            completed_goals: Vec::new(),
            total_goals: 0,
        }
    }
}

/// Summary row for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: LearningCategory,
    pub completed: usize,
    pub total: u32,
    /// Most recently completed first
    pub recent_goals: Vec<RecentGoal>,
}

/// Completed goal reduced for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentGoal {
    pub smart_version: String,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Plain record form of a goal returned by goal listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalRecord {
    #[serde(flatten)]
    pub goal: SmartGoal,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_map_covers_all_in_order() {
        let map = CategoryMap::from_fn(CategoryProgress::empty);
        let categories: Vec<LearningCategory> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(categories, LearningCategory::ALL.to_vec());
        for (category, progress) in map.iter() {
            assert_eq!(progress.category, category);
        }
    }

    #[test]
    fn test_category_map_index_mut() {
        let mut map: CategoryMap<u32> = CategoryMap::default();
        map[LearningCategory::Management] += 2;
        assert_eq!(map[LearningCategory::Management], 2);
        assert_eq!(map.values().sum::<u32>(), 2);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("history_taking".parse::<LearningCategory>().unwrap(), LearningCategory::HistoryTaking);
        assert_eq!("Physical Exam".parse::<LearningCategory>().unwrap(), LearningCategory::PhysicalExam);
        assert_eq!("procedural-skills".parse::<LearningCategory>().unwrap(), LearningCategory::ProceduralSkills);
        assert!("surgery".parse::<LearningCategory>().is_err());
    }

    #[test]
    fn test_category_serde_value() {
        let json = serde_json::to_string(&LearningCategory::ClinicalReasoning).unwrap();
        assert_eq!(json, "\"clinical_reasoning\"");
        for category in LearningCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json.trim_matches('"'), category.as_str());
        }
    }

    #[test]
    fn test_timestamp_parse_variants() {
        let utc = Utc.with_ymd_and_hms(2024, 11, 5, 10, 15, 30).unwrap();
        assert_eq!(timestamp::parse("2024-11-05T10:15:30Z").unwrap(), utc);
        assert_eq!(timestamp::parse("2024-11-05T12:15:30+02:00").unwrap(), utc);
        assert_eq!(timestamp::parse("2024-11-05T10:15:30").unwrap(), utc);
        assert_eq!(timestamp::parse("2024-11-05 10:15:30").unwrap(), utc);
        let fractional = timestamp::parse("2024-11-05T10:15:30.123456").unwrap();
        assert_eq!(fractional, utc + chrono::Duration::microseconds(123_456));
        assert!(timestamp::parse("05/11/2024").is_err());
    }

    #[test]
    fn test_goal_reads_offset_less_timestamps_and_writes_rfc3339() {
        let json = r#"{
            "id": "g1", "category": "management",
            "original_input": "sepsis", "smart_version": "SMART sepsis",
            "specialty": "ED", "setting": "Resus",
            "created_at": "2024-11-05T10:15:30.123456",
            "completed_at": "2024-11-06T08:00:00"
        }"#;
        let goal: SmartGoal = serde_json::from_str(json).unwrap();
        let created = Utc.with_ymd_and_hms(2024, 11, 5, 10, 15, 30).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(goal.created_at, created);
        assert_eq!(goal.completed_at, Some(Utc.with_ymd_and_hms(2024, 11, 6, 8, 0, 0).unwrap()));

        let written = serde_json::to_value(&goal).unwrap();
        assert_eq!(written["completed_at"], "2024-11-06T08:00:00Z");
        let reread: SmartGoal = serde_json::from_value(written).unwrap();
        assert_eq!(reread, goal);
    }

    #[test]
    fn test_goal_completed_at_null_or_missing() {
        let base = r#""id": "g1", "category": "management", "original_input": "a",
            "smart_version": "b", "specialty": "", "setting": "",
            "created_at": "2024-11-05T10:15:30Z""#;
        let explicit: SmartGoal = serde_json::from_str(&format!("{{{}, \"completed_at\": null}}", base)).unwrap();
        let missing: SmartGoal = serde_json::from_str(&format!("{{{}}}", base)).unwrap();
        assert!(explicit.completed_at.is_none());
        assert!(missing.completed_at.is_none());
    }

    #[test]
    fn test_rotation_matches_goal() {
        let rotation = RotationContext::new("Cardiology", "Ward");
        let goal = SmartGoal::new(LearningCategory::Management, "learn HF", "SMART HF", &rotation, Utc::now());
        assert!(rotation.matches(&goal));
        assert!(!RotationContext::new("Cardiology", "Clinic").matches(&goal));
        assert!(!goal.is_completed());
        assert!(!goal.id.is_empty());
    }
}
