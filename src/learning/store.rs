//! Learning Context Store - rotation, SMART goals, and per-category progress
//!
//! The whole context lives in memory and is written to a single JSON file
//! after every mutation. Loading is all-or-nothing: a file that fails to
//! parse or validate leaves the in-memory state untouched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::error::ContextError;
use super::observer::{ContextObserver, StoreEvent, TracingObserver};
use super::types::{
    CategoryMap, CategoryProgress, CategorySummary, GoalRecord, LearningCategory, RecentGoal,
    RotationContext, SmartGoal,
};

/// Completed goals shown per category in a summary
pub const RECENT_GOALS_PER_CATEGORY: usize = 3;

/// Result of writing the context file
#[derive(Debug)]
pub enum PersistOutcome {
    Saved,
    /// The store has no backing file
    NotConfigured,
    Failed(ContextError),
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved)
    }

    pub fn error(&self) -> Option<&ContextError> {
        match self {
            PersistOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of reading the context file at construction
#[derive(Debug)]
pub enum LoadOutcome {
    /// No backing file yet, started empty
    Fresh,
    Loaded,
    /// The file could not be used, started empty
    Failed(ContextError),
}

/// Result of `add_smart_goal`
#[derive(Debug)]
pub struct GoalAdded {
    /// Previously active goal that was dropped without completion
    pub abandoned: Option<SmartGoal>,
    pub persist: PersistOutcome,
}

/// Result of `complete_active_goal`
#[derive(Debug)]
pub enum Completion {
    NoActiveGoal,
    Completed { goal: SmartGoal, persist: PersistOutcome },
}

/// On-disk layout
#[derive(Serialize)]
struct PersistedContextRef<'a> {
    rotation: &'a RotationContext,
    category_progress: Vec<&'a CategoryProgress>,
    active_goal: Option<&'a SmartGoal>,
}

#[derive(Deserialize)]
struct PersistedContext {
    rotation: RotationContext,
    category_progress: Vec<CategoryProgress>,
    active_goal: Option<SmartGoal>,
}

#[derive(Debug, Clone, PartialEq)]
struct ContextState {
    rotation: RotationContext,
    progress: CategoryMap<CategoryProgress>,
    active_goal: Option<SmartGoal>,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            rotation: RotationContext::default(),
            progress: CategoryMap::from_fn(CategoryProgress::empty),
            active_goal: None,
        }
    }
}

impl ContextState {
    /// Validate a decoded file and turn it into a complete state
    fn from_persisted(persisted: PersistedContext) -> Result<Self, ContextError> {
        let mut progress = CategoryMap::from_fn(CategoryProgress::empty);
        let mut seen: CategoryMap<bool> = CategoryMap::default();

        for entry in persisted.category_progress {
            let category = entry.category;
            if seen[category] {
                return Err(ContextError::DuplicateCategory(category));
            }
            seen[category] = true;

            if (entry.total_goals as usize) < entry.completed_goals.len() {
                return Err(ContextError::InvariantViolation(format!(
                    "{} has {} completed goals but a total of {}",
                    category,
                    entry.completed_goals.len(),
                    entry.total_goals
                )));
            }
            for goal in &entry.completed_goals {
                if goal.category != category {
                    return Err(ContextError::InvariantViolation(format!(
                        "goal {} is a {} goal filed under {}",
                        goal.id, goal.category, category
                    )));
                }
                if goal.completed_at.is_none() {
                    return Err(ContextError::InvariantViolation(format!(
                        "completed goal {} has no completion time",
                        goal.id
                    )));
                }
            }
            progress[category] = entry;
        }

        if let Some(goal) = &persisted.active_goal {
            if goal.completed_at.is_some() {
                return Err(ContextError::InvariantViolation(format!(
                    "active goal {} is already completed",
                    goal.id
                )));
            }
        }

        Ok(Self {
            rotation: persisted.rotation,
            progress,
            active_goal: persisted.active_goal,
        })
    }
}

/// Learner context bound to an optional JSON file
pub struct LearningContextStore {
    path: Option<PathBuf>,
    state: ContextState,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ContextObserver>,
    initial_load: LoadOutcome,
}

impl LearningContextStore {
    /// Open a store using the system clock and tracing for events
    pub fn new(path: Option<PathBuf>) -> Self {
        Self::with_parts(path, Arc::new(SystemClock), Arc::new(TracingObserver))
    }

    /// Open a store with explicit collaborators.
    ///
    /// If `path` exists it is loaded immediately; a failed load leaves the
    /// store empty and is reported through [`Self::initial_load`].
    pub fn with_parts(
        path: Option<PathBuf>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ContextObserver>,
    ) -> Self {
        let mut store = Self {
            path,
            state: ContextState::default(),
            clock,
            observer,
            initial_load: LoadOutcome::Fresh,
        };

        let exists = store.path.as_deref().map(Path::exists).unwrap_or(false);
        if exists {
            store.initial_load = match store.load_context() {
                Ok(()) => LoadOutcome::Loaded,
                Err(e) => LoadOutcome::Failed(e),
            };
        }
        store
    }

    /// Store with no backing file
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn initial_load(&self) -> &LoadOutcome {
        &self.initial_load
    }

    pub fn rotation(&self) -> &RotationContext {
        &self.state.rotation
    }

    pub fn active_goal(&self) -> Option<&SmartGoal> {
        self.state.active_goal.as_ref()
    }

    pub fn progress(&self) -> &CategoryMap<CategoryProgress> {
        &self.state.progress
    }

    pub fn progress_for(&self, category: LearningCategory) -> &CategoryProgress {
        &self.state.progress[category]
    }

    /// Replace the current rotation
    pub fn update_rotation(&mut self, specialty: &str, setting: &str) -> PersistOutcome {
        self.state.rotation = RotationContext::new(specialty, setting);
        self.emit(StoreEvent::RotationUpdated {
            rotation: &self.state.rotation,
        });
        self.save_context()
    }

    /// Make `goal` the active goal.
    ///
    /// Any goal that was already active is dropped without being completed
    /// and handed back in [`GoalAdded::abandoned`].
    pub fn add_smart_goal(&mut self, mut goal: SmartGoal) -> GoalAdded {
        goal.completed_at = None;
        let progress = &mut self.state.progress[goal.category];
        progress.total_goals = progress.total_goals.saturating_add(1);

        let abandoned = self.state.active_goal.replace(goal);
        if let Some(previous) = &abandoned {
            self.emit(StoreEvent::GoalAbandoned { goal: previous });
        }
        if let Some(active) = &self.state.active_goal {
            self.emit(StoreEvent::GoalAdded { goal: active });
        }

        GoalAdded {
            abandoned,
            persist: self.save_context(),
        }
    }

    /// Stamp the active goal complete and file it under its category
    pub fn complete_active_goal(&mut self) -> Completion {
        let Some(mut goal) = self.state.active_goal.take() else {
            return Completion::NoActiveGoal;
        };

        goal.completed_at = Some(self.clock.now());
        self.state.progress[goal.category]
            .completed_goals
            .push(goal.clone());
        self.emit(StoreEvent::GoalCompleted { goal: &goal });

        Completion::Completed {
            persist: self.save_context(),
            goal,
        }
    }

    /// Per-category counts with the most recent completed goals
    pub fn get_category_summary(&self) -> CategoryMap<CategorySummary> {
        self.category_summary_with_limit(RECENT_GOALS_PER_CATEGORY)
    }

    pub fn category_summary_with_limit(&self, limit: usize) -> CategoryMap<CategorySummary> {
        CategoryMap::from_fn(|category| {
            let progress = &self.state.progress[category];
            CategorySummary {
                category,
                completed: progress.completed_goals.len(),
                total: progress.total_goals,
                recent_goals: recent_goals(&progress.completed_goals, limit),
            }
        })
    }

    /// Every goal created under the current rotation, newest first
    pub fn get_all_goals(&self) -> Vec<GoalRecord> {
        let rotation = &self.state.rotation;

        let mut records: Vec<GoalRecord> = self
            .state
            .progress
            .values()
            .flat_map(|p| p.completed_goals.iter())
            .filter(|g| rotation.matches(g))
            .map(|g| GoalRecord {
                goal: g.clone(),
                active: false,
            })
            .collect();

        if let Some(goal) = self.state.active_goal.as_ref().filter(|g| rotation.matches(g)) {
            records.push(GoalRecord {
                goal: goal.clone(),
                active: true,
            });
        }

        records.sort_by(|a, b| b.goal.created_at.cmp(&a.goal.created_at));
        records
    }

    /// Replace the in-memory state with the contents of the backing file
    pub fn load_context(&mut self) -> Result<(), ContextError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        match read_state(&path) {
            Ok(state) => {
                self.state = state;
                self.emit(StoreEvent::Loaded { path: &path });
                Ok(())
            }
            Err(e) => {
                self.emit(StoreEvent::LoadFailed {
                    path: &path,
                    error: &e,
                });
                Err(e)
            }
        }
    }

    /// Write the full state to the backing file
    pub fn save_context(&self) -> PersistOutcome {
        let Some(path) = self.path.as_deref() else {
            return PersistOutcome::NotConfigured;
        };

        match self.write_state(path) {
            Ok(()) => {
                self.emit(StoreEvent::Saved { path });
                PersistOutcome::Saved
            }
            Err(e) => {
                self.emit(StoreEvent::SaveFailed { path, error: &e });
                PersistOutcome::Failed(e)
            }
        }
    }

    fn write_state(&self, path: &Path) -> Result<(), ContextError> {
        let persisted = PersistedContextRef {
            rotation: &self.state.rotation,
            category_progress: self.state.progress.values().collect(),
            active_goal: self.state.active_goal.as_ref(),
        };
        let json = serde_json::to_string_pretty(&persisted).map_err(ContextError::Serialize)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;
        }

        // Write beside the target and rename so a crash never truncates it
        let tmp = temp_path(path);
        std::fs::write(&tmp, json).map_err(|e| ContextError::io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(ContextError::io(path, e));
        }
        Ok(())
    }

    fn emit(&self, event: StoreEvent<'_>) {
        self.observer.on_event(&event);
    }
}

fn read_state(path: &Path) -> Result<ContextState, ContextError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ContextError::NotFound(path.to_path_buf()),
        _ => ContextError::io(path, e),
    })?;
    let persisted: PersistedContext =
        serde_json::from_str(&content).map_err(|source| ContextError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    ContextState::from_persisted(persisted)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Newest completions first; a missing timestamp counts as the oldest
fn recent_goals(completed: &[SmartGoal], limit: usize) -> Vec<RecentGoal> {
    let mut ordered: Vec<&SmartGoal> = completed.iter().collect();
    ordered.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    ordered
        .into_iter()
        .take(limit)
        .map(|g| RecentGoal {
            smart_version: g.smart_version.clone(),
            completed_at: g.completed_at,
        })
        .collect()
}
