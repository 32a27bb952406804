//! wardbuddy - learning context tracking for clinical rotations
//!
//! Keeps the learner's current rotation, a single active SMART goal, and
//! per-category progress in a JSON file that is rewritten after every change.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use wardbuddy::learning::{LearningCategory, LearningContextStore, SmartGoal};
//!
//! let mut store = LearningContextStore::new(Some("learning_context.json".into()));
//! store.update_rotation("Emergency Medicine", "ED");
//! let goal = SmartGoal::new(
//!     LearningCategory::ClinicalReasoning,
//!     "get better at chest pain",
//!     "Present 3 chest pain cases with a ranked differential by Friday",
//!     store.rotation(),
//!     Utc::now(),
//! );
//! store.add_smart_goal(goal);
//! store.complete_active_goal();
//! ```

pub mod learning;
pub mod config;
pub mod cli;

pub use learning::{
    LearningCategory,
    LearningContextStore,
    RotationContext,
    SmartGoal,
    ContextError,
};

pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Clinical learning context tracker", NAME, VERSION)
}
