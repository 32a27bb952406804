//! Learning context tracking
//!
//! Records the learner's rotation, the active SMART goal, and per-category
//! progress, persisted to a single JSON file.

pub mod clock;
pub mod error;
pub mod observer;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ContextError;
pub use observer::{ContextObserver, RecordingObserver, StoreEvent, TracingObserver};
pub use store::{
    Completion, GoalAdded, LearningContextStore, LoadOutcome, PersistOutcome,
    RECENT_GOALS_PER_CATEGORY,
};
pub use types::{
    CategoryMap, CategoryProgress, CategorySummary, GoalRecord, LearningCategory, RecentGoal,
    RotationContext, SmartGoal,
};
