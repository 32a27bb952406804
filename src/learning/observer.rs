//! Store event reporting
//!
//! The store reports what it does to an observer handed in at construction
//! instead of writing to a process-wide logger.

use std::path::Path;

use tracing::{debug, error, info, warn};

use super::error::ContextError;
use super::types::{RotationContext, SmartGoal};

/// Something the store did or failed to do
#[derive(Debug)]
pub enum StoreEvent<'a> {
    Loaded { path: &'a Path },
    LoadFailed { path: &'a Path, error: &'a ContextError },
    Saved { path: &'a Path },
    SaveFailed { path: &'a Path, error: &'a ContextError },
    RotationUpdated { rotation: &'a RotationContext },
    GoalAdded { goal: &'a SmartGoal },
    /// An active goal was replaced before it was completed
    GoalAbandoned { goal: &'a SmartGoal },
    GoalCompleted { goal: &'a SmartGoal },
}

impl StoreEvent<'_> {
    /// Short stable name, mainly for tests
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::Loaded { .. } => "loaded",
            StoreEvent::LoadFailed { .. } => "load_failed",
            StoreEvent::Saved { .. } => "saved",
            StoreEvent::SaveFailed { .. } => "save_failed",
            StoreEvent::RotationUpdated { .. } => "rotation_updated",
            StoreEvent::GoalAdded { .. } => "goal_added",
            StoreEvent::GoalAbandoned { .. } => "goal_abandoned",
            StoreEvent::GoalCompleted { .. } => "goal_completed",
        }
    }
}

pub trait ContextObserver: Send + Sync {
    fn on_event(&self, event: &StoreEvent<'_>);
}

/// Forwards store events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ContextObserver for TracingObserver {
    fn on_event(&self, event: &StoreEvent<'_>) {
        match event {
            StoreEvent::Loaded { path } => info!("Loaded learning context from {}", path.display()),
            StoreEvent::LoadFailed { path, error } => {
                error!("Failed to load learning context from {}: {}", path.display(), error)
            }
            StoreEvent::Saved { path } => debug!("Saved learning context to {}", path.display()),
            StoreEvent::SaveFailed { path, error } => {
                error!("Failed to save learning context to {}: {}", path.display(), error)
            }
            StoreEvent::RotationUpdated { rotation } => {
                info!("Rotation updated: {} ({})", rotation.specialty, rotation.setting)
            }
            StoreEvent::GoalAdded { goal } => info!("Added {} goal {}", goal.category, goal.id),
            StoreEvent::GoalAbandoned { goal } => {
                warn!("Active goal {} replaced before completion", goal.id)
            }
            StoreEvent::GoalCompleted { goal } => info!("Completed {} goal {}", goal.category, goal.id),
        }
    }
}

/// Keeps event names in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<&'static str>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every event seen so far
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| **e == name).count()
    }
}

impl ContextObserver for RecordingObserver {
    fn on_event(&self, event: &StoreEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.name());
        }
    }
}
