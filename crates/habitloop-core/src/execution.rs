//! Habit execution records.
//!
//! One record per detected execution, created by the extraction layer and
//! never mutated afterwards. Engines consume them read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::HabitId;

/// How an execution was established
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    /// The user explicitly said they did it
    #[default]
    Direct,
    /// Partially completed, or uncertain
    Partial,
    /// Deduced from context
    Inferred,
}

/// A single detected execution of a habit.
///
/// `habit_id` is optional: the owning habit may have been removed since the
/// record was written, and orphaned records are simply skipped by consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitExecution {
    pub id: Uuid,

    #[serde(default)]
    pub habit_id: Option<HabitId>,

    /// The chat message this execution was extracted from, if any
    #[serde(default)]
    pub message_id: Option<Uuid>,

    #[serde(default)]
    pub execution_type: ExecutionType,

    /// 0 to 100
    #[serde(default = "default_completion")]
    pub completion_percentage: u8,

    pub executed_at: DateTime<Utc>,

    /// Consecutive-day streak at the time of execution
    #[serde(default)]
    pub days_chain: u32,
}

fn default_completion() -> u8 {
    100
}

impl HabitExecution {
    /// Record a direct, fully-completed execution
    pub fn direct(habit_id: HabitId, executed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id: Some(habit_id),
            message_id: None,
            execution_type: ExecutionType::Direct,
            completion_percentage: 100,
            executed_at,
            days_chain: 0,
        }
    }
}
