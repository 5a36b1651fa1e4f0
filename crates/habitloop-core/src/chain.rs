//! Habit chain definitions.
//!
//! A chain states that completing a set of trigger habits should prompt a
//! follow-up habit, with timing and confidence metadata. Trigger habits and
//! prerequisites are first-class typed fields; serialization happens only at
//! the seed/repository boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::HabitId;

/// Opaque chain identifier.
pub type ChainId = Uuid;

/// When a chain is allowed to fire once its trigger habits are observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Fire as soon as any trigger habit is executed
    Immediate,

    /// Fire after a delay once any trigger habit is executed
    TimeAfter {
        delay_minutes: u32,
    },

    /// Fire only when every trigger habit has been executed
    AllRequired,

    /// Fire on any trigger habit, in a context the caller interprets
    Contextual,
}

/// A directed trigger -> next relationship between habits.
///
/// `next_habit_id` should reference an existing, non-archived habit, but a
/// dangling reference must never crash an engine; the chain is simply
/// treated as void.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitChain {
    pub id: ChainId,

    /// Habits whose execution may cause `next_habit_id` to be suggested.
    /// Order matters: it defines the expected execution sequence.
    pub trigger_habits: Vec<HabitId>,

    /// The habit to suggest when the chain fires
    pub next_habit_id: HabitId,

    pub trigger_condition: TriggerCondition,

    /// Suggested delay between trigger and next habit
    #[serde(default)]
    pub delay_minutes: u32,

    /// Confidence that this chain reflects a real behavioral link (0.0 to 1.0)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Ancillary habits recommended before the next habit
    #[serde(default)]
    pub prerequisite_habits: Vec<PrerequisiteHabit>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl HabitChain {
    /// Create an active chain with no prerequisites or confidence data
    pub fn new(
        trigger_habits: Vec<HabitId>,
        next_habit_id: HabitId,
        trigger_condition: TriggerCondition,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_habits,
            next_habit_id,
            trigger_condition,
            delay_minutes: 0,
            confidence: None,
            prerequisite_habits: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Confidence with the missing-value default applied
    pub fn confidence_or_default(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    /// All habit ids this chain touches: the next habit plus its triggers
    pub fn chain_habit_ids(&self) -> Vec<HabitId> {
        let mut ids = Vec::with_capacity(self.trigger_habits.len() + 1);
        ids.push(self.next_habit_id);
        ids.extend(self.trigger_habits.iter().copied());
        ids
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisite_habits.is_empty()
    }
}

/// An ancillary habit recommended before a chain's next habit.
///
/// Distinct from trigger habits: prerequisites are advice attached to a
/// suggestion, not gates on whether the chain fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteHabit {
    pub habit_id: HabitId,

    /// Denormalized name so a suggestion can be phrased without a lookup
    pub name: String,

    #[serde(default = "default_mandatory")]
    pub mandatory: bool,

    #[serde(default)]
    pub estimated_minutes: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_mandatory() -> bool {
    true
}

impl PrerequisiteHabit {
    pub fn mandatory(habit_id: HabitId, name: impl Into<String>) -> Self {
        Self {
            habit_id,
            name: name.into(),
            mandatory: true,
            estimated_minutes: None,
            description: None,
        }
    }

    pub fn optional(habit_id: HabitId, name: impl Into<String>) -> Self {
        Self {
            habit_id,
            name: name.into(),
            mandatory: false,
            estimated_minutes: None,
            description: None,
        }
    }
}
