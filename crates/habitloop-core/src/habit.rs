//! Habit definitions and importance scoring support.
//!
//! A habit is a recurring user behavior. Importance comes in two flavors:
//! an explicit value set by the user and an inferred value produced by the
//! [`ImportanceScorer`](crate::ImportanceScorer) batch job. Both live in
//! `[0, 1]` when present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque habit identifier.
pub type HabitId = Uuid;

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFrequency {
    #[default]
    Daily,
    Weekdays,
    Weekly,
    Custom,
}

/// A recurring user behavior tracked by the system.
///
/// Habits are never deleted, only archived; downstream engines must keep
/// working when execution history references an archived or missing habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,

    /// Human-readable name, also used for keyword-based message phrasing
    pub name: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub target_frequency: TargetFrequency,

    /// Explicit importance set by the user (0.0 to 1.0)
    #[serde(default)]
    pub importance: Option<f64>,

    /// Importance inferred from behavior (0.0 to 1.0)
    #[serde(default)]
    pub importance_inferred: Option<f64>,

    /// Optional bundle of soft signals used by importance inference
    #[serde(default)]
    pub hidden_parameters: Option<HiddenParameters>,

    #[serde(default)]
    pub is_archived: bool,

    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a habit with default frequency and no importance data
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            target_frequency: TargetFrequency::Daily,
            importance: None,
            importance_inferred: None,
            hidden_parameters: None,
            is_archived: false,
            created_at: Utc::now(),
        }
    }

    /// Final importance blending explicit and inferred values.
    ///
    /// When an explicit value exists it dominates (70%) with the inferred
    /// value as a corrective (30%); otherwise the inferred value is used
    /// as-is. Missing values default to 0.5.
    pub fn final_importance(&self) -> f64 {
        let inferred = self.importance_inferred.unwrap_or(0.5);
        match self.importance {
            Some(explicit) => explicit * 0.7 + inferred * 0.3,
            None => inferred,
        }
    }

    /// Bucket the final importance into a coarse category
    pub fn importance_category(&self) -> ImportanceCategory {
        let importance = self.final_importance();
        if importance >= 0.8 {
            ImportanceCategory::Critical
        } else if importance >= 0.6 {
            ImportanceCategory::High
        } else if importance >= 0.4 {
            ImportanceCategory::Medium
        } else {
            ImportanceCategory::Low
        }
    }
}

/// Soft signals about a habit that the user rarely states directly.
///
/// All fields are optional; inference treats a missing field as a zero
/// contribution rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HiddenParameters {
    /// How rigid the habit's schedule is (0.0 to 1.0, higher = stricter)
    #[serde(default)]
    pub rigidity_level: Option<f64>,

    /// How acceptable an occasional miss is (0.0 to 1.0, higher = more tolerant)
    #[serde(default)]
    pub tolerance_for_failure: Option<f64>,

    /// Emotional weight the habit carries (0.0 to 1.0)
    #[serde(default)]
    pub emotional_significance: Option<f64>,

    /// Pressure from outside parties (0.0 to 1.0)
    #[serde(default)]
    pub external_pressure: Option<f64>,

    /// Momentum from an already-established streak (0.0 to 1.0)
    #[serde(default)]
    pub existing_momentum: Option<f64>,

    /// How realistic the user's own expectation is (0.0 to 1.0)
    #[serde(default)]
    pub realistic_expectation: Option<f64>,

    /// Environmental cues that prompt the habit
    #[serde(default)]
    pub contextual_triggers: Option<Vec<String>>,

    /// Whether the habit varies with the season
    #[serde(default)]
    pub seasonal_variation: Option<bool>,
}

/// Coarse importance bucket derived from [`Habit::final_importance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceCategory {
    Critical,
    High,
    Medium,
    Low,
}

impl ImportanceCategory {
    /// Sort key, higher = more important
    pub fn priority(&self) -> u8 {
        match self {
            ImportanceCategory::Critical => 3,
            ImportanceCategory::High => 2,
            ImportanceCategory::Medium => 1,
            ImportanceCategory::Low => 0,
        }
    }
}
