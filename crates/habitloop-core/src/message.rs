//! Suggestion message composition.
//!
//! Deterministic, keyword-driven text generation for trigger suggestions.
//! Phrasing strength comes from chain confidence, the timing qualifier from
//! the chain delay, and habit-specific wording from keyword matching on the
//! habit name. The generic fallback always exists, so every suggestion
//! produces some message.

use crate::chain::{HabitChain, PrerequisiteHabit};
use crate::habit::Habit;

/// Composes user-facing suggestion text from a habit and the chain that
/// produced it. Holds no state; depends only on its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageComposer;

impl MessageComposer {
    pub fn new() -> Self {
        Self
    }

    /// Build the full suggestion message for a chain firing toward `next_habit`
    pub fn compose(&self, next_habit: &Habit, chain: &HabitChain) -> String {
        let prefix = if chain.confidence_or_default() > 0.8 {
            "Next up"
        } else {
            "If you like, next"
        };
        let timing = Self::timing_qualifier(chain.delay_minutes);
        let action = Self::action_phrase(next_habit);

        match Self::prerequisite_clause(&chain.prerequisite_habits) {
            Some(clause) => format!("{prefix} {timing}: {action}\n  Note: {clause}"),
            None => format!("{prefix} {timing}: {action}"),
        }
    }

    /// Short reminder used by time-based trigger checks
    pub fn compose_reminder(&self, next_habit: &Habit, chain: &HabitChain) -> String {
        if chain.delay_minutes <= 5 {
            format!("Keep it going -- don't forget \"{}\"!", next_habit.name)
        } else {
            format!("It's about time for \"{}\"", next_habit.name)
        }
    }

    fn timing_qualifier(delay_minutes: u32) -> String {
        match delay_minutes {
            0 => "(continue now)".to_string(),
            1..=5 => "(right after)".to_string(),
            6..=15 => format!("(in about {delay_minutes} minutes)"),
            _ => "(after some time)".to_string(),
        }
    }

    /// Habit-specific phrasing, falling back to a generic template.
    ///
    /// Matching is on the lowercased habit name; the order of arms is the
    /// priority order when a name matches several keywords.
    fn action_phrase(habit: &Habit) -> String {
        let name = habit.name.to_lowercase();
        let softener = if habit.final_importance() > 0.8 {
            ""
        } else {
            "when you have a moment, "
        };

        if name.contains("wash") || name.contains("groom") {
            "how about washing up and getting ready? A fresh face is a good start to the day"
                .to_string()
        } else if name.contains("coffee") {
            "how about switching on the coffee maker?".to_string()
        } else if name.contains("stretch") {
            format!("{softener}how about a light stretch? It wakes the body up")
        } else if name.contains("breakfast") {
            "it's time for breakfast".to_string()
        } else if name.contains("work") {
            "it's time to start work. Have a good one!".to_string()
        } else if name.contains("bed") || name.contains("sleep") {
            "it's time to wind down for the night".to_string()
        } else {
            format!("{softener}how about \"{}\"?", habit.name)
        }
    }

    /// Mandatory prerequisites (with estimated time) listed separately from
    /// optional ones. Returns None when the chain has no prerequisites.
    fn prerequisite_clause(prerequisites: &[PrerequisiteHabit]) -> Option<String> {
        if prerequisites.is_empty() {
            return None;
        }

        let mut parts: Vec<String> = Vec::new();

        let mandatory: Vec<String> = prerequisites
            .iter()
            .filter(|p| p.mandatory)
            .map(|p| match p.estimated_minutes {
                Some(minutes) => format!("{} (about {minutes} min)", p.name),
                None => p.name.clone(),
            })
            .collect();
        if !mandatory.is_empty() {
            parts.push(format!("before that: {}", mandatory.join(", ")));
        }

        let optional: Vec<&str> = prerequisites
            .iter()
            .filter(|p| !p.mandatory)
            .map(|p| p.name.as_str())
            .collect();
        if !optional.is_empty() {
            parts.push(format!("if possible: {}", optional.join(", ")));
        }

        Some(parts.join(" / "))
    }
}
