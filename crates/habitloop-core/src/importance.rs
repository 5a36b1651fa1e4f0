//! Habit importance inference.
//!
//! A weighted linear scorer that estimates how important a habit is to the
//! user from hidden parameters, execution history, position in the chain
//! graph, and temporal patterns. Secondary to the chain engines; the
//! resulting score feeds `Habit::importance_inferred` via whatever layer
//! owns persistence.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use tracing::warn;

use crate::habit::{Habit, HabitId, HiddenParameters};
use crate::repository::{ChainFilter, HabitFilter, HabitRepository};

/// Base score before any weighted term is applied
const BASE_SCORE: f64 = 0.5;

/// Infers habit importance from behavioral signals.
///
/// Total on all inputs: a repository failure zeroes the affected term
/// instead of failing the whole score.
pub struct ImportanceScorer<R> {
    repository: R,
}

impl<R: HabitRepository> ImportanceScorer<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Infer the importance of one habit as of now, clamped to `[0, 1]`.
    pub fn infer_importance(&self, habit: &Habit) -> f64 {
        self.infer_importance_at(habit, Utc::now())
    }

    pub fn infer_importance_at(&self, habit: &Habit, as_of: DateTime<Utc>) -> f64 {
        let mut score = BASE_SCORE;

        if let Some(params) = &habit.hidden_parameters {
            score += hidden_parameters_score(params);
        }
        score += self.execution_history_score(habit.id, as_of);
        score += self.chain_position_score(habit.id);
        score += self.temporal_pattern_score(habit.id, as_of);
        if let Some(params) = &habit.hidden_parameters {
            score += contextual_score(params);
        }

        score.clamp(0.0, 1.0)
    }

    /// Score every non-archived habit. Returns (habit id, inferred score)
    /// pairs; writing them back is the caller's concern.
    pub fn score_all(&self) -> Vec<(HabitId, f64)> {
        self.score_all_at(Utc::now())
    }

    pub fn score_all_at(&self, as_of: DateTime<Utc>) -> Vec<(HabitId, f64)> {
        let habits = match self.repository.fetch_habits(HabitFilter::active()) {
            Ok(habits) => habits,
            Err(error) => {
                warn!(%error, "habit fetch failed, skipping importance batch");
                return Vec::new();
            }
        };

        habits
            .iter()
            .map(|habit| (habit.id, self.infer_importance_at(habit, as_of)))
            .collect()
    }

    /// Recent execution frequency (up to 0.1) plus interval consistency
    /// (up to 0.05) over a 30-day window.
    fn execution_history_score(&self, habit_id: HabitId, as_of: DateTime<Utc>) -> f64 {
        let executions = match self
            .repository
            .fetch_executions(as_of - Duration::days(30)..as_of)
        {
            Ok(executions) => executions,
            Err(error) => {
                warn!(%error, "execution fetch failed, zeroing history term");
                return 0.0;
            }
        };

        let timestamps: Vec<DateTime<Utc>> = executions
            .iter()
            .filter(|e| e.habit_id == Some(habit_id))
            .map(|e| e.executed_at)
            .collect();
        if timestamps.is_empty() {
            return 0.0;
        }

        let execution_rate = timestamps.len() as f64 / 30.0;
        let frequency_score = (execution_rate * 0.1).min(0.1);
        let consistency_score = interval_consistency(&timestamps) * 0.05;

        frequency_score + consistency_score
    }

    /// Membership in the chain graph: being a trigger (up to 0.06) or a
    /// target (up to 0.04) of chains makes a habit structurally important.
    fn chain_position_score(&self, habit_id: HabitId) -> f64 {
        let chains = match self.repository.fetch_chains(ChainFilter::default()) {
            Ok(chains) => chains,
            Err(error) => {
                warn!(%error, "chain fetch failed, zeroing chain position term");
                return 0.0;
            }
        };

        let trigger_count = chains
            .iter()
            .filter(|c| c.trigger_habits.contains(&habit_id))
            .count();
        let target_count = chains.iter().filter(|c| c.next_habit_id == habit_id).count();

        let trigger_score = (trigger_count as f64 * 0.02).min(0.06);
        let target_score = (target_count as f64 * 0.02).min(0.04);

        trigger_score + target_score
    }

    /// Morning-routine ratio (up to 0.03) and weekend continuity (up to
    /// 0.02) over a 14-day window; needs at least 3 executions to count.
    fn temporal_pattern_score(&self, habit_id: HabitId, as_of: DateTime<Utc>) -> f64 {
        let executions = match self
            .repository
            .fetch_executions(as_of - Duration::days(14)..as_of)
        {
            Ok(executions) => executions,
            Err(error) => {
                warn!(%error, "execution fetch failed, zeroing temporal term");
                return 0.0;
            }
        };

        let timestamps: Vec<DateTime<Utc>> = executions
            .iter()
            .filter(|e| e.habit_id == Some(habit_id))
            .map(|e| e.executed_at)
            .collect();
        if timestamps.len() < 3 {
            return 0.0;
        }

        let total = timestamps.len() as f64;
        let morning = timestamps
            .iter()
            .filter(|t| (6..=10).contains(&t.hour()))
            .count() as f64;
        let weekend = timestamps
            .iter()
            .filter(|t| matches!(t.weekday(), Weekday::Sat | Weekday::Sun))
            .count() as f64;

        (morning / total) * 0.03 + (weekend / total) * 0.02
    }
}

/// Signals the user stated up front: rigidity, intolerance of failure,
/// emotional weight, outside pressure, and existing momentum.
fn hidden_parameters_score(params: &HiddenParameters) -> f64 {
    let mut score = 0.0;

    if let Some(rigidity) = params.rigidity_level {
        score += rigidity * 0.15;
    }
    // Low tolerance for failure means the habit matters more
    if let Some(tolerance) = params.tolerance_for_failure {
        score += (1.0 - tolerance) * 0.1;
    }
    if let Some(emotional) = params.emotional_significance {
        score += emotional * 0.1;
    }
    if let Some(pressure) = params.external_pressure {
        score += pressure * 0.1;
    }
    if let Some(momentum) = params.existing_momentum {
        score += momentum * 0.05;
    }

    score
}

/// Environment-dependent adjustments applied after the main terms.
fn contextual_score(params: &HiddenParameters) -> f64 {
    let mut score = 0.0;

    // Seasonal habits are less stable, so slightly less important
    if params.seasonal_variation == Some(true) {
        score -= 0.02;
    }
    if let Some(expectation) = params.realistic_expectation {
        score += expectation * 0.03;
    }
    if let Some(triggers) = &params.contextual_triggers {
        if !triggers.is_empty() {
            score += (triggers.len() as f64 * 0.01).min(0.03);
        }
    }

    score
}

/// 1.0 for perfectly regular intervals, approaching 0.0 as the standard
/// deviation of the inter-execution gap grows past a day.
fn interval_consistency(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }

    let intervals: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_minutes() as f64 / 60.0)
        .collect();
    if intervals.len() < 2 {
        return 0.5;
    }

    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let variance = intervals
        .iter()
        .map(|interval| (interval - mean).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let std_dev = variance.sqrt();

    1.0 - (std_dev / 24.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::HabitExecution;
    use crate::repository::{InMemoryRepository, UnavailableRepository};
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_bare_habit_with_empty_repo_scores_base() {
        let scorer = ImportanceScorer::new(InMemoryRepository::new());
        let habit = Habit::new("journal");
        assert!((scorer.infer_importance_at(&habit, as_of()) - BASE_SCORE).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_parameters_raise_the_score() {
        let scorer = ImportanceScorer::new(InMemoryRepository::new());
        let mut habit = Habit::new("journal");
        habit.hidden_parameters = Some(HiddenParameters {
            rigidity_level: Some(1.0),
            tolerance_for_failure: Some(0.0),
            emotional_significance: Some(1.0),
            external_pressure: Some(1.0),
            existing_momentum: Some(1.0),
            ..Default::default()
        });

        // 0.5 + 0.15 + 0.1 + 0.1 + 0.1 + 0.05 = 1.0
        assert!((scorer.infer_importance_at(&habit, as_of()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped_to_unit_range() {
        let mut repo = InMemoryRepository::new();
        let mut habit = Habit::new("journal");
        habit.hidden_parameters = Some(HiddenParameters {
            rigidity_level: Some(1.0),
            tolerance_for_failure: Some(0.0),
            emotional_significance: Some(1.0),
            external_pressure: Some(1.0),
            existing_momentum: Some(1.0),
            realistic_expectation: Some(1.0),
            contextual_triggers: Some(vec!["desk".into(), "alarm".into()]),
            seasonal_variation: None,
        });
        // Daily executions on top of maxed parameters
        for day in 1..=10 {
            repo.insert_execution(HabitExecution::direct(
                habit.id,
                Utc.with_ymd_and_hms(2026, 1, day, 7, 0, 0).unwrap(),
            ));
        }
        repo.insert_habit(habit.clone());

        let scorer = ImportanceScorer::new(repo);
        let score = scorer.infer_importance_at(&habit, as_of());
        assert!(score <= 1.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_chain_membership_contributes() {
        use crate::chain::{HabitChain, TriggerCondition};

        let habit = Habit::new("wake up");
        let next = Habit::new("wash face");
        let mut repo = InMemoryRepository::new();
        repo.insert_habit(habit.clone());
        repo.insert_habit(next.clone());
        repo.insert_chain(HabitChain::new(
            vec![habit.id],
            next.id,
            TriggerCondition::Immediate,
        ));

        let scorer = ImportanceScorer::new(repo);
        let score = scorer.infer_importance_at(&habit, as_of());
        // base + one trigger membership
        assert!((score - (BASE_SCORE + 0.02)).abs() < 1e-9);
    }

    #[test]
    fn test_regular_executions_add_history_term() {
        let habit = Habit::new("journal");
        let mut repo = InMemoryRepository::new();
        repo.insert_habit(habit.clone());
        // 15 perfectly regular daily executions at 20:00
        for day in 1..=15 {
            repo.insert_execution(HabitExecution::direct(
                habit.id,
                Utc.with_ymd_and_hms(2026, 1, day, 20, 0, 0).unwrap(),
            ));
        }

        let scorer = ImportanceScorer::new(repo);
        let score = scorer.infer_importance_at(&habit, as_of());
        // rate 15/30 -> 0.05 frequency, perfect consistency -> 0.05
        assert!(score > BASE_SCORE + 0.09);
    }

    #[test]
    fn test_repository_failure_degrades_to_base_score() {
        let scorer = ImportanceScorer::new(UnavailableRepository);
        let habit = Habit::new("journal");
        assert!((scorer.infer_importance_at(&habit, as_of()) - BASE_SCORE).abs() < 1e-9);
        assert!(scorer.score_all().is_empty());
    }

    #[test]
    fn test_interval_consistency_bounds() {
        let base = as_of();
        let regular: Vec<DateTime<Utc>> =
            (0..5).map(|i| base + Duration::days(i)).collect();
        assert!((interval_consistency(&regular) - 1.0).abs() < 1e-9);

        let erratic = vec![
            base,
            base + Duration::hours(1),
            base + Duration::days(6),
            base + Duration::days(6) + Duration::hours(2),
        ];
        let score = interval_consistency(&erratic);
        assert!((0.0..=1.0).contains(&score));
    }
}
