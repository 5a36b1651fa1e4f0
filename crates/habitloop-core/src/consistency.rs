//! Chain consistency checking.
//!
//! Given the habits a user reported as executed, this module picks the most
//! relevant chain, compares actual execution against the chain's expected
//! sequence, detects same-day ordering violations, and blends the results
//! into a normalized inconsistency level with remediation suggestions.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::{ChainId, HabitChain};
use crate::habit::HabitId;
use crate::repository::{ChainFilter, HabitFilter, HabitRepository};

/// Result of analyzing one chain's execution on a given day.
///
/// Ephemeral: derived per call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConsistencyReport {
    pub chain_id: ChainId,

    /// Display name built from the first and last habit of the sequence
    pub chain_name: String,

    /// Trigger habits in chain order, followed by the next habit
    pub expected_sequence: Vec<HabitId>,

    pub executed_habits: Vec<HabitId>,

    /// Expected but not executed, in expected-sequence order
    pub skipped_habits: Vec<HabitId>,

    /// Executed but not part of the expected sequence
    pub unexpected_habits: Vec<HabitId>,

    pub execution_order: ExecutionOrderAnalysis,

    /// Normalized inconsistency score (0.0 = perfect, 1.0 = fully off)
    pub inconsistency_level: f64,

    /// Human-readable remediation suggestions
    pub suggestions: Vec<String>,
}

/// Same-day temporal analysis of the executed habits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOrderAnalysis {
    /// True when no ordering violations were found
    pub correct_order: bool,

    pub violations: Vec<OrderViolation>,

    /// Last same-day execution timestamp per habit (last-wins on duplicates)
    pub execution_times: HashMap<HabitId, DateTime<Utc>>,
}

/// A pair of habits executed against their expected order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderViolation {
    pub expected_first: HabitId,
    pub expected_second: HabitId,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The expected-later habit was executed before the expected-earlier one
    Reversed,
    /// Both habits share one timestamp (not currently emitted by analysis)
    Simultaneous,
}

/// Checks executed habits against the most relevant chain.
///
/// Stateless apart from the injected repository; safe to call concurrently.
/// All entry points are total: repository failures degrade to empty data
/// and are logged, never propagated.
pub struct ConsistencyChecker<R> {
    repository: R,
}

impl<R: HabitRepository> ConsistencyChecker<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Check consistency against the most relevant chain as of now.
    ///
    /// Returns None when no chain touches the executed habits; that is a
    /// normal outcome, not an error.
    pub fn check_chain_consistency(
        &self,
        executed_habit_ids: &[HabitId],
    ) -> Option<ChainConsistencyReport> {
        self.check_chain_consistency_at(executed_habit_ids, Utc::now())
    }

    /// Check consistency for a specific day.
    pub fn check_chain_consistency_at(
        &self,
        executed_habit_ids: &[HabitId],
        as_of: DateTime<Utc>,
    ) -> Option<ChainConsistencyReport> {
        let executed = dedup_preserving_order(executed_habit_ids);
        let chain = self.select_primary_chain(&executed)?;

        debug!(chain_id = %chain.id, "analyzing chain consistency");
        Some(self.analyze(&chain, &executed, as_of))
    }

    /// Pick the chain with the largest overlap between its habits and the
    /// executed set. Ties go to the first chain in fetch order; that
    /// tie-break is a deliberate, pinned policy.
    pub fn select_primary_chain(&self, executed_habit_ids: &[HabitId]) -> Option<HabitChain> {
        let executed: HashSet<HabitId> = executed_habit_ids.iter().copied().collect();
        if executed.is_empty() {
            return None;
        }

        let mut best: Option<(HabitChain, usize)> = None;
        for chain in self.relevant_chains(&executed) {
            let score = chain
                .chain_habit_ids()
                .iter()
                .filter(|id| executed.contains(id))
                .count();
            // Strict comparison keeps the first chain on ties
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((chain, score));
            }
        }

        best.map(|(chain, _)| chain)
    }

    /// Active chains whose habits intersect the executed set and whose next
    /// habit actually resolves. Chains with a dangling next reference are
    /// void: excluded here and from propagation alike.
    fn relevant_chains(&self, executed: &HashSet<HabitId>) -> Vec<HabitChain> {
        let chains = match self.repository.fetch_chains(ChainFilter::active()) {
            Ok(chains) => chains,
            Err(error) => {
                warn!(%error, "chain fetch failed, degrading to empty chain list");
                return Vec::new();
            }
        };
        let known_habits: HashSet<HabitId> = match self.repository.fetch_habits(HabitFilter::active())
        {
            Ok(habits) => habits.into_iter().map(|h| h.id).collect(),
            Err(error) => {
                warn!(%error, "habit fetch failed, degrading to empty chain list");
                return Vec::new();
            }
        };

        chains
            .into_iter()
            .filter(|chain| known_habits.contains(&chain.next_habit_id))
            .filter(|chain| {
                chain
                    .chain_habit_ids()
                    .iter()
                    .any(|id| executed.contains(id))
            })
            .collect()
    }

    fn analyze(
        &self,
        chain: &HabitChain,
        executed: &[HabitId],
        as_of: DateTime<Utc>,
    ) -> ChainConsistencyReport {
        // Triggers are causally prior to the next habit, so the expected
        // sequence is triggers followed by next.
        let mut expected_sequence = chain.trigger_habits.clone();
        expected_sequence.push(chain.next_habit_id);

        let executed_set: HashSet<HabitId> = executed.iter().copied().collect();
        let expected_set: HashSet<HabitId> = expected_sequence.iter().copied().collect();

        let skipped_habits: Vec<HabitId> = expected_sequence
            .iter()
            .filter(|id| !executed_set.contains(id))
            .copied()
            .collect();
        let unexpected_habits: Vec<HabitId> = executed
            .iter()
            .filter(|id| !expected_set.contains(id))
            .copied()
            .collect();

        let execution_order = self.analyze_execution_order(&expected_sequence, &executed_set, as_of);

        let inconsistency_level = inconsistency_level(
            expected_sequence.len(),
            skipped_habits.len(),
            unexpected_habits.len(),
            execution_order.violations.len(),
        );

        let habit_names = self.habit_names();
        let chain_name = chain_display_name(&expected_sequence, &habit_names);
        let suggestions = build_suggestions(chain, &skipped_habits, &habit_names);

        debug!(
            chain_id = %chain.id,
            inconsistency_level,
            skipped = skipped_habits.len(),
            unexpected = unexpected_habits.len(),
            "chain analysis complete"
        );

        ChainConsistencyReport {
            chain_id: chain.id,
            chain_name,
            expected_sequence,
            executed_habits: executed.to_vec(),
            skipped_habits,
            unexpected_habits,
            execution_order,
            inconsistency_level,
            suggestions,
        }
    }

    /// Build the same-day execution-time map and scan for reversed pairs.
    ///
    /// The map keeps the last occurrence per habit when a habit was executed
    /// more than once that day; the scan is O(n^2) over the executed-and-
    /// expected subset, which stays tiny for realistic chains.
    fn analyze_execution_order(
        &self,
        expected_sequence: &[HabitId],
        executed_set: &HashSet<HabitId>,
        as_of: DateTime<Utc>,
    ) -> ExecutionOrderAnalysis {
        let start_of_day = as_of.date_naive().and_time(NaiveTime::MIN).and_utc();
        let end_of_day = start_of_day + Duration::days(1);

        let executions = match self.repository.fetch_executions(start_of_day..end_of_day) {
            Ok(executions) => executions,
            Err(error) => {
                warn!(%error, "execution fetch failed, skipping order analysis");
                return ExecutionOrderAnalysis {
                    correct_order: true,
                    violations: Vec::new(),
                    execution_times: HashMap::new(),
                };
            }
        };

        // Ascending input + overwriting insert = last-wins per habit
        let mut execution_times: HashMap<HabitId, DateTime<Utc>> = HashMap::new();
        for execution in &executions {
            if let Some(habit_id) = execution.habit_id {
                execution_times.insert(habit_id, execution.executed_at);
            }
        }

        let present: Vec<HabitId> = expected_sequence
            .iter()
            .filter(|id| executed_set.contains(id))
            .copied()
            .collect();

        let mut violations = Vec::new();
        for i in 0..present.len() {
            for j in (i + 1)..present.len() {
                let (first, second) = (present[i], present[j]);
                let (Some(&time_first), Some(&time_second)) =
                    (execution_times.get(&first), execution_times.get(&second))
                else {
                    continue;
                };
                if time_first > time_second {
                    violations.push(OrderViolation {
                        expected_first: first,
                        expected_second: second,
                        kind: ViolationKind::Reversed,
                    });
                }
            }
        }

        ExecutionOrderAnalysis {
            correct_order: violations.is_empty(),
            violations,
            execution_times,
        }
    }

    /// Name lookup across all habits, archived included, so reports can
    /// still label history that references archived habits.
    fn habit_names(&self) -> HashMap<HabitId, String> {
        match self.repository.fetch_habits(HabitFilter::default()) {
            Ok(habits) => habits.into_iter().map(|h| (h.id, h.name)).collect(),
            Err(error) => {
                warn!(%error, "habit fetch failed, degrading to unnamed report");
                HashMap::new()
            }
        }
    }
}

/// Blend skipped, unexpected, and ordering penalties into `[0, 1]`.
///
/// An empty expected sequence cannot occur for a well-formed chain but is
/// handled as zero rather than dividing by zero.
fn inconsistency_level(
    expected_count: usize,
    skipped_count: usize,
    unexpected_count: usize,
    violation_count: usize,
) -> f64 {
    if expected_count == 0 {
        return 0.0;
    }
    let expected = expected_count as f64;
    let skipped_penalty = skipped_count as f64 / expected * 0.4;
    let unexpected_penalty = unexpected_count as f64 / expected * 0.3;
    let order_penalty = violation_count as f64 / expected * 0.3;

    (skipped_penalty + unexpected_penalty + order_penalty).min(1.0)
}

fn chain_display_name(
    expected_sequence: &[HabitId],
    habit_names: &HashMap<HabitId, String>,
) -> String {
    let first = expected_sequence.first().and_then(|id| habit_names.get(id));
    let last = expected_sequence.last().and_then(|id| habit_names.get(id));
    match (first, last) {
        (Some(first), Some(last)) => format!("{first} -> {last}"),
        _ => "habit chain".to_string(),
    }
}

fn build_suggestions(
    chain: &HabitChain,
    skipped_habits: &[HabitId],
    habit_names: &HashMap<HabitId, String>,
) -> Vec<String> {
    if skipped_habits.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();

    let skipped_names: Vec<&String> = skipped_habits
        .iter()
        .filter_map(|id| habit_names.get(id))
        .collect();

    match skipped_names.len() {
        0 => suggestions.push("Some habits in this chain are still incomplete".to_string()),
        1 => suggestions.push(format!("Don't forget \"{}\"!", skipped_names[0])),
        2 | 3 => {
            let joined = skipped_names
                .iter()
                .map(|name| format!("\"{name}\""))
                .collect::<Vec<_>>()
                .join(" and ");
            suggestions.push(format!("Don't forget {joined}!"));
        }
        count => suggestions.push(format!("{count} habits are still waiting to be done")),
    }

    let skipped_set: HashSet<HabitId> = skipped_habits.iter().copied().collect();
    let triggers_executed = chain
        .trigger_habits
        .iter()
        .all(|id| !skipped_set.contains(id));
    let next_skipped = skipped_set.contains(&chain.next_habit_id);

    if triggers_executed && next_skipped {
        if let Some(next_name) = habit_names.get(&chain.next_habit_id) {
            suggestions.push(format!("Now is a good time to do \"{next_name}\""));
        }
    } else if !triggers_executed {
        suggestions.push("Let's complete the rest of the chain".to_string());
    }

    suggestions
}

fn dedup_preserving_order(ids: &[HabitId]) -> Vec<HabitId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(**id)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TriggerCondition;
    use crate::execution::HabitExecution;
    use crate::habit::Habit;
    use crate::repository::{InMemoryRepository, UnavailableRepository};
    use chrono::TimeZone;

    fn day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, hour, minute, 0).unwrap()
    }

    /// wake up -> wash face chain plus a wash face -> coffee chain
    fn morning_repo() -> (InMemoryRepository, Habit, Habit, Habit) {
        let wake = Habit::new("wake up");
        let wash = Habit::new("wash face");
        let coffee = Habit::new("morning coffee");

        let mut repo = InMemoryRepository::new();
        repo.insert_habit(wake.clone());
        repo.insert_habit(wash.clone());
        repo.insert_habit(coffee.clone());
        repo.insert_chain(HabitChain::new(
            vec![wake.id],
            wash.id,
            TriggerCondition::Immediate,
        ));
        repo.insert_chain(HabitChain::new(
            vec![wash.id],
            coffee.id,
            TriggerCondition::Immediate,
        ));
        (repo, wake, wash, coffee)
    }

    #[test]
    fn test_no_relevant_chain_is_a_normal_none() {
        let (repo, ..) = morning_repo();
        let checker = ConsistencyChecker::new(repo);
        assert!(checker
            .check_chain_consistency_at(&[uuid::Uuid::new_v4()], day())
            .is_none());
        assert!(checker.check_chain_consistency_at(&[], day()).is_none());
    }

    #[test]
    fn test_single_trigger_executed_yields_skipped_next() {
        let (repo, wake, wash, _) = morning_repo();
        let checker = ConsistencyChecker::new(repo);

        let report = checker
            .check_chain_consistency_at(&[wake.id], day())
            .unwrap();

        assert_eq!(report.expected_sequence, vec![wake.id, wash.id]);
        assert_eq!(report.skipped_habits, vec![wash.id]);
        assert!(report.unexpected_habits.is_empty());
        // 0.4 * (1 skipped / 2 expected)
        assert!((report.inconsistency_level - 0.2).abs() < 1e-9);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("wash face")));
        // All triggers done, next skipped: "good time" hint
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("good time")));
    }

    #[test]
    fn test_perfect_execution_scores_zero_with_no_suggestions() {
        let (mut repo, wake, wash, _) = morning_repo();
        repo.insert_execution(HabitExecution::direct(wake.id, at(7, 0)));
        repo.insert_execution(HabitExecution::direct(wash.id, at(7, 10)));

        let checker = ConsistencyChecker::new(repo);
        let report = checker
            .check_chain_consistency_at(&[wake.id, wash.id], day())
            .unwrap();

        assert_eq!(report.inconsistency_level, 0.0);
        assert!(report.suggestions.is_empty());
        assert!(report.execution_order.correct_order);
        assert_eq!(report.chain_name, "wake up -> wash face");
    }

    #[test]
    fn test_reversed_execution_records_order_violation() {
        let (mut repo, wake, wash, _) = morning_repo();
        // wash face before wake up: reversed
        repo.insert_execution(HabitExecution::direct(wash.id, at(8, 0)));
        repo.insert_execution(HabitExecution::direct(wake.id, at(8, 5)));

        let checker = ConsistencyChecker::new(repo);
        let report = checker
            .check_chain_consistency_at(&[wake.id, wash.id], day())
            .unwrap();

        assert_eq!(report.execution_order.violations.len(), 1);
        let violation = report.execution_order.violations[0];
        assert_eq!(violation.expected_first, wake.id);
        assert_eq!(violation.expected_second, wash.id);
        assert_eq!(violation.kind, ViolationKind::Reversed);
        // order penalty only: 0.3 * (1 / 2)
        assert!((report.inconsistency_level - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_same_day_executions_keep_last_timestamp() {
        let (mut repo, wake, wash, _) = morning_repo();
        repo.insert_execution(HabitExecution::direct(wake.id, at(6, 0)));
        // Re-executed later the same day; the later timestamp wins
        repo.insert_execution(HabitExecution::direct(wake.id, at(9, 0)));
        repo.insert_execution(HabitExecution::direct(wash.id, at(7, 0)));

        let checker = ConsistencyChecker::new(repo);
        let report = checker
            .check_chain_consistency_at(&[wake.id, wash.id], day())
            .unwrap();

        assert_eq!(report.execution_order.execution_times[&wake.id], at(9, 0));
        // Last-wins makes wake(9:00) > wash(7:00): one reversed violation
        assert_eq!(report.execution_order.violations.len(), 1);
    }

    #[test]
    fn test_unexpected_habit_adds_penalty() {
        let (repo, wake, _, _) = morning_repo();
        let stray = uuid::Uuid::new_v4();

        let checker = ConsistencyChecker::new(repo);
        let report = checker
            .check_chain_consistency_at(&[wake.id, stray], day())
            .unwrap();

        assert_eq!(report.unexpected_habits, vec![stray]);
        // 0.4 * 1/2 skipped + 0.3 * 1/2 unexpected
        assert!((report.inconsistency_level - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_primary_chain_prefers_larger_overlap() {
        let (repo, _wake, wash, coffee) = morning_repo();
        let checker = ConsistencyChecker::new(repo);

        // wash + coffee touch the wash -> coffee chain twice, wake -> wash once
        let chain = checker
            .select_primary_chain(&[wash.id, coffee.id])
            .unwrap();
        assert_eq!(chain.next_habit_id, coffee.id);
    }

    #[test]
    fn test_primary_chain_tie_breaks_to_first_in_fetch_order() {
        let shared = Habit::new("wake up");
        let first_next = Habit::new("wash face");
        let second_next = Habit::new("stretch");

        let mut repo = InMemoryRepository::new();
        repo.insert_habit(shared.clone());
        repo.insert_habit(first_next.clone());
        repo.insert_habit(second_next.clone());
        let first = HabitChain::new(vec![shared.id], first_next.id, TriggerCondition::Immediate);
        let first_id = first.id;
        repo.insert_chain(first);
        repo.insert_chain(HabitChain::new(
            vec![shared.id],
            second_next.id,
            TriggerCondition::Immediate,
        ));

        let checker = ConsistencyChecker::new(repo);
        let chain = checker.select_primary_chain(&[shared.id]).unwrap();
        assert_eq!(chain.id, first_id);
    }

    #[test]
    fn test_dangling_next_habit_excludes_chain_from_selection() {
        let wake = Habit::new("wake up");
        let mut repo = InMemoryRepository::new();
        repo.insert_habit(wake.clone());
        repo.insert_chain(HabitChain::new(
            vec![wake.id],
            uuid::Uuid::new_v4(),
            TriggerCondition::Immediate,
        ));

        let checker = ConsistencyChecker::new(repo);
        assert!(checker.select_primary_chain(&[wake.id]).is_none());
        assert!(checker
            .check_chain_consistency_at(&[wake.id], day())
            .is_none());
    }

    #[test]
    fn test_repository_failure_degrades_to_none() {
        let checker = ConsistencyChecker::new(UnavailableRepository);
        assert!(checker
            .check_chain_consistency_at(&[uuid::Uuid::new_v4()], day())
            .is_none());
    }

    #[test]
    fn test_report_is_idempotent() {
        let (mut repo, wake, wash, _) = morning_repo();
        repo.insert_execution(HabitExecution::direct(wash.id, at(8, 0)));
        repo.insert_execution(HabitExecution::direct(wake.id, at(8, 5)));

        let checker = ConsistencyChecker::new(repo);
        let first = checker
            .check_chain_consistency_at(&[wake.id, wash.id], day())
            .unwrap();
        let second = checker
            .check_chain_consistency_at(&[wake.id, wash.id], day())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_many_skipped_habits_collapse_to_a_count() {
        let habits: Vec<Habit> = (0..5)
            .map(|i| Habit::new(format!("habit {i}")))
            .collect();
        let mut repo = InMemoryRepository::new();
        for habit in &habits {
            repo.insert_habit(habit.clone());
        }
        let triggers: Vec<HabitId> = habits[..4].iter().map(|h| h.id).collect();
        let mut chain = HabitChain::new(triggers, habits[4].id, TriggerCondition::AllRequired);
        chain.confidence = Some(0.9);
        repo.insert_chain(chain);

        let checker = ConsistencyChecker::new(repo);
        let report = checker
            .check_chain_consistency_at(&[habits[0].id], day())
            .unwrap();

        assert_eq!(report.skipped_habits.len(), 4);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("4 habits")));
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("complete the rest")));
    }

    #[test]
    fn test_inconsistency_level_zero_for_empty_expected() {
        assert_eq!(inconsistency_level(0, 3, 3, 3), 0.0);
    }

    #[test]
    fn test_inconsistency_level_caps_at_one() {
        assert_eq!(inconsistency_level(1, 5, 5, 5), 1.0);
    }

    proptest::proptest! {
        #[test]
        fn prop_inconsistency_level_stays_in_unit_range(
            expected in 0usize..50,
            skipped in 0usize..50,
            unexpected in 0usize..50,
            violations in 0usize..500,
        ) {
            let level = inconsistency_level(expected, skipped, unexpected, violations);
            proptest::prop_assert!((0.0..=1.0).contains(&level));
        }
    }
}
