//! Chain trigger propagation.
//!
//! Walks the chain graph forward from executed habits to the follow-up
//! habits they activate. Multi-trigger chains with an all-required condition
//! fire only when every trigger habit was executed; every other condition
//! fires on any single match. Branching is supported: one executed habit may
//! fire several chains.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::{HabitChain, PrerequisiteHabit, TriggerCondition};
use crate::habit::{Habit, HabitId};
use crate::message::MessageComposer;
use crate::repository::{ChainFilter, HabitFilter, HabitRepository};

/// One suggested follow-up habit, with the metadata of the chain that
/// produced it and the composed message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSuggestion {
    pub habit_id: HabitId,
    pub habit_name: String,

    /// Confidence of the producing chain (missing value defaults to 0)
    pub confidence: f64,

    pub delay_minutes: u32,

    pub prerequisites: Vec<PrerequisiteHabit>,

    pub message: String,
}

/// All suggestions produced by one propagation call.
///
/// `suggested_habit_ids` is deduplicated by target habit in first-seen
/// order; `messages` aligns with `suggestions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerMessageInfo {
    pub messages: Vec<String>,
    pub suggested_habit_ids: Vec<HabitId>,
    pub suggestions: Vec<TriggerSuggestion>,
}

impl TriggerMessageInfo {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Propagates executed habits forward through the chain graph.
///
/// Stateless apart from the injected repository; total on all inputs.
/// Repository failures degrade to an empty result and are logged.
pub struct TriggerEngine<R> {
    repository: R,
    composer: MessageComposer,
}

impl<R: HabitRepository> TriggerEngine<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            composer: MessageComposer::new(),
        }
    }

    /// Suggest follow-up habits for a set of executed habits.
    pub fn generate_trigger_suggestions(&self, executed_habit_ids: &[HabitId]) -> TriggerMessageInfo {
        let executed: HashSet<HabitId> = executed_habit_ids.iter().copied().collect();
        if executed.is_empty() {
            return TriggerMessageInfo::default();
        }

        let (habits, chains) = match self.fetch_graph() {
            Some(graph) => graph,
            None => return TriggerMessageInfo::default(),
        };

        let mut info = TriggerMessageInfo::default();
        let mut seen_targets: HashSet<HabitId> = HashSet::new();

        for chain in &chains {
            if !chain_fires(chain, &executed) {
                continue;
            }

            // Dangling next reference: the chain is void, skip silently
            let Some(next_habit) = habits.iter().find(|h| h.id == chain.next_habit_id) else {
                debug!(chain_id = %chain.id, "skipping chain with unresolved next habit");
                continue;
            };

            // First chain targeting a habit wins; later ones are duplicates
            if !seen_targets.insert(next_habit.id) {
                continue;
            }

            let message = self.composer.compose(next_habit, chain);
            info.messages.push(message.clone());
            info.suggested_habit_ids.push(next_habit.id);
            info.suggestions.push(TriggerSuggestion {
                habit_id: next_habit.id,
                habit_name: next_habit.name.clone(),
                confidence: chain.confidence_or_default(),
                delay_minutes: chain.delay_minutes,
                prerequisites: chain.prerequisite_habits.clone(),
                message,
            });
        }

        info
    }

    /// Reminder messages for chains triggered by one habit whose delay
    /// window applies. The time gate is currently always met; actual
    /// delay scheduling belongs to the notification layer.
    pub fn check_time_based_triggers(&self, habit_id: HabitId) -> Vec<String> {
        let (habits, chains) = match self.fetch_graph() {
            Some(graph) => graph,
            None => return Vec::new(),
        };

        chains
            .iter()
            .filter(|chain| chain.trigger_habits.contains(&habit_id))
            .filter_map(|chain| {
                habits
                    .iter()
                    .find(|h| h.id == chain.next_habit_id)
                    .map(|next| self.composer.compose_reminder(next, chain))
            })
            .collect()
    }

    /// Active chains plus the non-archived habits they can resolve against.
    fn fetch_graph(&self) -> Option<(Vec<Habit>, Vec<HabitChain>)> {
        let habits = match self.repository.fetch_habits(HabitFilter::active()) {
            Ok(habits) => habits,
            Err(error) => {
                warn!(%error, "habit fetch failed, degrading to empty trigger result");
                return None;
            }
        };
        let chains = match self.repository.fetch_chains(ChainFilter::active()) {
            Ok(chains) => chains,
            Err(error) => {
                warn!(%error, "chain fetch failed, degrading to empty trigger result");
                return None;
            }
        };
        Some((habits, chains))
    }
}

/// AND-gating for all-required chains, any-match for everything else.
fn chain_fires(chain: &HabitChain, executed: &HashSet<HabitId>) -> bool {
    match chain.trigger_condition {
        TriggerCondition::AllRequired => {
            !chain.trigger_habits.is_empty()
                && chain.trigger_habits.iter().all(|id| executed.contains(id))
        }
        TriggerCondition::Immediate
        | TriggerCondition::TimeAfter { .. }
        | TriggerCondition::Contextual => {
            chain.trigger_habits.iter().any(|id| executed.contains(id))
        }
    }
}
