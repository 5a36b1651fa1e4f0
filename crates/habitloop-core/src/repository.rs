//! Repository abstraction over habit data.
//!
//! Engines never own storage; they are constructed with a repository and
//! issue read-only fetches against it. The in-memory implementation backs
//! tests and seed loading. Referential integrity (removing a habit removes
//! its executions) is the repository's job, not the engines'.

use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::chain::HabitChain;
use crate::error::{RepositoryError, Result};
use crate::execution::HabitExecution;
use crate::habit::{Habit, HabitId};

/// Filter for habit fetches
#[derive(Debug, Clone, Copy, Default)]
pub struct HabitFilter {
    /// Exclude archived habits
    pub active_only: bool,
}

impl HabitFilter {
    /// Only non-archived habits
    pub fn active() -> Self {
        Self { active_only: true }
    }
}

/// Filter for chain fetches
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainFilter {
    /// Exclude inactive chains
    pub active_only: bool,
}

impl ChainFilter {
    /// Only active chains
    pub fn active() -> Self {
        Self { active_only: true }
    }
}

/// Read-only access to habit, chain, and execution records.
///
/// Implementations must return habits ordered by name and executions
/// ordered ascending by timestamp; engines rely on both orderings.
pub trait HabitRepository {
    fn fetch_habits(&self, filter: HabitFilter) -> Result<Vec<Habit>>;

    fn fetch_chains(&self, filter: ChainFilter) -> Result<Vec<HabitChain>>;

    /// Executions whose timestamp falls in the half-open `range`
    fn fetch_executions(&self, range: Range<DateTime<Utc>>) -> Result<Vec<HabitExecution>>;
}

impl<R: HabitRepository + ?Sized> HabitRepository for &R {
    fn fetch_habits(&self, filter: HabitFilter) -> Result<Vec<Habit>> {
        (**self).fetch_habits(filter)
    }

    fn fetch_chains(&self, filter: ChainFilter) -> Result<Vec<HabitChain>> {
        (**self).fetch_chains(filter)
    }

    fn fetch_executions(&self, range: Range<DateTime<Utc>>) -> Result<Vec<HabitExecution>> {
        (**self).fetch_executions(range)
    }
}

/// In-memory repository for tests, seeding, and small deployments
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    habits: Vec<Habit>,
    chains: Vec<HabitChain>,
    executions: Vec<HabitExecution>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_habit(&mut self, habit: Habit) {
        self.habits.push(habit);
    }

    pub fn insert_chain(&mut self, chain: HabitChain) {
        self.chains.push(chain);
    }

    pub fn insert_execution(&mut self, execution: HabitExecution) {
        self.executions.push(execution);
    }

    /// Remove a habit and every execution that references it.
    ///
    /// Returns true if the habit existed. Chains pointing at the removed
    /// habit are left in place; engines treat them as void.
    pub fn remove_habit(&mut self, habit_id: HabitId) -> bool {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != habit_id);
        if self.habits.len() == before {
            return false;
        }
        self.executions.retain(|e| e.habit_id != Some(habit_id));
        true
    }

    pub fn habit_count(&self) -> usize {
        self.habits.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }
}

impl HabitRepository for InMemoryRepository {
    fn fetch_habits(&self, filter: HabitFilter) -> Result<Vec<Habit>> {
        let mut habits: Vec<Habit> = self
            .habits
            .iter()
            .filter(|h| !filter.active_only || !h.is_archived)
            .cloned()
            .collect();
        habits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(habits)
    }

    fn fetch_chains(&self, filter: ChainFilter) -> Result<Vec<HabitChain>> {
        Ok(self
            .chains
            .iter()
            .filter(|c| !filter.active_only || c.is_active)
            .cloned()
            .collect())
    }

    fn fetch_executions(&self, range: Range<DateTime<Utc>>) -> Result<Vec<HabitExecution>> {
        let mut executions: Vec<HabitExecution> = self
            .executions
            .iter()
            .filter(|e| range.contains(&e.executed_at))
            .cloned()
            .collect();
        executions.sort_by_key(|e| e.executed_at);
        Ok(executions)
    }
}

/// Repository double whose every fetch fails; proves degrade-to-empty paths
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRepository;

impl HabitRepository for UnavailableRepository {
    fn fetch_habits(&self, _filter: HabitFilter) -> Result<Vec<Habit>> {
        Err(RepositoryError::Unavailable("test double".into()))
    }

    fn fetch_chains(&self, _filter: ChainFilter) -> Result<Vec<HabitChain>> {
        Err(RepositoryError::Unavailable("test double".into()))
    }

    fn fetch_executions(&self, _range: Range<DateTime<Utc>>) -> Result<Vec<HabitExecution>> {
        Err(RepositoryError::Unavailable("test double".into()))
    }
}
