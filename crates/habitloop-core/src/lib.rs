//! # Habitloop Core Library
//!
//! Core business logic for Habitloop, a habit assistant that accepts
//! free-text reports of daily activity and reasons about causal and
//! temporal relationships between habits ("habit chains"). The engines in
//! this crate are invoked in-process by a chat/orchestration layer that
//! owns persistence, AI-based extraction of executed habit ids, and
//! presentation.
//!
//! ## Architecture
//!
//! - **Consistency checking**: selects the chain most relevant to a set of
//!   executed habits, compares actual execution against the expected
//!   trigger-then-next sequence, and scores the deviation
//! - **Trigger propagation**: walks the chain graph forward from executed
//!   habits to suggested follow-up habits, with AND-gating for
//!   all-required chains and prerequisite annotations
//! - **Message composition**: deterministic keyword-driven phrasing for
//!   suggestions
//! - **Importance inference**: weighted linear scorer estimating how much
//!   a habit matters to the user
//!
//! Engines hold no mutable state and degrade repository failures to empty
//! results; every entry point is total.
//!
//! ## Key Components
//!
//! - [`ConsistencyChecker`]: chain selection and consistency analysis
//! - [`TriggerEngine`]: forward trigger propagation
//! - [`MessageComposer`]: suggestion text generation
//! - [`ImportanceScorer`]: importance inference
//! - [`HabitRepository`]: read-only data access trait

pub mod chain;
pub mod consistency;
pub mod error;
pub mod execution;
pub mod habit;
pub mod importance;
pub mod message;
pub mod repository;
pub mod seed;
pub mod trigger;

pub use chain::{ChainId, HabitChain, PrerequisiteHabit, TriggerCondition};
pub use consistency::{
    ChainConsistencyReport, ConsistencyChecker, ExecutionOrderAnalysis, OrderViolation,
    ViolationKind,
};
pub use error::{RepositoryError, SeedError};
pub use execution::{ExecutionType, HabitExecution};
pub use habit::{Habit, HabitId, HiddenParameters, ImportanceCategory, TargetFrequency};
pub use importance::ImportanceScorer;
pub use message::MessageComposer;
pub use repository::{
    ChainFilter, HabitFilter, HabitRepository, InMemoryRepository, UnavailableRepository,
};
pub use seed::{SeedFile, SEED_SCHEMA_VERSION};
pub use trigger::{TriggerEngine, TriggerMessageInfo, TriggerSuggestion};
