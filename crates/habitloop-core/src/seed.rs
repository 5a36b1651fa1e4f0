//! Seed data loading.
//!
//! Habit, chain, and execution records enter the engine through a versioned
//! JSON document deserialized into an in-memory repository. Serialization
//! lives only here, at the repository boundary; engine types never touch
//! raw JSON themselves.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chain::HabitChain;
use crate::error::SeedError;
use crate::execution::HabitExecution;
use crate::habit::Habit;
use crate::repository::InMemoryRepository;

/// Current seed schema version
pub const SEED_SCHEMA_VERSION: u32 = 1;

/// On-disk seed document.
///
/// Dangling references between records are allowed; the engines tolerate
/// them at analysis time, so the loader does not reject them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFile {
    pub version: u32,

    #[serde(default)]
    pub habits: Vec<Habit>,

    #[serde(default)]
    pub chains: Vec<HabitChain>,

    #[serde(default)]
    pub executions: Vec<HabitExecution>,
}

impl SeedFile {
    /// Parse a seed document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let seed: SeedFile = serde_json::from_str(json)?;
        if seed.version != SEED_SCHEMA_VERSION {
            return Err(SeedError::UnsupportedVersion {
                found: seed.version,
                expected: SEED_SCHEMA_VERSION,
            });
        }
        Ok(seed)
    }

    /// Read and parse a seed document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Move the seeded records into a fresh in-memory repository.
    pub fn into_repository(self) -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        for habit in self.habits {
            repo.insert_habit(habit);
        }
        for chain in self.chains {
            repo.insert_chain(chain);
        }
        for execution in self.executions {
            repo.insert_execution(execution);
        }
        repo
    }
}
