// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Version migration registry.
//!
//! Steps are keyed by `(module, from)` and always move a module from `from` to
//! `from + 1`. A jump from 1 to 5 is only expressible as the four consecutive
//! steps 1→2, 2→3, 3→4, 4→5. Registration goes through
//! [`MigrationRegistryBuilder`] during startup; [`MigrationRegistry`] itself is
//! immutable and safe to share for reads.

use crate::core::{
    state::{persistent_state::StateError, staged::StagedState},
    types::CodecError,
};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Error returned by a migration step body.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("state: {0}")]
    State(#[from] StateError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    #[error("{0}")]
    Invalid(String),
}

/// Migration step body. Writes go to the staged overlay only.
pub type MigrationFn = Box<dyn Fn(&mut StagedState<'_>) -> Result<(), StepError> + Send + Sync>;

/// Startup-time registration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A step for this `(module, from)` already exists.
    #[error("migration for {module} from version {from} already registered")]
    DuplicateKey { module: String, from: u64 },
}

/// Upgrade-time errors. All of them are fatal to the host.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// No step registered for a version on the path to the target.
    #[error("no migration registered for {module} from version {from}")]
    MissingStep { module: String, from: u64 },
    /// A step body failed; nothing from the run was persisted.
    #[error("migration of {module} from version {from} failed: {source}")]
    Step {
        module: String,
        from: u64,
        #[source]
        source: StepError,
    },
    /// Stored version is ahead of the binary.
    #[error("{module} stored version {stored} is newer than target {target}")]
    Downgrade { module: String, stored: u64, target: u64 },
    /// Versioning table entry could not be decoded.
    #[error("corrupt version entry for {module}")]
    CorruptVersion { module: String },
    #[error("state: {0}")]
    State(#[from] StateError),
}

type StepKey = (String, u64);

/// Mutable registry, only alive during startup wiring.
#[derive(Default)]
pub struct MigrationRegistryBuilder {
    steps: BTreeMap<StepKey, MigrationFn>,
}

impl MigrationRegistryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step moving `module` from `from` to `from + 1`.
    ///
    /// A second registration under the same key fails and leaves the first
    /// function in place.
    pub fn register<F>(&mut self, module: &str, from: u64, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut StagedState<'_>) -> Result<(), StepError> + Send + Sync + 'static,
    {
        let key = (module.to_string(), from);
        if self.steps.contains_key(&key) {
            return Err(RegistryError::DuplicateKey {
                module: module.to_string(),
                from,
            });
        }
        self.steps.insert(key, Box::new(f));
        Ok(())
    }

    /// Seal into a read-only registry.
    pub fn build(self) -> MigrationRegistry {
        MigrationRegistry { steps: self.steps }
    }
}

/// Read-only migration table.
pub struct MigrationRegistry {
    steps: BTreeMap<StepKey, MigrationFn>,
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MigrationRegistry {
    /// Total registered steps across modules.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether a step from `from` exists for `module`.
    pub fn has_step(&self, module: &str, from: u64) -> bool {
        self.steps.contains_key(&(module.to_string(), from))
    }

    /// Source versions registered for `module`, ascending.
    pub fn source_versions(&self, module: &str) -> Vec<u64> {
        self.steps
            .keys()
            .filter(|(m, _)| m == module)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Apply every step from `current` up to `target` against `staged`, in order.
    /// Returns the number of steps applied. On error the overlay must be discarded.
    pub fn run(
        &self,
        module: &str,
        current: u64,
        target: u64,
        staged: &mut StagedState<'_>,
    ) -> Result<u64, MigrationError> {
        if current > target {
            return Err(MigrationError::Downgrade {
                module: module.to_string(),
                stored: current,
                target,
            });
        }

        let mut version = current;
        while version < target {
            let step = self
                .steps
                .get(&(module.to_string(), version))
                .ok_or_else(|| MigrationError::MissingStep {
                    module: module.to_string(),
                    from: version,
                })?;
            step(staged).map_err(|source| MigrationError::Step {
                module: module.to_string(),
                from: version,
                source,
            })?;
            info!(module, from = version, to = version + 1, "migration step applied");
            version += 1;
        }
        Ok(target - current)
    }
}
