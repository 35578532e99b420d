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

//! Upgrade runner.
//!
//! The stored version is read once. Every step writes into one
//! [`StagedState`]; only when the whole chain succeeded are the staged writes
//! and the new version committed in a single sled transaction. A failing step
//! drops the overlay, so neither its writes nor those of earlier steps in the
//! same run become visible, and the stored version stays where it was.

use crate::core::{
    state::{persistent_state::PersistentState, staged::StagedState},
    upgrade::{
        registry::{MigrationError, MigrationRegistry},
        version_table::{read_version, version_op},
    },
};
use tracing::{error, info};

/// Result of a successful upgrade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeOutcome {
    /// Module name.
    pub module: String,
    /// Version found in the store (`None` => fresh module).
    pub from: Option<u64>,
    /// Version now stored.
    pub to: u64,
    /// Steps executed.
    pub steps_applied: u64,
}

/// Move `module` to `target`.
///
/// A module without a stored version is recorded at `target` directly: there is
/// no earlier state to migrate.
pub fn run_upgrade(
    state: &PersistentState,
    registry: &MigrationRegistry,
    module: &str,
    target: u64,
) -> Result<UpgradeOutcome, MigrationError> {
    let stored = read_version(state, module)?;

    let Some(from) = stored else {
        state.commit_atomic(vec![version_op(module, target)])?;
        info!(module, version = target, "no stored version, module initialised");
        return Ok(UpgradeOutcome {
            module: module.to_string(),
            from: None,
            to: target,
            steps_applied: 0,
        });
    };

    if from == target {
        return Ok(UpgradeOutcome {
            module: module.to_string(),
            from: Some(from),
            to: target,
            steps_applied: 0,
        });
    }

    let mut staged = StagedState::new(state);
    let steps_applied = match registry.run(module, from, target, &mut staged) {
        Ok(n) => n,
        Err(e) => {
            error!(module, stored = from, target, error = %e, "migration run aborted, version not advanced");
            return Err(e);
        }
    };

    let mut ops = staged.into_ops();
    ops.push(version_op(module, target));
    state.commit_atomic(ops)?;
    info!(module, from, to = target, steps = steps_applied, "module upgraded");

    Ok(UpgradeOutcome {
        module: module.to_string(),
        from: Some(from),
        to: target,
        steps_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::upgrade::registry::{MigrationRegistryBuilder, StepError};

    #[test]
    fn fresh_module_is_recorded_without_steps() {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        let reg = MigrationRegistryBuilder::new().build();

        let out = run_upgrade(&st, &reg, "auth", 5).unwrap();
        assert_eq!(out.from, None);
        assert_eq!(out.steps_applied, 0);
        assert_eq!(read_version(&st, "auth").unwrap(), Some(5));
    }

    #[test]
    fn failed_step_discards_earlier_writes() {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        st.commit_atomic(vec![version_op("acct", 1)]).unwrap();

        let mut b = MigrationRegistryBuilder::new();
        b.register("acct", 1, |s| {
            s.put(b"acct/touched".to_vec(), vec![1]);
            Ok(())
        })
        .unwrap();
        b.register("acct", 2, |_| Err(StepError::Invalid("boom".into())))
            .unwrap();
        let reg = b.build();

        assert!(run_upgrade(&st, &reg, "acct", 3).is_err());
        assert_eq!(st.get(b"acct/touched").unwrap(), None);
        assert_eq!(read_version(&st, "acct").unwrap(), Some(1));
    }
}
