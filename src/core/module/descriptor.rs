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

//! Capability descriptor. A module lists what it provides as optional trait
//! references; the flags are derived from which ones are present.

use crate::core::{
    ante::{AnteError, BlockEnv, ExecMode, GasInfo},
    auth::genesis::{GenesisError, GenesisStore},
    module::services::QueryService,
    types::Tx,
};
use serde::Serialize;

/// Capability flags reported to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleCapabilities {
    /// Genesis import/export.
    pub has_genesis: bool,
    /// Query services.
    pub has_services: bool,
    /// Randomized genesis for simulation.
    pub has_simulation: bool,
    /// Transaction validation entrypoint.
    pub has_tx_validation: bool,
}

/// Transaction validation entrypoint.
pub trait TxValidator: Send + Sync {
    /// Run the ante pipeline for `tx`.
    fn validate_tx(&self, env: &BlockEnv, tx: &Tx, mode: ExecMode) -> Result<GasInfo, AnteError>;
}

/// Simulation hook.
pub trait SimulationProvider: Send + Sync {
    /// Seeded random genesis blob with `accounts` accounts.
    fn random_genesis(&self, seed: u64, accounts: usize) -> Result<Vec<u8>, GenesisError>;
}

/// What a module exposes to the host.
#[derive(Clone, Copy)]
pub struct ModuleDescriptor<'a> {
    /// Module name.
    pub name: &'static str,
    /// Store layout version the binary expects.
    pub consensus_version: u64,
    /// Genesis collaborator.
    pub genesis: Option<&'a dyn GenesisStore>,
    /// Query services.
    pub services: Option<&'a dyn QueryService>,
    /// Simulation hook.
    pub simulation: Option<&'a dyn SimulationProvider>,
    /// Validation entrypoint.
    pub tx_validation: Option<&'a dyn TxValidator>,
}

impl ModuleDescriptor<'_> {
    /// Flags for the present capabilities.
    pub fn capabilities(&self) -> ModuleCapabilities {
        ModuleCapabilities {
            has_genesis: self.genesis.is_some(),
            has_services: self.services.is_some(),
            has_simulation: self.simulation.is_some(),
            has_tx_validation: self.tx_validation.is_some(),
        }
    }
}

/// JSON view of a descriptor served to operators.
#[derive(Clone, Debug, Serialize)]
pub struct DescriptorReport {
    /// Module name.
    pub name: &'static str,
    /// Expected store version.
    pub consensus_version: u64,
    /// Flags.
    pub capabilities: ModuleCapabilities,
    /// Ante stages in order.
    pub ante_stages: Vec<&'static str>,
    /// Query routes.
    pub query_routes: Vec<&'static str>,
}
