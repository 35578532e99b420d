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

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Transactions accepted by the ante pipeline.
    pub ante_accepted_total: IntCounter,
    /// Transactions rejected by the ante pipeline.
    pub ante_rejected_total: IntCounter,
    /// Rejections by stage name.
    pub ante_rejected_by_stage: IntCounterVec,
    /// Simulations run.
    pub ante_simulations_total: IntCounter,

    /// Migration steps applied, by module.
    pub migration_steps_total: IntCounterVec,
    /// Failed upgrade runs, by module.
    pub migration_failures_total: IntCounterVec,
    /// Stored consensus version, by module.
    pub module_version: IntGaugeVec,

    /// Consensus parameter sets assembled.
    pub consensus_params_assembled_total: IntCounter,
    /// Consensus parameter proposals rejected.
    pub consensus_params_rejected_total: IntCounter,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ante_accepted_total =
            IntCounter::new("modkit_ante_accepted_total", "Transactions accepted by ante")
                .map_err(|_| MetricsError::Prom)?;
        let ante_rejected_total =
            IntCounter::new("modkit_ante_rejected_total", "Transactions rejected by ante")
                .map_err(|_| MetricsError::Prom)?;
        let ante_rejected_by_stage = IntCounterVec::new(
            Opts::new("modkit_ante_rejected_by_stage_total", "Ante rejections by stage"),
            &["stage"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let ante_simulations_total =
            IntCounter::new("modkit_ante_simulations_total", "Simulated transactions")
                .map_err(|_| MetricsError::Prom)?;

        let migration_steps_total = IntCounterVec::new(
            Opts::new("modkit_migration_steps_total", "Migration steps applied"),
            &["module"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let migration_failures_total = IntCounterVec::new(
            Opts::new("modkit_migration_failures_total", "Failed upgrade runs"),
            &["module"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let module_version = IntGaugeVec::new(
            Opts::new("modkit_module_version", "Stored module consensus version"),
            &["module"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let consensus_params_assembled_total = IntCounter::new(
            "modkit_consensus_params_assembled_total",
            "Consensus parameter sets assembled",
        )
        .map_err(|_| MetricsError::Prom)?;
        let consensus_params_rejected_total = IntCounter::new(
            "modkit_consensus_params_rejected_total",
            "Consensus parameter proposals rejected",
        )
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(ante_accepted_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(ante_rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(ante_rejected_by_stage.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(ante_simulations_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(migration_steps_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(migration_failures_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(module_version.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(consensus_params_assembled_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(consensus_params_rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            ante_accepted_total,
            ante_rejected_total,
            ante_rejected_by_stage,
            ante_simulations_total,
            migration_steps_total,
            migration_failures_total,
            module_version,
            consensus_params_assembled_total,
            consensus_params_rejected_total,
        })
    }

    /// Gather everything in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Prom)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Prom)
    }
}
