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

//! Auth module coordinator.
//!
//! Wires the migration registry, the ante pipeline and the consensus parameter
//! assembler to the host. Everything is assembled by [`AuthModuleBuilder`] at
//! startup; afterwards the coordinator is read-only and can be shared across
//! threads.

use crate::core::{
    ante::{
        sigverify::SigVerify, stages::standard_stages, AnteContext, AnteError, AntePipeline,
        BlockEnv, ExecMode, GasInfo, StageError,
    },
    auth::{
        genesis::{GenesisError, GenesisStore},
        keeper::{KeeperError, StoreAccountKeeper},
        migrations::register_migrations,
        simulation, CONSENSUS_VERSION, MODULE_NAME,
    },
    consensus::{
        assemble, AssemblyError, ConsensusMsgParams, ConsensusParams, StaticVersionSource,
        VersionSource,
    },
    module::{
        descriptor::{
            DescriptorReport, ModuleCapabilities, ModuleDescriptor, SimulationProvider,
            TxValidator,
        },
        services::QueryService,
    },
    security::verifier::SignatureVerifier,
    state::persistent_state::PersistentState,
    types::Tx,
    upgrade::{
        registry::{MigrationError, MigrationRegistry, MigrationRegistryBuilder, RegistryError},
        runner::{run_upgrade, UpgradeOutcome},
        version_table::{read_version, version_op},
    },
};
use crate::monitoring::metrics::Metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Default decode cap for raw transactions.
pub const DEFAULT_MAX_TX_BYTES: usize = 1024 * 1024;

/// Pseudo stage reported when raw bytes do not decode.
pub const DECODE_STAGE: &str = "decode";

/// Coordinator errors.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("migration registration: {0}")]
    Registry(#[from] RegistryError),
    #[error("migration: {0}")]
    Migration(#[from] MigrationError),
    #[error("genesis: {0}")]
    Genesis(#[from] GenesisError),
    #[error("consensus params: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("keeper: {0}")]
    Keeper(#[from] KeeperError),
}

/// Startup wiring for [`AuthModule`].
pub struct AuthModuleBuilder {
    state: PersistentState,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    versions: Arc<dyn VersionSource>,
    metrics: Option<Arc<Metrics>>,
    max_tx_bytes: usize,
    registry: MigrationRegistryBuilder,
}

impl AuthModuleBuilder {
    /// Builder over an open store.
    pub fn new(state: PersistentState) -> Self {
        Self {
            state,
            verifier: None,
            versions: Arc::new(StaticVersionSource::default()),
            metrics: None,
            max_tx_bytes: DEFAULT_MAX_TX_BYTES,
            registry: MigrationRegistryBuilder::new(),
        }
    }

    /// Append the signature verification stage.
    pub fn signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Source of the base version group for consensus params.
    pub fn version_source(mut self, versions: Arc<dyn VersionSource>) -> Self {
        self.versions = versions;
        self
    }

    /// Record metrics.
    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decode cap for [`AuthModule::validate_raw`].
    pub fn max_tx_bytes(mut self, max: usize) -> Self {
        self.max_tx_bytes = max;
        self
    }

    /// Shared registry builder, for hosts that register other modules' steps
    /// alongside this one.
    pub fn registry_mut(&mut self) -> &mut MigrationRegistryBuilder {
        &mut self.registry
    }

    /// Register migrations and compose the pipeline.
    pub fn build(mut self) -> Result<AuthModule, ModuleError> {
        register_migrations(&mut self.registry)?;
        let registry = self.registry.build();

        let keeper = Arc::new(StoreAccountKeeper::new(self.state.clone()));
        let mut stages = standard_stages(keeper.clone());
        if let Some(v) = self.verifier {
            stages.push(Box::new(SigVerify::new(keeper.clone(), v)));
        }
        let pipeline = AntePipeline::new(stages);
        info!(
            module = MODULE_NAME,
            stages = ?pipeline.stage_names(),
            migrations = registry.len(),
            "module wired"
        );

        Ok(AuthModule {
            state: self.state,
            keeper,
            registry,
            pipeline,
            versions: self.versions,
            metrics: self.metrics,
            max_tx_bytes: self.max_tx_bytes,
        })
    }
}

/// The auth module as seen by the host.
pub struct AuthModule {
    state: PersistentState,
    keeper: Arc<StoreAccountKeeper>,
    registry: MigrationRegistry,
    pipeline: AntePipeline,
    versions: Arc<dyn VersionSource>,
    metrics: Option<Arc<Metrics>>,
    max_tx_bytes: usize,
}

impl AuthModule {
    /// Start wiring a module over `state`.
    pub fn builder(state: PersistentState) -> AuthModuleBuilder {
        AuthModuleBuilder::new(state)
    }

    /// Module name.
    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    /// Account keeper.
    pub fn keeper(&self) -> &StoreAccountKeeper {
        &self.keeper
    }

    /// Migration table.
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Ante stage names in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Stored version of this module.
    pub fn stored_version(&self) -> Result<Option<u64>, ModuleError> {
        Ok(read_version(&self.state, MODULE_NAME)?)
    }

    /// Bring the store to the binary's consensus version.
    pub fn run_upgrade(&self) -> Result<UpgradeOutcome, ModuleError> {
        match run_upgrade(&self.state, &self.registry, MODULE_NAME, CONSENSUS_VERSION) {
            Ok(out) => {
                if let Some(m) = &self.metrics {
                    m.migration_steps_total
                        .with_label_values(&[MODULE_NAME])
                        .inc_by(out.steps_applied);
                    m.module_version
                        .with_label_values(&[MODULE_NAME])
                        .set(i64::try_from(out.to).unwrap_or(i64::MAX));
                }
                Ok(out)
            }
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.migration_failures_total.with_label_values(&[MODULE_NAME]).inc();
                }
                Err(e.into())
            }
        }
    }

    fn run_pipeline(
        &self,
        env: &BlockEnv,
        tx: &Tx,
        tx_size: usize,
        mode: ExecMode,
    ) -> Result<AnteContext, AnteError> {
        let ctx = AnteContext::new(mode, env.clone(), tx_size);
        let res = self.pipeline.execute(ctx, tx, mode.is_simulate());
        if let Some(m) = &self.metrics {
            match &res {
                Ok(_) if mode.is_simulate() => m.ante_simulations_total.inc(),
                Ok(_) => m.ante_accepted_total.inc(),
                Err(e) => {
                    m.ante_rejected_total.inc();
                    m.ante_rejected_by_stage.with_label_values(&[e.stage]).inc();
                }
            }
        }
        res
    }

    /// Validate an already decoded transaction.
    pub fn validate_tx(&self, env: &BlockEnv, tx: &Tx, mode: ExecMode) -> Result<GasInfo, AnteError> {
        let size = tx
            .to_bytes()
            .map_err(|e| self.decode_error(StageError::TxDecode(e)))?
            .len();
        self.run_pipeline(env, tx, size, mode).map(|ctx| ctx.gas_info())
    }

    /// Decode raw bytes (bounded) and validate.
    pub fn validate_raw(&self, env: &BlockEnv, raw: &[u8], mode: ExecMode) -> Result<GasInfo, AnteError> {
        let tx = Tx::from_bytes_limited(raw, self.max_tx_bytes)
            .map_err(|e| self.decode_error(StageError::TxDecode(e)))?;
        self.run_pipeline(env, &tx, raw.len(), mode).map(|ctx| ctx.gas_info())
    }

    /// Gas estimate for `tx`; signatures may be absent.
    pub fn simulate(&self, env: &BlockEnv, tx: &Tx) -> Result<GasInfo, AnteError> {
        self.validate_tx(env, tx, ExecMode::Simulate)
    }

    fn decode_error(&self, source: StageError) -> AnteError {
        if let Some(m) = &self.metrics {
            m.ante_rejected_total.inc();
            m.ante_rejected_by_stage.with_label_values(&[DECODE_STAGE]).inc();
        }
        AnteError {
            stage: DECODE_STAGE,
            source,
        }
    }

    /// Default genesis blob.
    pub fn default_genesis(&self) -> Result<Vec<u8>, ModuleError> {
        Ok(self.keeper.default_genesis()?)
    }

    /// Check a genesis blob.
    pub fn validate_genesis(&self, raw: &[u8]) -> Result<(), ModuleError> {
        Ok(self.keeper.validate_genesis(raw)?)
    }

    /// Hand the blob to the store and record the module at its current version.
    pub fn import_genesis(&self, raw: &[u8]) -> Result<(), ModuleError> {
        let mut ops = self.keeper.genesis_ops(raw)?;
        let records = ops.len();
        if read_version(&self.state, MODULE_NAME)?.is_none() {
            ops.push(version_op(MODULE_NAME, CONSENSUS_VERSION));
        }
        self.state.commit_atomic(ops).map_err(KeeperError::from)?;
        info!(module = MODULE_NAME, records, version = CONSENSUS_VERSION, "genesis imported");
        if let Some(m) = &self.metrics {
            m.module_version
                .with_label_values(&[MODULE_NAME])
                .set(i64::try_from(CONSENSUS_VERSION).unwrap_or(i64::MAX));
        }
        Ok(())
    }

    /// Current store as a genesis blob.
    pub fn export_genesis(&self) -> Result<Vec<u8>, ModuleError> {
        Ok(self.keeper.export_genesis()?)
    }

    /// Assemble and range-check a consensus parameter proposal.
    pub fn assemble_consensus_params(
        &self,
        candidate: &ConsensusMsgParams,
    ) -> Result<ConsensusParams, ModuleError> {
        let res = assemble(candidate, self.versions.as_ref()).and_then(|cp| {
            cp.validate_basic()?;
            Ok(cp)
        });
        match res {
            Ok(cp) => {
                if let Some(m) = &self.metrics {
                    m.consensus_params_assembled_total.inc();
                }
                Ok(cp)
            }
            Err(e) => {
                warn!(error = %e, "consensus params rejected");
                if let Some(m) = &self.metrics {
                    m.consensus_params_rejected_total.inc();
                }
                Err(e.into())
            }
        }
    }

    /// Present capabilities.
    pub fn descriptor(&self) -> ModuleDescriptor<'_> {
        ModuleDescriptor {
            name: MODULE_NAME,
            consensus_version: CONSENSUS_VERSION,
            genesis: Some(self.keeper.as_ref() as &dyn GenesisStore),
            services: Some(self.keeper.as_ref() as &dyn QueryService),
            simulation: Some(self as &dyn SimulationProvider),
            tx_validation: Some(self as &dyn TxValidator),
        }
    }

    /// Capability flags.
    pub fn capabilities(&self) -> ModuleCapabilities {
        self.descriptor().capabilities()
    }

    /// JSON-friendly descriptor.
    pub fn report(&self) -> DescriptorReport {
        let d = self.descriptor();
        DescriptorReport {
            name: d.name,
            consensus_version: d.consensus_version,
            capabilities: d.capabilities(),
            ante_stages: self.stage_names(),
            query_routes: d.services.map(|s| s.routes().to_vec()).unwrap_or_default(),
        }
    }
}

impl TxValidator for AuthModule {
    fn validate_tx(&self, env: &BlockEnv, tx: &Tx, mode: ExecMode) -> Result<GasInfo, AnteError> {
        AuthModule::validate_tx(self, env, tx, mode)
    }
}

impl SimulationProvider for AuthModule {
    fn random_genesis(&self, seed: u64, accounts: usize) -> Result<Vec<u8>, GenesisError> {
        simulation::random_genesis(seed, accounts).to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        consensus::{BlockParams, EvidenceParams, ValidatorParams, VersionParams},
        security::verifier::DefaultVerifier,
    };

    fn module(dir: &tempfile::TempDir) -> AuthModule {
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        AuthModule::builder(st)
            .signature_verifier(Arc::new(DefaultVerifier::new()))
            .metrics(Arc::new(Metrics::new().unwrap()))
            .build()
            .unwrap()
    }

    #[test]
    fn pipeline_order_is_fixed_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let m = module(&dir);
        assert_eq!(
            m.stage_names(),
            vec![
                "setup_context",
                "validate_basic",
                "tx_timeout_height",
                "validate_memo",
                "consume_tx_size_gas",
                "set_pubkey",
                "validate_sig_count",
                "sig_verify",
            ]
        );
        assert_eq!(
            m.capabilities(),
            ModuleCapabilities {
                has_genesis: true,
                has_services: true,
                has_simulation: true,
                has_tx_validation: true,
            }
        );
    }

    #[test]
    fn garbage_bytes_are_rejected_at_decode() {
        let dir = tempfile::tempdir().unwrap();
        let m = module(&dir);
        let err = m
            .validate_raw(&BlockEnv::new("c", 1), &[0xff; 7], ExecMode::Check)
            .unwrap_err();
        assert_eq!(err.stage, DECODE_STAGE);
    }

    #[test]
    fn missing_evidence_group_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let m = module(&dir);
        let candidate = ConsensusMsgParams {
            block: Some(BlockParams { max_bytes: 1_000_000, max_gas: 10_000_000 }),
            evidence: None,
            validator: Some(ValidatorParams { pub_key_types: vec!["ed25519".into()] }),
            version: Some(VersionParams { app: 1 }),
            abci: None,
        };
        assert!(matches!(
            m.assemble_consensus_params(&candidate),
            Err(ModuleError::Assembly(AssemblyError::MissingComponent("evidence")))
        ));

        let ok = ConsensusMsgParams {
            evidence: Some(EvidenceParams {
                max_age_num_blocks: 10,
                max_age_duration_ms: 1_000,
                max_bytes: 100,
            }),
            ..candidate
        };
        let cp = m.assemble_consensus_params(&ok).unwrap();
        assert!(cp.feature.is_none());
    }

    #[test]
    fn fresh_store_upgrade_records_consensus_version() {
        let dir = tempfile::tempdir().unwrap();
        let m = module(&dir);
        let out = m.run_upgrade().unwrap();
        assert_eq!((out.from, out.to, out.steps_applied), (None, CONSENSUS_VERSION, 0));
        assert_eq!(m.stored_version().unwrap(), Some(CONSENSUS_VERSION));
    }

    #[test]
    fn refused_genesis_records_no_version() {
        let dir = tempfile::tempdir().unwrap();
        let m = module(&dir);
        assert!(matches!(m.import_genesis(b"{not json"), Err(ModuleError::Genesis(_))));
        assert_eq!(m.stored_version().unwrap(), None);

        let blob = m.default_genesis().unwrap();
        assert!(m.keeper().genesis_ops(&blob).is_ok());
        assert_eq!(m.stored_version().unwrap(), None);

        m.import_genesis(&blob).unwrap();
        assert_eq!(m.stored_version().unwrap(), Some(CONSENSUS_VERSION));
        assert!(m.keeper().state().get(crate::core::auth::keeper::PARAMS_KEY).unwrap().is_some());
        assert!(matches!(
            m.import_genesis(&blob),
            Err(ModuleError::Genesis(GenesisError::AlreadyInitialised))
        ));
    }
}
