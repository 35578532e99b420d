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

//! Execution context threaded through the ante pipeline. One context per
//! transaction; it is never shared and is dropped when the pipeline returns.

use crate::core::{
    ante::pipeline::StageError,
    consensus::params::ConsensusParams,
    types::{Address, PubKey},
};
use serde::Serialize;

/// Why the host is running the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// First admission into the mempool.
    Check,
    /// Re-admission after a block was committed.
    ReCheck,
    /// Cost estimation; commitment-only checks may be relaxed.
    Simulate,
    /// Block execution.
    Finalize,
}

impl ExecMode {
    /// The flag passed to every stage.
    pub fn is_simulate(self) -> bool {
        matches!(self, ExecMode::Simulate)
    }
}

/// Chain facts the host supplies for the block being built or checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEnv {
    /// Chain id, bound into sign bytes.
    pub chain_id: String,
    /// Current block height.
    pub height: u64,
    /// Consensus block max gas (-1 or 0 => unlimited).
    pub max_block_gas: i64,
}

impl BlockEnv {
    /// Environment without a block gas cap.
    pub fn new(chain_id: impl Into<String>, height: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            max_block_gas: -1,
        }
    }

    /// Take the block gas cap from assembled consensus params.
    pub fn with_consensus_params(mut self, cp: &ConsensusParams) -> Self {
        self.max_block_gas = cp.block.max_gas;
        self
    }
}

/// Gas meter. `limit == None` is the infinite meter used for simulation and genesis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GasMeter {
    limit: Option<u64>,
    consumed: u64,
}

impl GasMeter {
    /// Meter that never runs out.
    pub fn infinite() -> Self {
        Self { limit: None, consumed: 0 }
    }

    /// Meter capped at `limit`.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            consumed: 0,
        }
    }

    /// Charge `amount`. The charge is recorded even when it exceeds the limit.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), StageError> {
        let next = self
            .consumed
            .checked_add(amount)
            .ok_or(StageError::GasOverflow { descriptor })?;
        self.consumed = next;
        match self.limit {
            Some(limit) if next > limit => Err(StageError::OutOfGas {
                descriptor,
                limit,
                consumed: next,
            }),
            _ => Ok(()),
        }
    }

    /// Gas consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Limit, `None` if infinite.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}

/// Signer data resolved by the public-key stage and read by later stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerMeta {
    /// Signer address.
    pub address: Address,
    /// Resolved key.
    pub pub_key: PubKey,
    /// Account number on record.
    pub account_number: u64,
    /// Account sequence on record.
    pub sequence: u64,
    /// True when `pub_key` is the simulation placeholder.
    pub placeholder_key: bool,
}

/// Gas summary returned to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GasInfo {
    /// Gas limit declared by the transaction.
    pub gas_wanted: u64,
    /// Gas consumed by the pipeline.
    pub gas_used: u64,
}

/// Per-transaction state threaded through the stages.
#[derive(Clone, Debug)]
pub struct AnteContext {
    /// Execution mode.
    pub mode: ExecMode,
    /// Block environment.
    pub env: BlockEnv,
    /// Encoded transaction size in bytes.
    pub tx_size: usize,
    /// Gas meter (replaced by the setup stage).
    pub gas_meter: GasMeter,
    /// Declared gas limit.
    pub gas_wanted: u64,
    /// Signers resolved so far.
    pub signers: Vec<SignerMeta>,
}

impl AnteContext {
    /// Fresh context for one transaction.
    pub fn new(mode: ExecMode, env: BlockEnv, tx_size: usize) -> Self {
        Self {
            mode,
            env,
            tx_size,
            gas_meter: GasMeter::infinite(),
            gas_wanted: 0,
            signers: Vec::new(),
        }
    }

    /// Gas summary.
    pub fn gas_info(&self) -> GasInfo {
        GasInfo {
            gas_wanted: self.gas_wanted,
            gas_used: self.gas_meter.consumed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_meter_reports_out_of_gas() {
        let mut m = GasMeter::with_limit(100);
        m.consume(60, "a").unwrap();
        let err = m.consume(50, "b").unwrap_err();
        assert!(matches!(
            err,
            StageError::OutOfGas { descriptor: "b", limit: 100, consumed: 110 }
        ));
    }

    #[test]
    fn infinite_meter_only_fails_on_overflow() {
        let mut m = GasMeter::infinite();
        m.consume(u64::MAX - 1, "a").unwrap();
        assert!(matches!(m.consume(2, "b"), Err(StageError::GasOverflow { .. })));
    }
}
