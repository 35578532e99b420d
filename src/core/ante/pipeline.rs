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

//! Stage contract and pipeline.
//!
//! Every stage takes the context by value and hands back the updated one, or
//! an error that ends the run. The pipeline is built once and its order never
//! changes afterwards.

use crate::core::{
    ante::context::AnteContext,
    auth::keeper::KeeperError,
    types::{Address, CodecError, Tx},
};
use thiserror::Error;
use tracing::debug;

/// Rejection reasons raised by stages.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("tx could not be decoded: {0}")]
    TxDecode(CodecError),
    #[error("gas limit {gas} exceeds maximum {max}")]
    InvalidGasLimit { gas: u64, max: u64 },
    #[error("out of gas in {descriptor}: limit {limit}, consumed {consumed}")]
    OutOfGas {
        descriptor: &'static str,
        limit: u64,
        consumed: u64,
    },
    #[error("gas overflow in {descriptor}")]
    GasOverflow { descriptor: &'static str },
    #[error("tx must contain at least one message")]
    NoMessages,
    #[error("message {index} has no signers")]
    MessageWithoutSigners { index: usize },
    #[error("no signatures supplied")]
    NoSignatures,
    #[error("wrong number of signatures: expected {expected}, got {got}")]
    WrongSignatureCount { expected: usize, got: usize },
    #[error("wrong number of signer infos: expected {expected}, got {got}")]
    WrongSignerInfoCount { expected: usize, got: usize },
    #[error("missing signature for {0}")]
    MissingSignature(Address),
    #[error("tx timeout height {timeout} is below current height {height}")]
    TxTimeoutHeight { timeout: u64, height: u64 },
    #[error("memo too large: max {max} characters, got {got}")]
    MemoTooLarge { max: u64, got: u64 },
    #[error("unknown address {0}")]
    UnknownAddress(Address),
    #[error("invalid pubkey: {0}")]
    InvalidPubKey(String),
    #[error("signatures: {got}, limit: {limit}")]
    TooManySignatures { limit: u64, got: u64 },
    #[error("account sequence mismatch for {address}: expected {expected}, got {got}")]
    WrongSequence {
        address: Address,
        expected: u64,
        got: u64,
    },
    #[error("signature verification failed for {0}")]
    Unauthorized(Address),
    #[error("keeper: {0}")]
    Keeper(#[from] KeeperError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

/// A stage rejection annotated with the stage that raised it.
#[derive(Debug, Error)]
#[error("ante stage {stage}: {source}")]
pub struct AnteError {
    /// Name of the rejecting stage.
    pub stage: &'static str,
    /// Underlying reason.
    #[source]
    pub source: StageError,
}

/// One unit of the pipeline.
pub trait AnteStage: Send + Sync {
    /// Stable identity used in diagnostics and metrics.
    fn name(&self) -> &'static str;

    /// Run the stage. `simulate` is passed through unchanged from the caller.
    fn handle(&self, ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError>;
}

/// Immutable ordered stage list.
pub struct AntePipeline {
    stages: Vec<Box<dyn AnteStage>>,
}

impl AntePipeline {
    /// Compose stages in the given order.
    pub fn new(stages: Vec<Box<dyn AnteStage>>) -> Self {
        Self { stages }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True for a pipeline without stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, stopping at the first rejection.
    pub fn execute(
        &self,
        ctx: AnteContext,
        tx: &Tx,
        simulate: bool,
    ) -> Result<AnteContext, AnteError> {
        let mut ctx = ctx;
        for stage in &self.stages {
            ctx = stage.handle(ctx, tx, simulate).map_err(|source| {
                debug!(stage = stage.name(), error = %source, simulate, "ante stage rejected tx");
                AnteError {
                    stage: stage.name(),
                    source,
                }
            })?;
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ante::context::{BlockEnv, ExecMode};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct Counting {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl AnteStage for Counting {
        fn name(&self) -> &'static str {
            self.name
        }
        fn handle(&self, ctx: AnteContext, _tx: &Tx, _simulate: bool) -> Result<AnteContext, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StageError::NoMessages);
            }
            Ok(ctx)
        }
    }

    #[test]
    fn first_failure_stops_the_run_and_names_the_stage() {
        let counters: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let names = ["one", "two", "three"];
        let stages: Vec<Box<dyn AnteStage>> = (0..3)
            .map(|i| {
                Box::new(Counting {
                    name: names[i],
                    calls: counters[i].clone(),
                    fail: i == 1,
                }) as Box<dyn AnteStage>
            })
            .collect();
        let p = AntePipeline::new(stages);
        assert_eq!(p.stage_names(), vec!["one", "two", "three"]);

        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("test", 1), 0);
        let err = p.execute(ctx, &Tx::default(), false).unwrap_err();
        assert_eq!(err.stage, "two");
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].load(Ordering::SeqCst), 1);
        assert_eq!(counters[2].load(Ordering::SeqCst), 0);
    }
}
