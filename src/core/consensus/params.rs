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

//! Consensus parameter assembly.
//!
//! A governance proposal carries [`ConsensusMsgParams`], whose groups are all
//! optional on the wire. [`assemble`] turns it into a complete
//! [`ConsensusParams`] or fails without producing anything. The version group
//! is required to be present, but the base version comes from a
//! [`VersionSource`] (the upgrade tracker); only `app` is taken from the
//! proposal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validator key types the consensus engine knows about.
pub const KNOWN_PUB_KEY_TYPES: &[&str] = &["ed25519", "secp256k1"];

/// Assembly and validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    /// A required group is absent.
    #[error("all parameters must be present: missing {0}")]
    MissingComponent(&'static str),
    /// A group is present but out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Block limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    /// Max block size in bytes (-1 => engine maximum).
    pub max_bytes: i64,
    /// Max gas per block (-1 => unlimited).
    pub max_gas: i64,
}

/// Evidence limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    /// Max age of evidence in blocks.
    pub max_age_num_blocks: i64,
    /// Max age of evidence in milliseconds.
    pub max_age_duration_ms: u64,
    /// Max total evidence bytes per block.
    pub max_bytes: i64,
}

/// Validator key-type allow-list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    /// Allowed key types.
    pub pub_key_types: Vec<String>,
}

/// Version info.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionParams {
    /// Application protocol version.
    pub app: u64,
}

/// ABCI options carried by a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciParams {
    /// Height from which vote extensions are enabled (0 => disabled).
    pub vote_extensions_enable_height: i64,
}

/// Optional feature flags of an assembled set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureParams {
    /// Vote extension enable height.
    pub vote_extensions_enable_height: Option<i64>,
}

/// Proposed parameters as submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMsgParams {
    /// Block group.
    pub block: Option<BlockParams>,
    /// Evidence group.
    pub evidence: Option<EvidenceParams>,
    /// Validator group.
    pub validator: Option<ValidatorParams>,
    /// Version placeholder.
    pub version: Option<VersionParams>,
    /// Feature flags.
    pub abci: Option<AbciParams>,
}

/// Complete, immutable consensus parameter set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Block group.
    pub block: BlockParams,
    /// Evidence group.
    pub evidence: EvidenceParams,
    /// Validator group.
    pub validator: ValidatorParams,
    /// Version group.
    pub version: VersionParams,
    /// Feature flags, unset unless proposed.
    pub feature: Option<FeatureParams>,
}

/// Source of the authoritative version group.
pub trait VersionSource: Send + Sync {
    /// Base version params.
    fn version_params(&self) -> VersionParams;
}

/// Version source returning a fixed value.
#[derive(Clone, Debug, Default)]
pub struct StaticVersionSource(pub VersionParams);

impl VersionSource for StaticVersionSource {
    fn version_params(&self) -> VersionParams {
        self.0.clone()
    }
}

/// Combine a proposal into a full parameter set, all or nothing.
pub fn assemble(
    candidate: &ConsensusMsgParams,
    versions: &dyn VersionSource,
) -> Result<ConsensusParams, AssemblyError> {
    let block = candidate
        .block
        .as_ref()
        .ok_or(AssemblyError::MissingComponent("block"))?;
    let evidence = candidate
        .evidence
        .as_ref()
        .ok_or(AssemblyError::MissingComponent("evidence"))?;
    let validator = candidate
        .validator
        .as_ref()
        .ok_or(AssemblyError::MissingComponent("validator"))?;
    let proposed_version = candidate
        .version
        .as_ref()
        .ok_or(AssemblyError::MissingComponent("version"))?;

    let mut version = versions.version_params();
    version.app = proposed_version.app;

    let feature = candidate.abci.as_ref().map(|a| FeatureParams {
        vote_extensions_enable_height: Some(a.vote_extensions_enable_height),
    });

    Ok(ConsensusParams {
        block: block.clone(),
        evidence: evidence.clone(),
        validator: validator.clone(),
        version,
        feature,
    })
}

impl ConsensusParams {
    /// Range checks applied before a set is adopted.
    pub fn validate_basic(&self) -> Result<(), AssemblyError> {
        let invalid = |field: &'static str, reason: String| AssemblyError::Invalid { field, reason };

        if self.block.max_bytes == 0 || self.block.max_bytes < -1 {
            return Err(invalid(
                "block.max_bytes",
                format!("must be positive or -1, got {}", self.block.max_bytes),
            ));
        }
        if self.block.max_gas < -1 {
            return Err(invalid(
                "block.max_gas",
                format!("must be >= -1, got {}", self.block.max_gas),
            ));
        }
        if self.evidence.max_age_num_blocks <= 0 {
            return Err(invalid(
                "evidence.max_age_num_blocks",
                format!("must be positive, got {}", self.evidence.max_age_num_blocks),
            ));
        }
        if self.evidence.max_age_duration_ms == 0 {
            return Err(invalid("evidence.max_age_duration_ms", "must be positive".into()));
        }
        if self.evidence.max_bytes < 0 {
            return Err(invalid(
                "evidence.max_bytes",
                format!("must be non-negative, got {}", self.evidence.max_bytes),
            ));
        }
        if self.block.max_bytes > 0 && self.evidence.max_bytes > self.block.max_bytes {
            return Err(invalid(
                "evidence.max_bytes",
                format!(
                    "{} exceeds block.max_bytes {}",
                    self.evidence.max_bytes, self.block.max_bytes
                ),
            ));
        }
        if self.validator.pub_key_types.is_empty() {
            return Err(invalid("validator.pub_key_types", "must not be empty".into()));
        }
        if let Some(unknown) = self
            .validator
            .pub_key_types
            .iter()
            .find(|t| !KNOWN_PUB_KEY_TYPES.contains(&t.as_str()))
        {
            return Err(invalid(
                "validator.pub_key_types",
                format!("unknown key type {unknown}"),
            ));
        }
        if let Some(FeatureParams {
            vote_extensions_enable_height: Some(h),
        }) = &self.feature
        {
            if *h < 0 {
                return Err(invalid(
                    "feature.vote_extensions_enable_height",
                    format!("must be non-negative, got {h}"),
                ));
            }
        }
        Ok(())
    }
}
