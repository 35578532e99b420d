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

//! Auth module parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter validation error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    /// A parameter that must be positive is zero.
    #[error("{0} must be positive")]
    Zero(&'static str),
}

/// Limits and gas costs read by the ante stages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Maximum memo length in characters.
    pub max_memo_characters: u64,
    /// Maximum signatures per transaction (multisig members count individually).
    pub tx_sig_limit: u64,
    /// Gas per transaction byte.
    pub tx_size_cost_per_byte: u64,
    /// Gas per ed25519 verification.
    pub sig_verify_cost_ed25519: u64,
    /// Gas per secp256k1 verification.
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_ed25519: 590,
            sig_verify_cost_secp256k1: 1000,
        }
    }
}

impl Params {
    /// Every field must be positive.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let fields = [
            ("max_memo_characters", self.max_memo_characters),
            ("tx_sig_limit", self.tx_sig_limit),
            ("tx_size_cost_per_byte", self.tx_size_cost_per_byte),
            ("sig_verify_cost_ed25519", self.sig_verify_cost_ed25519),
            ("sig_verify_cost_secp256k1", self.sig_verify_cost_secp256k1),
        ];
        for (name, v) in fields {
            if v == 0 {
                return Err(ParamsError::Zero(name));
            }
        }
        Ok(())
    }
}
