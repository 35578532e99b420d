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

//! Account keeper.
//!
//! Store layout (consensus version 5):
//! - `auth/account/<20 address bytes>` -> canonical [`Account`]
//! - `auth/params` -> canonical [`Params`]
//! - `auth/seq/account_number` -> big-endian u64, next free account number

use crate::core::{
    auth::params::Params,
    state::persistent_state::{KvOp, PersistentState, StateError},
    types::{decode_canonical, encode_canonical, Address, CodecError, PubKey},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account records, keyed by raw address bytes.
pub const ACCOUNT_PREFIX: &[u8] = b"auth/account/";
/// Module params.
pub const PARAMS_KEY: &[u8] = b"auth/params";
/// Next account number.
pub const ACCOUNT_NUMBER_KEY: &[u8] = b"auth/seq/account_number";

/// Store key for an account.
pub fn account_key(addr: &Address) -> Vec<u8> {
    let mut k = Vec::with_capacity(ACCOUNT_PREFIX.len() + Address::LEN);
    k.extend_from_slice(ACCOUNT_PREFIX);
    k.extend_from_slice(addr.as_bytes());
    k
}

/// Keeper errors.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("state: {0}")]
    State(#[from] StateError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    #[error("corrupt account number sequence")]
    CorruptSequence,
    #[error("account {0} already exists")]
    AccountExists(Address),
}

/// On-chain account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Address.
    pub address: Address,
    /// Public key, set once the account has signed.
    pub pub_key: Option<PubKey>,
    /// Unique, monotonically assigned number.
    pub account_number: u64,
    /// Replay counter.
    pub sequence: u64,
}

/// Read access the ante stages need. Implementations must be shareable across
/// concurrent validations.
pub trait AccountKeeper: Send + Sync {
    /// Account at `addr`, if any.
    fn account(&self, addr: &Address) -> Result<Option<Account>, KeeperError>;
    /// Current module params.
    fn params(&self) -> Result<Params, KeeperError>;
}

/// Keeper backed by the sled store.
#[derive(Clone)]
pub struct StoreAccountKeeper {
    state: PersistentState,
}

impl StoreAccountKeeper {
    /// Wrap a store handle.
    pub fn new(state: PersistentState) -> Self {
        Self { state }
    }

    /// Underlying store.
    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    /// Every account, in address order.
    pub fn all_accounts(&self) -> Result<Vec<Account>, KeeperError> {
        let mut out = Vec::new();
        for (_, v) in self.state.scan_prefix(ACCOUNT_PREFIX)? {
            out.push(decode_canonical(&v)?);
        }
        Ok(out)
    }

    /// Next account number to hand out.
    pub fn next_account_number(&self) -> Result<u64, KeeperError> {
        match self.state.get(ACCOUNT_NUMBER_KEY)? {
            Some(raw) => {
                let b: [u8; 8] = raw
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeeperError::CorruptSequence)?;
                Ok(u64::from_be_bytes(b))
            }
            None => Ok(0),
        }
    }

    /// Create an account with the next account number.
    pub fn create_account(
        &self,
        address: Address,
        pub_key: Option<PubKey>,
    ) -> Result<Account, KeeperError> {
        if self.state.get(&account_key(&address))?.is_some() {
            return Err(KeeperError::AccountExists(address));
        }
        let number = self.next_account_number()?;
        let acc = Account {
            address,
            pub_key,
            account_number: number,
            sequence: 0,
        };
        self.state.commit_atomic(vec![
            KvOp::Put {
                key: account_key(&address),
                value: encode_canonical(&acc)?,
            },
            KvOp::Put {
                key: ACCOUNT_NUMBER_KEY.to_vec(),
                value: (number + 1).to_be_bytes().to_vec(),
            },
        ])?;
        Ok(acc)
    }

    /// Overwrite an account record.
    pub fn set_account(&self, acc: &Account) -> Result<(), KeeperError> {
        self.state.commit_atomic(vec![KvOp::Put {
            key: account_key(&acc.address),
            value: encode_canonical(acc)?,
        }])?;
        Ok(())
    }

    /// Overwrite module params.
    pub fn set_params(&self, params: &Params) -> Result<(), KeeperError> {
        self.state.commit_atomic(vec![KvOp::Put {
            key: PARAMS_KEY.to_vec(),
            value: encode_canonical(params)?,
        }])?;
        Ok(())
    }
}

impl AccountKeeper for StoreAccountKeeper {
    fn account(&self, addr: &Address) -> Result<Option<Account>, KeeperError> {
        match self.state.get(&account_key(addr))? {
            Some(raw) => Ok(Some(decode_canonical(&raw)?)),
            None => Ok(None),
        }
    }

    fn params(&self) -> Result<Params, KeeperError> {
        match self.state.get(PARAMS_KEY)? {
            Some(raw) => Ok(decode_canonical(&raw)?),
            None => Ok(Params::default()),
        }
    }
}
