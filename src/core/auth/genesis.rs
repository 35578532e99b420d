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

//! Auth genesis. The blob exchanged with the host is JSON; its structure is
//! private to this module.

use crate::core::{
    auth::{
        keeper::{
            account_key, Account, AccountKeeper, KeeperError, StoreAccountKeeper,
            ACCOUNT_NUMBER_KEY, PARAMS_KEY,
        },
        params::{Params, ParamsError},
    },
    state::persistent_state::KvOp,
    types::{encode_canonical, Address, PubKey},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

/// Genesis errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("genesis json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("params: {0}")]
    Params(#[from] ParamsError),
    #[error("bad address {0:?}")]
    BadAddress(String),
    #[error("duplicate account {0}")]
    DuplicateAccount(Address),
    #[error("duplicate account number {0}")]
    DuplicateAccountNumber(u64),
    #[error("pubkey of {0} does not match its address")]
    KeyMismatch(Address),
    #[error("store already initialised")]
    AlreadyInitialised,
    #[error("keeper: {0}")]
    Keeper(#[from] KeeperError),
}

/// Genesis account entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Hex address.
    pub address: String,
    /// Optional public key.
    #[serde(default)]
    pub pub_key: Option<PubKey>,
    /// Account number.
    pub account_number: u64,
    /// Sequence.
    #[serde(default)]
    pub sequence: u64,
}

impl GenesisAccount {
    /// Entry for a stored account.
    pub fn from_account(acc: &Account) -> Self {
        Self {
            address: acc.address.to_hex(),
            pub_key: acc.pub_key.clone(),
            account_number: acc.account_number,
            sequence: acc.sequence,
        }
    }

    /// Parse into a store record.
    pub fn to_account(&self) -> Result<Account, GenesisError> {
        let address =
            Address::from_hex(&self.address).ok_or_else(|| GenesisError::BadAddress(self.address.clone()))?;
        Ok(Account {
            address,
            pub_key: self.pub_key.clone(),
            account_number: self.account_number,
            sequence: self.sequence,
        })
    }
}

/// Auth genesis state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    /// Module params.
    pub params: Params,
    /// Accounts.
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

impl GenesisState {
    /// Decode a JSON blob.
    pub fn from_json(raw: &[u8]) -> Result<Self, GenesisError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, GenesisError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Structural checks. Returns the parsed accounts.
    pub fn validate(&self) -> Result<Vec<Account>, GenesisError> {
        self.params.validate()?;
        let mut seen_addr = BTreeSet::new();
        let mut seen_num = BTreeSet::new();
        let mut out = Vec::with_capacity(self.accounts.len());
        for ga in &self.accounts {
            let acc = ga.to_account()?;
            if !seen_addr.insert(acc.address) {
                return Err(GenesisError::DuplicateAccount(acc.address));
            }
            if !seen_num.insert(acc.account_number) {
                return Err(GenesisError::DuplicateAccountNumber(acc.account_number));
            }
            if let Some(pk) = &acc.pub_key {
                if pk.validate().is_err() || pk.address() != acc.address {
                    return Err(GenesisError::KeyMismatch(acc.address));
                }
            }
            out.push(acc);
        }
        Ok(out)
    }
}

/// Genesis contract of a state-owning collaborator. Blobs pass through the
/// host unchanged.
pub trait GenesisStore: Send + Sync {
    /// Default blob for a new chain.
    fn default_genesis(&self) -> Result<Vec<u8>, GenesisError>;
    /// Check a blob without touching the store.
    fn validate_genesis(&self, raw: &[u8]) -> Result<(), GenesisError>;
    /// Writes that load a blob into an empty store, left uncommitted so the
    /// caller can batch them with its own.
    fn genesis_ops(&self, raw: &[u8]) -> Result<Vec<KvOp>, GenesisError>;
    /// Load a blob into an empty store.
    fn init_genesis(&self, raw: &[u8]) -> Result<(), GenesisError>;
    /// Dump the store as a blob.
    fn export_genesis(&self) -> Result<Vec<u8>, GenesisError>;
}

impl GenesisStore for StoreAccountKeeper {
    fn default_genesis(&self) -> Result<Vec<u8>, GenesisError> {
        GenesisState::default().to_json()
    }

    fn validate_genesis(&self, raw: &[u8]) -> Result<(), GenesisError> {
        GenesisState::from_json(raw)?.validate().map(|_| ())
    }

    fn genesis_ops(&self, raw: &[u8]) -> Result<Vec<KvOp>, GenesisError> {
        let gs = GenesisState::from_json(raw)?;
        let accounts = gs.validate()?;
        let has_params = self
            .state()
            .get(PARAMS_KEY)
            .map_err(KeeperError::from)?
            .is_some();
        if has_params || !self.all_accounts()?.is_empty() {
            return Err(GenesisError::AlreadyInitialised);
        }

        let next = accounts
            .iter()
            .map(|a| a.account_number.saturating_add(1))
            .max()
            .unwrap_or(0);
        let mut ops = Vec::with_capacity(accounts.len() + 2);
        ops.push(KvOp::Put {
            key: PARAMS_KEY.to_vec(),
            value: encode_canonical(&gs.params).map_err(KeeperError::from)?,
        });
        for acc in &accounts {
            ops.push(KvOp::Put {
                key: account_key(&acc.address),
                value: encode_canonical(acc).map_err(KeeperError::from)?,
            });
        }
        ops.push(KvOp::Put {
            key: ACCOUNT_NUMBER_KEY.to_vec(),
            value: next.to_be_bytes().to_vec(),
        });
        Ok(ops)
    }

    fn init_genesis(&self, raw: &[u8]) -> Result<(), GenesisError> {
        let ops = self.genesis_ops(raw)?;
        let accounts = ops.len().saturating_sub(2);
        self.state().commit_atomic(ops).map_err(KeeperError::from)?;
        info!(accounts, "auth genesis imported");
        Ok(())
    }

    fn export_genesis(&self) -> Result<Vec<u8>, GenesisError> {
        let mut accounts = self.all_accounts()?;
        accounts.sort_by_key(|a| a.account_number);
        GenesisState {
            params: self.params()?,
            accounts: accounts.iter().map(GenesisAccount::from_account).collect(),
        }
        .to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::persistent_state::PersistentState;

    fn keeper() -> (tempfile::TempDir, StoreAccountKeeper) {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        (dir, StoreAccountKeeper::new(st))
    }

    #[test]
    fn import_then_export_round_trips() {
        let (_d, k) = keeper();
        let pk = PubKey::Ed25519(vec![7u8; 32]);
        let gs = GenesisState {
            params: Params { max_memo_characters: 128, ..Params::default() },
            accounts: vec![
                GenesisAccount {
                    address: Address::from_bytes([9u8; 20]).to_hex(),
                    pub_key: None,
                    account_number: 4,
                    sequence: 2,
                },
                GenesisAccount {
                    address: pk.address().to_hex(),
                    pub_key: Some(pk),
                    account_number: 1,
                    sequence: 0,
                },
            ],
        };
        k.init_genesis(&gs.to_json().unwrap()).unwrap();
        assert_eq!(k.next_account_number().unwrap(), 5);

        let back = GenesisState::from_json(&k.export_genesis().unwrap()).unwrap();
        assert_eq!(back.params, gs.params);
        let numbers: Vec<u64> = back.accounts.iter().map(|a| a.account_number).collect();
        assert_eq!(numbers, vec![1, 4]);
        assert!(matches!(k.init_genesis(&gs.to_json().unwrap()), Err(GenesisError::AlreadyInitialised)));
    }

    #[test]
    fn second_import_into_accountless_store_is_refused() {
        let (_d, k) = keeper();
        let first = GenesisState {
            params: Params { max_memo_characters: 64, ..Params::default() },
            accounts: vec![],
        };
        k.init_genesis(&first.to_json().unwrap()).unwrap();

        let second = GenesisState::default().to_json().unwrap();
        assert!(matches!(k.genesis_ops(&second), Err(GenesisError::AlreadyInitialised)));
        assert!(matches!(k.init_genesis(&second), Err(GenesisError::AlreadyInitialised)));
        assert_eq!(k.params().unwrap().max_memo_characters, 64);
    }

    #[test]
    fn genesis_ops_do_not_touch_the_store() {
        let (_d, k) = keeper();
        let gs = GenesisState {
            params: Params::default(),
            accounts: vec![GenesisAccount {
                address: Address::from_bytes([3u8; 20]).to_hex(),
                pub_key: None,
                account_number: 0,
                sequence: 0,
            }],
        };
        let ops = k.genesis_ops(&gs.to_json().unwrap()).unwrap();
        assert_eq!(ops.len(), 3);
        assert!(k.all_accounts().unwrap().is_empty());
        assert_eq!(k.state().get(PARAMS_KEY).unwrap(), None);
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let (_d, k) = keeper();
        let gs = GenesisState {
            params: Params::default(),
            accounts: vec![GenesisAccount {
                address: Address::from_bytes([1u8; 20]).to_hex(),
                pub_key: Some(PubKey::Ed25519(vec![7u8; 32])),
                account_number: 0,
                sequence: 0,
            }],
        };
        assert!(matches!(
            k.validate_genesis(&gs.to_json().unwrap()),
            Err(GenesisError::KeyMismatch(_))
        ));
    }

    #[test]
    fn duplicate_numbers_are_rejected() {
        let gs = GenesisState {
            params: Params::default(),
            accounts: vec![
                GenesisAccount { address: "01".repeat(20), pub_key: None, account_number: 0, sequence: 0 },
                GenesisAccount { address: "02".repeat(20), pub_key: None, account_number: 0, sequence: 0 },
            ],
        };
        assert!(matches!(gs.validate(), Err(GenesisError::DuplicateAccountNumber(0))));
    }
}
