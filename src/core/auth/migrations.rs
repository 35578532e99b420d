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

//! Auth store migrations.
//!
//! Layout history:
//! - v1: `auth/acc/<hex address>` -> [`AccountV1`], params at `auth/legacy_params`
//! - v2: account numbers assigned, counter at `auth/acct_num` (canonical u64)
//! - v3: params at `auth/params`
//! - v4: accounts keyed by raw address bytes under `auth/account/`
//! - v5: counter at `auth/seq/account_number` (big-endian u64)

use crate::core::{
    auth::{
        keeper::{account_key, Account, ACCOUNT_NUMBER_KEY, PARAMS_KEY},
        params::Params,
        MODULE_NAME,
    },
    state::staged::StagedState,
    types::{decode_canonical, encode_canonical, Address, PubKey},
    upgrade::registry::{MigrationRegistryBuilder, RegistryError, StepError},
};
use serde::{Deserialize, Serialize};

/// v1–v3 account prefix (hex-string keys).
pub const LEGACY_ACCOUNT_PREFIX: &[u8] = b"auth/acc/";
/// v1–v2 params key.
pub const LEGACY_PARAMS_KEY: &[u8] = b"auth/legacy_params";
/// v2–v4 account number counter.
pub const LEGACY_ACCOUNT_NUMBER_KEY: &[u8] = b"auth/acct_num";

/// Account record before account numbers existed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountV1 {
    /// Address.
    pub address: Address,
    /// Public key.
    pub pub_key: Option<PubKey>,
    /// Sequence.
    pub sequence: u64,
}

/// v1–v3 key of an account.
pub fn legacy_account_key(addr: &Address) -> Vec<u8> {
    let mut k = LEGACY_ACCOUNT_PREFIX.to_vec();
    k.extend_from_slice(addr.to_hex().as_bytes());
    k
}

/// 1→2: number accounts in key order and start the counter.
pub fn migrate_v1_to_v2(store: &mut StagedState<'_>) -> Result<(), StepError> {
    let mut next = 0u64;
    for (key, raw) in store.scan_prefix(LEGACY_ACCOUNT_PREFIX)? {
        let old: AccountV1 = decode_canonical(&raw)?;
        let acc = Account {
            address: old.address,
            pub_key: old.pub_key,
            account_number: next,
            sequence: old.sequence,
        };
        store.put(key, encode_canonical(&acc)?);
        next += 1;
    }
    store.put(LEGACY_ACCOUNT_NUMBER_KEY.to_vec(), encode_canonical(&next)?);
    Ok(())
}

/// 2→3: move params to their own key, writing defaults when none were stored.
pub fn migrate_v2_to_v3(store: &mut StagedState<'_>) -> Result<(), StepError> {
    let params = match store.get(LEGACY_PARAMS_KEY)? {
        Some(raw) => decode_canonical::<Params>(&raw)?,
        None => Params::default(),
    };
    params
        .validate()
        .map_err(|e| StepError::Invalid(format!("legacy params: {e}")))?;
    store.put(PARAMS_KEY.to_vec(), encode_canonical(&params)?);
    store.delete(LEGACY_PARAMS_KEY.to_vec());
    Ok(())
}

/// 3→4: re-key accounts from hex strings to raw address bytes.
pub fn migrate_v3_to_v4(store: &mut StagedState<'_>) -> Result<(), StepError> {
    for (key, raw) in store.scan_prefix(LEGACY_ACCOUNT_PREFIX)? {
        let acc: Account = decode_canonical(&raw)?;
        let hex_part = &key[LEGACY_ACCOUNT_PREFIX.len()..];
        let keyed = std::str::from_utf8(hex_part)
            .ok()
            .and_then(Address::from_hex)
            .ok_or_else(|| StepError::Invalid(format!("bad legacy account key {}", hex::encode(&key))))?;
        if keyed != acc.address {
            return Err(StepError::Invalid(format!(
                "account {} stored under key for {}",
                acc.address, keyed
            )));
        }
        store.delete(key);
        store.put(account_key(&acc.address), raw);
    }
    Ok(())
}

/// 4→5: move the counter to a big-endian sequence key.
pub fn migrate_v4_to_v5(store: &mut StagedState<'_>) -> Result<(), StepError> {
    let next = match store.get(LEGACY_ACCOUNT_NUMBER_KEY)? {
        Some(raw) => decode_canonical::<u64>(&raw)?,
        None => 0,
    };
    store.put(ACCOUNT_NUMBER_KEY.to_vec(), next.to_be_bytes().to_vec());
    store.delete(LEGACY_ACCOUNT_NUMBER_KEY.to_vec());
    Ok(())
}

/// Register the full auth chain, ascending and contiguous.
pub fn register_migrations(builder: &mut MigrationRegistryBuilder) -> Result<(), RegistryError> {
    builder.register(MODULE_NAME, 1, migrate_v1_to_v2)?;
    builder.register(MODULE_NAME, 2, migrate_v2_to_v3)?;
    builder.register(MODULE_NAME, 3, migrate_v3_to_v4)?;
    builder.register(MODULE_NAME, 4, migrate_v4_to_v5)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::persistent_state::{KvOp, PersistentState};

    #[test]
    fn chain_is_contiguous_up_to_consensus_version() {
        let mut b = MigrationRegistryBuilder::new();
        register_migrations(&mut b).unwrap();
        assert_eq!(
            register_migrations(&mut b),
            Err(RegistryError::DuplicateKey { module: MODULE_NAME.into(), from: 1 })
        );
        let reg = b.build();
        assert_eq!(reg.source_versions(MODULE_NAME), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rekey_rejects_misplaced_account() {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        let acc = Account {
            address: Address::from_bytes([3u8; 20]),
            pub_key: None,
            account_number: 0,
            sequence: 0,
        };
        st.commit_atomic(vec![KvOp::Put {
            key: legacy_account_key(&Address::from_bytes([4u8; 20])),
            value: encode_canonical(&acc).unwrap(),
        }])
        .unwrap();

        let mut staged = StagedState::new(&st);
        assert!(matches!(migrate_v3_to_v4(&mut staged), Err(StepError::Invalid(_))));
    }
}
