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

//! Versioning table: `__versions/<module>` -> big-endian u64.

use crate::core::{
    state::persistent_state::{KvOp, PersistentState},
    upgrade::registry::MigrationError,
};
use std::collections::BTreeMap;

const VERSION_PREFIX: &[u8] = b"__versions/";

/// Store key of a module's version entry.
pub fn version_key(module: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(VERSION_PREFIX.len() + module.len());
    k.extend_from_slice(VERSION_PREFIX);
    k.extend_from_slice(module.as_bytes());
    k
}

fn decode_version(module: &str, raw: &[u8]) -> Result<u64, MigrationError> {
    let b: [u8; 8] = raw
        .try_into()
        .map_err(|_| MigrationError::CorruptVersion { module: module.to_string() })?;
    Ok(u64::from_be_bytes(b))
}

/// Stored version of `module`, `None` if the module was never initialised.
pub fn read_version(state: &PersistentState, module: &str) -> Result<Option<u64>, MigrationError> {
    match state.get(&version_key(module))? {
        Some(raw) => Ok(Some(decode_version(module, &raw)?)),
        None => Ok(None),
    }
}

/// Write op recording `version` for `module`. Callers batch it with the data it describes.
pub fn version_op(module: &str, version: u64) -> KvOp {
    KvOp::Put {
        key: version_key(module),
        value: version.to_be_bytes().to_vec(),
    }
}

/// Every recorded module version.
pub fn version_map(state: &PersistentState) -> Result<BTreeMap<String, u64>, MigrationError> {
    let mut out = BTreeMap::new();
    for (k, v) in state.scan_prefix(VERSION_PREFIX)? {
        let module = String::from_utf8_lossy(&k[VERSION_PREFIX.len()..]).into_owned();
        let version = decode_version(&module, &v)?;
        out.insert(module, version);
    }
    Ok(out)
}
