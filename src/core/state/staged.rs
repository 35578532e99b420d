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

//! Write overlay over [`PersistentState`]. Reads see staged writes first; nothing
//! reaches the database until the owner turns the overlay into a batch and
//! commits it atomically.

use crate::core::state::persistent_state::{KvOp, PersistentState, StateError};
use std::collections::BTreeMap;

/// Staged writes over a read-only base. `None` marks a staged delete.
pub struct StagedState<'a> {
    base: &'a PersistentState,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StagedState<'a> {
    /// Empty overlay.
    pub fn new(base: &'a PersistentState) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Read through the overlay.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.base.get(key),
        }
    }

    /// Stage a put.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    /// Merged view of every pair under `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan_prefix(prefix)?.into_iter().collect();
        for (k, v) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match v {
                Some(v) => {
                    merged.insert(k.clone(), v.clone());
                }
                None => {
                    merged.remove(k);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Drain into a batch for [`PersistentState::commit_atomic`].
    pub fn into_ops(self) -> Vec<KvOp> {
        self.writes
            .into_iter()
            .map(|(key, v)| match v {
                Some(value) => KvOp::Put { key, value },
                None => KvOp::Del { key },
            })
            .collect()
    }
}
