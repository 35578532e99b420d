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

//! Persistent key-value state using sled. Module stores share one database and
//! are separated by key prefix, so a single transaction can span a module's
//! data and the versioning table.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use thiserror::Error;

/// State errors.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("db open")]
    DbOpen,
    #[error("db io")]
    DbIo,
}

/// State operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvOp {
    /// Put key/value.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete key.
    Del { key: Vec<u8> },
}

/// Persistent state wrapper.
#[derive(Clone)]
pub struct PersistentState {
    db: sled::Db,
}

impl PersistentState {
    /// Open sled DB at path (directory).
    pub fn open(path: &str) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(|_| StateError::DbOpen)?;
        Ok(Self { db })
    }

    /// Get value.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        let v = self.db.get(key).map_err(|_| StateError::DbIo)?;
        Ok(v.map(|iv| iv.to_vec()))
    }

    /// All pairs whose key starts with `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        let mut out = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (k, v) = item.map_err(|_| StateError::DbIo)?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    /// Atomic commit using sled transactions.
    pub fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError> {
        let res: Result<(), TransactionError<StateError>> = self.db.transaction(|t| {
            for op in ops.iter() {
                match op {
                    KvOp::Put { key, value } => {
                        t.insert(key.as_slice(), value.as_slice())?;
                    }
                    KvOp::Del { key } => {
                        t.remove(key.as_slice())?;
                    }
                }
            }
            Ok::<(), ConflictableTransactionError<StateError>>(())
        });

        match res {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e),
            Err(TransactionError::Storage(_)) => return Err(StateError::DbIo),
        }
        self.db.flush().map_err(|_| StateError::DbIo)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_then_scan_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        st.commit_atomic(vec![
            KvOp::Put { key: b"auth/b".to_vec(), value: b"2".to_vec() },
            KvOp::Put { key: b"auth/a".to_vec(), value: b"1".to_vec() },
            KvOp::Put { key: b"bank/a".to_vec(), value: b"x".to_vec() },
        ])
        .unwrap();
        st.commit_atomic(vec![KvOp::Del { key: b"auth/b".to_vec() }]).unwrap();

        let got = st.scan_prefix(b"auth/").unwrap();
        assert_eq!(got, vec![(b"auth/a".to_vec(), b"1".to_vec())]);
        assert_eq!(st.get(b"bank/a").unwrap(), Some(b"x".to_vec()));
    }
}
