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
#![allow(missing_docs)]

//! Read-only query routes, answered as JSON.

use crate::core::{
    auth::{
        genesis::GenesisAccount,
        keeper::{AccountKeeper, KeeperError, StoreAccountKeeper},
    },
    types::Address,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown route {0}")]
    UnknownRoute(String),
    #[error("bad argument: {0}")]
    BadArgument(String),
    #[error("not found")]
    NotFound,
    #[error("keeper: {0}")]
    Keeper(#[from] KeeperError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait QueryService: Send + Sync {
    /// Supported route names.
    fn routes(&self) -> &'static [&'static str];
    /// Answer `route` with an optional argument.
    fn query(&self, route: &str, arg: Option<&str>) -> Result<Value, QueryError>;
}

const AUTH_ROUTES: &[&str] = &["params", "account", "accounts", "next_account_number"];

impl QueryService for StoreAccountKeeper {
    fn routes(&self) -> &'static [&'static str] {
        AUTH_ROUTES
    }

    fn query(&self, route: &str, arg: Option<&str>) -> Result<Value, QueryError> {
        match route {
            "params" => Ok(serde_json::to_value(self.params()?)?),
            "account" => {
                let raw = arg.ok_or_else(|| QueryError::BadArgument("address required".into()))?;
                let addr =
                    Address::from_hex(raw).ok_or_else(|| QueryError::BadArgument(raw.to_string()))?;
                let acc = self.account(&addr)?.ok_or(QueryError::NotFound)?;
                Ok(serde_json::to_value(GenesisAccount::from_account(&acc))?)
            }
            "accounts" => {
                let mut accounts = self.all_accounts()?;
                accounts.sort_by_key(|a| a.account_number);
                let out: Vec<GenesisAccount> = accounts.iter().map(GenesisAccount::from_account).collect();
                Ok(serde_json::to_value(out)?)
            }
            "next_account_number" => Ok(json!({ "next": self.next_account_number()? })),
            other => Err(QueryError::UnknownRoute(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::persistent_state::PersistentState;

    #[test]
    fn account_route_returns_hex_address() {
        let dir = tempfile::tempdir().unwrap();
        let k = StoreAccountKeeper::new(PersistentState::open(dir.path().to_str().unwrap()).unwrap());
        let addr = Address::from_bytes([5u8; 20]);
        k.create_account(addr, None).unwrap();

        let v = k.query("account", Some(&addr.to_hex())).unwrap();
        assert_eq!(v["address"], addr.to_hex());
        assert!(matches!(k.query("account", Some(&"06".repeat(20))), Err(QueryError::NotFound)));
        assert!(matches!(k.query("balances", None), Err(QueryError::UnknownRoute(_))));
        assert_eq!(k.query("next_account_number", None).unwrap()["next"], 1);
    }
}
