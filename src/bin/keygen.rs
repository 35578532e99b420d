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

//! Generate an ed25519 account key. Writes the PKCS#8 document to
//! `<dir>/account.key` and prints a genesis account entry as JSON.

use amunchain_modkit::core::{auth::genesis::GenesisAccount, types::PubKey};
use anyhow::{anyhow, Result};
use ring::signature::{Ed25519KeyPair, KeyPair};
use std::path::PathBuf;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let out_dir = args.next().unwrap_or_else(|| "data".to_string());
    let account_number: u64 = match args.next() {
        Some(n) => n.parse().map_err(|_| anyhow!("account number must be an integer"))?,
        None => 0,
    };

    let mut key_path = PathBuf::from(out_dir);
    std::fs::create_dir_all(&key_path)?;
    key_path.push("account.key");

    let rng = ring::rand::SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| anyhow!("key generation failed"))?;
    std::fs::write(&key_path, pkcs8.as_ref())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600));
    }

    let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| anyhow!("bad pkcs8"))?;
    let pk = PubKey::Ed25519(kp.public_key().as_ref().to_vec());
    let entry = GenesisAccount {
        address: pk.address().to_hex(),
        pub_key: Some(pk),
        account_number,
        sequence: 0,
    };
    println!("{}", serde_json::to_string_pretty(&entry)?);
    eprintln!("key written to {}", key_path.display());
    Ok(())
}
