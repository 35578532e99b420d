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

//! Randomized genesis for simulation runs. Same seed, same state.

use crate::core::{
    auth::{
        genesis::{GenesisAccount, GenesisState},
        params::Params,
    },
    types::PubKey,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn random_params(rng: &mut StdRng) -> Params {
    Params {
        max_memo_characters: rng.gen_range(100..=200),
        tx_sig_limit: rng.gen_range(5..=10),
        tx_size_cost_per_byte: rng.gen_range(5..=15),
        sig_verify_cost_ed25519: rng.gen_range(500..=1000),
        sig_verify_cost_secp256k1: rng.gen_range(500..=1000),
    }
}

/// `n` accounts with ed25519-shaped keys, numbered 0..n.
pub fn random_genesis(seed: u64, n: usize) -> GenesisState {
    let mut rng = StdRng::seed_from_u64(seed);
    let params = random_params(&mut rng);
    let accounts = (0..n)
        .map(|i| {
            let mut key = [0u8; 32];
            rng.fill(&mut key);
            let pk = PubKey::Ed25519(key.to_vec());
            GenesisAccount {
                address: pk.address().to_hex(),
                pub_key: rng.gen_bool(0.5).then_some(pk),
                account_number: i as u64,
                sequence: rng.gen_range(0..10),
            }
        })
        .collect();
    GenesisState { params, accounts }
}
