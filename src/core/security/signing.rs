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

//! Domain-separated signing bytes for transactions.

use crate::core::types::{encode_canonical, AuthInfo, CodecError, Tx, TxBody};

const SIGN_DOC_DOMAIN: &[u8] = b"Amunchain-Auth-SignDoc-v1";

fn push_len_prefixed(out: &mut Vec<u8>, b: &[u8]) {
    out.extend_from_slice(&(b.len() as u32).to_be_bytes());
    out.extend_from_slice(b);
}

/// Sign doc payload:
/// domain || len(chain_id) || chain_id || account_number || sequence || len(body) || body || len(auth_info) || auth_info
///
/// Body and auth info use the canonical encoding, so signer and verifier agree
/// byte for byte.
pub fn sign_doc_bytes(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    body: &TxBody,
    auth_info: &AuthInfo,
) -> Result<Vec<u8>, CodecError> {
    let body_bz = encode_canonical(body)?;
    let auth_bz = encode_canonical(auth_info)?;
    let mut out = Vec::with_capacity(
        SIGN_DOC_DOMAIN.len() + 4 + chain_id.len() + 16 + 8 + body_bz.len() + auth_bz.len(),
    );
    out.extend_from_slice(SIGN_DOC_DOMAIN);
    push_len_prefixed(&mut out, chain_id.as_bytes());
    out.extend_from_slice(&account_number.to_be_bytes());
    out.extend_from_slice(&sequence.to_be_bytes());
    push_len_prefixed(&mut out, &body_bz);
    push_len_prefixed(&mut out, &auth_bz);
    Ok(out)
}

/// Sign bytes of `tx` for one signer.
pub fn tx_sign_bytes(
    tx: &Tx,
    chain_id: &str,
    account_number: u64,
    sequence: u64,
) -> Result<Vec<u8>, CodecError> {
    sign_doc_bytes(chain_id, account_number, sequence, &tx.body, &tx.auth_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_and_sequence_are_bound() {
        let tx = Tx::default();
        let a = tx_sign_bytes(&tx, "chain-a", 0, 0).unwrap();
        let b = tx_sign_bytes(&tx, "chain-b", 0, 0).unwrap();
        let c = tx_sign_bytes(&tx, "chain-a", 0, 1).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with(SIGN_DOC_DOMAIN));
    }
}
