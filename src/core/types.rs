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

//! Deterministic core types and canonical encoding helpers.

use bincode::Options;
use ring::digest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization")]
    Deserialize,
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable integer representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules. Requires deterministic container ordering (use BTreeMap/BTreeSet).
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode without an explicit cap. Only for trusted bytes read back from the local store.
pub fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode_opts()
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    // Fast-path cap on the raw wire payload.
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    // Cap inside the deserializer too, so container lengths cannot allocate past `max`.
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let d = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}

/// Account address: first 20 bytes of SHA-256 over the public key encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// Address length in bytes.
    pub const LEN: usize = 20;

    /// Construct from raw bytes.
    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    /// Construct from a slice, if it has the right length.
    pub fn from_slice(b: &[u8]) -> Option<Self> {
        if b.len() != Self::LEN {
            return None;
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(b);
        Some(Self(out))
    }

    /// Parse lowercase or uppercase hex.
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s).ok()?;
        Self::from_slice(&raw)
    }

    /// Return bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

/// Signature bytes. An empty signature means "not supplied".
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// True when no signature bytes were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Public key errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{key_type} key must be {expected} bytes, got {got}")]
    BadLength {
        key_type: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("secp256k1 key must be compressed")]
    NotCompressed,
    #[error("multisig threshold {threshold} invalid for {keys} keys")]
    BadThreshold { threshold: u32, keys: usize },
}

fn check_ed25519(b: &[u8]) -> Result<(), KeyError> {
    if b.len() != 32 {
        return Err(KeyError::BadLength {
            key_type: "ed25519",
            expected: 32,
            got: b.len(),
        });
    }
    Ok(())
}

fn check_secp256k1(b: &[u8]) -> Result<(), KeyError> {
    if b.len() != 33 {
        return Err(KeyError::BadLength {
            key_type: "secp256k1",
            expected: 33,
            got: b.len(),
        });
    }
    if b[0] != 0x02 && b[0] != 0x03 {
        return Err(KeyError::NotCompressed);
    }
    Ok(())
}

fn key_address(bytes: &[u8]) -> Address {
    let h = sha256(bytes);
    let mut out = [0u8; 20];
    out.copy_from_slice(&h[..20]);
    Address(out)
}

/// Multisig member key. Has no multisig variant, so the wire format cannot nest.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SingleKey {
    /// Ed25519 key, 32 bytes.
    Ed25519(Vec<u8>),
    /// Compressed secp256k1 key, 33 bytes.
    Secp256k1(Vec<u8>),
}

impl SingleKey {
    /// Raw key bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            SingleKey::Ed25519(b) | SingleKey::Secp256k1(b) => b,
        }
    }

    /// Structural validation of the key encoding.
    pub fn validate(&self) -> Result<(), KeyError> {
        match self {
            SingleKey::Ed25519(b) => check_ed25519(b),
            SingleKey::Secp256k1(b) => check_secp256k1(b),
        }
    }

    /// Address controlled by this key alone.
    pub fn address(&self) -> Address {
        key_address(self.bytes())
    }
}

impl From<SingleKey> for PubKey {
    fn from(k: SingleKey) -> Self {
        match k {
            SingleKey::Ed25519(b) => PubKey::Ed25519(b),
            SingleKey::Secp256k1(b) => PubKey::Secp256k1(b),
        }
    }
}

/// Account public key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PubKey {
    /// Ed25519 key, 32 bytes.
    Ed25519(Vec<u8>),
    /// Compressed secp256k1 key, 33 bytes.
    Secp256k1(Vec<u8>),
    /// Threshold multisig over single keys.
    Multisig {
        /// Required signatures.
        threshold: u32,
        /// Member keys, ordered.
        keys: Vec<SingleKey>,
    },
}

impl PubKey {
    /// Key type name as used in consensus validator allow-lists.
    pub fn type_name(&self) -> &'static str {
        match self {
            PubKey::Ed25519(_) => "ed25519",
            PubKey::Secp256k1(_) => "secp256k1",
            PubKey::Multisig { .. } => "multisig",
        }
    }

    /// Structural validation of the key encoding.
    pub fn validate(&self) -> Result<(), KeyError> {
        match self {
            PubKey::Ed25519(b) => check_ed25519(b),
            PubKey::Secp256k1(b) => check_secp256k1(b),
            PubKey::Multisig { threshold, keys } => {
                if *threshold == 0 || *threshold as usize > keys.len() {
                    return Err(KeyError::BadThreshold {
                        threshold: *threshold,
                        keys: keys.len(),
                    });
                }
                keys.iter().try_for_each(SingleKey::validate)
            }
        }
    }

    /// Number of signatures this key stands for (multisig counts every member).
    pub fn signature_count(&self) -> usize {
        match self {
            PubKey::Multisig { keys, .. } => keys.len(),
            _ => 1,
        }
    }

    /// Raw key bytes length (sum of members for multisig).
    pub fn encoded_len(&self) -> usize {
        match self {
            PubKey::Ed25519(b) | PubKey::Secp256k1(b) => b.len(),
            PubKey::Multisig { keys, .. } => keys.iter().map(|k| k.bytes().len()).sum(),
        }
    }

    /// Derive the account address controlled by this key.
    pub fn address(&self) -> Address {
        match self {
            PubKey::Ed25519(b) | PubKey::Secp256k1(b) => key_address(b),
            PubKey::Multisig { threshold, keys } => {
                let mut buf = Vec::with_capacity(16 + keys.len() * Address::LEN);
                buf.extend_from_slice(b"multisig");
                buf.extend_from_slice(&threshold.to_be_bytes());
                for k in keys {
                    buf.extend_from_slice(k.address().as_bytes());
                }
                key_address(&buf)
            }
        }
    }
}

/// A module message carried by a transaction. Its payload is opaque here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    /// Fully qualified message type.
    pub type_url: String,
    /// Addresses that must sign for this message.
    pub signers: Vec<Address>,
    /// Encoded message payload.
    pub value: Vec<u8>,
}

/// Transaction body (covered by signatures).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    /// Messages, executed in order.
    pub messages: Vec<Msg>,
    /// Free-form note.
    pub memo: String,
    /// Last block height at which the tx may be included (0 => no bound).
    pub timeout_height: u64,
}

/// Per-signer metadata declared by the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    /// Public key, optional once the account has one on record.
    pub public_key: Option<PubKey>,
    /// Account sequence the signature was produced for.
    pub sequence: u64,
}

/// Fee and gas limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee amount in base units.
    pub amount: u128,
    /// Gas limit requested by the submitter.
    pub gas_limit: u64,
}

/// Signer infos and fee (covered by signatures).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// One entry per required signer, in signer order.
    pub signer_infos: Vec<SignerInfo>,
    /// Fee.
    pub fee: Fee,
}

/// Signed transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Body.
    pub body: TxBody,
    /// Auth info.
    pub auth_info: AuthInfo,
    /// One signature per required signer, in signer order.
    pub signatures: Vec<Signature>,
}

impl Tx {
    /// Required signers: message signers in first-seen order, deduplicated.
    pub fn signers(&self) -> Vec<Address> {
        let mut out: Vec<Address> = Vec::new();
        for m in &self.body.messages {
            for s in &m.signers {
                if !out.contains(s) {
                    out.push(*s);
                }
            }
        }
        out
    }

    /// Canonical encoding of the whole transaction.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode_canonical(self)
    }

    /// Decode a raw transaction with a size cap.
    pub fn from_bytes_limited(bytes: &[u8], max: usize) -> Result<Self, CodecError> {
        decode_canonical_limited(bytes, max)
    }
}
