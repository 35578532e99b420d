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

//! Signature verification capability.
//!
//! The ante pipeline only depends on [`SignatureVerifier`]. [`DefaultVerifier`]
//! covers ed25519 (ring) and secp256k1 ECDSA over SHA-256 of the message,
//! compact 64-byte signatures, low-S only.

use crate::core::types::{PubKey, Signature};
use ring::{
    digest,
    signature::{UnparsedPublicKey, ED25519},
};
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, VerifyOnly};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("bad signature")]
    BadSignature,
    #[error("malformed key")]
    MalformedKey,
    #[error("unsupported key type {0}")]
    UnsupportedKey(&'static str),
}

/// Multisig signature: one optional entry per member key, in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignature {
    /// Member signatures.
    pub signatures: Vec<Option<Signature>>,
}

/// Single-key signature verification.
pub trait SignatureVerifier: Send + Sync {
    /// Verify `sig` over `msg` for a single (non-multisig) key.
    fn verify(&self, pub_key: &PubKey, msg: &[u8], sig: &Signature) -> Result<(), VerifyError>;
}

/// ed25519 + secp256k1 verifier.
pub struct DefaultVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Default for DefaultVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultVerifier {
    /// Create a verifier.
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl SignatureVerifier for DefaultVerifier {
    fn verify(&self, pub_key: &PubKey, msg: &[u8], sig: &Signature) -> Result<(), VerifyError> {
        match pub_key {
            PubKey::Ed25519(pk) => {
                if pk.len() != 32 {
                    return Err(VerifyError::MalformedKey);
                }
                UnparsedPublicKey::new(&ED25519, pk)
                    .verify(msg, &sig.0)
                    .map_err(|_| VerifyError::BadSignature)
            }
            PubKey::Secp256k1(pk) => {
                let pk = PublicKey::from_slice(pk).map_err(|_| VerifyError::MalformedKey)?;
                let sig =
                    ecdsa::Signature::from_compact(&sig.0).map_err(|_| VerifyError::BadSignature)?;
                let hash = digest::digest(&digest::SHA256, msg);
                let m = Message::from_digest_slice(hash.as_ref())
                    .map_err(|_| VerifyError::BadSignature)?;
                self.secp
                    .verify_ecdsa(&m, &sig, &pk)
                    .map_err(|_| VerifyError::BadSignature)
            }
            PubKey::Multisig { .. } => Err(VerifyError::UnsupportedKey("multisig")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::{
        rand::SystemRandom,
        signature::{Ed25519KeyPair, KeyPair},
    };

    #[test]
    fn ed25519_roundtrip() {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let pk = PubKey::Ed25519(kp.public_key().as_ref().to_vec());
        let sig = Signature(kp.sign(b"msg").as_ref().to_vec());

        let v = DefaultVerifier::new();
        assert_eq!(v.verify(&pk, b"msg", &sig), Ok(()));
        assert_eq!(v.verify(&pk, b"other", &sig), Err(VerifyError::BadSignature));
    }

    #[test]
    fn secp256k1_roundtrip() {
        let secp = Secp256k1::new();
        let sk = secp256k1::SecretKey::from_slice(&[0x42u8; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        let hash = digest::digest(&digest::SHA256, b"msg");
        let m = Message::from_digest_slice(hash.as_ref()).unwrap();
        let sig = Signature(secp.sign_ecdsa(&m, &sk).serialize_compact().to_vec());

        let key = PubKey::Secp256k1(pk.serialize().to_vec());
        let v = DefaultVerifier::new();
        assert_eq!(v.verify(&key, b"msg", &sig), Ok(()));
        assert_eq!(v.verify(&key, b"nope", &sig), Err(VerifyError::BadSignature));
    }
}
