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

//! Signature verification stage. Appended after the standard seven, it reads
//! the keys cached by `set_pubkey` and delegates the cryptography to a
//! [`SignatureVerifier`].
//!
//! Verification gas is charged in every mode. In simulation, sequence and
//! signature checks are skipped.

use crate::core::{
    ante::{
        context::{AnteContext, SignerMeta},
        pipeline::{AnteStage, StageError},
    },
    auth::{keeper::AccountKeeper, params::Params},
    security::{
        signing::tx_sign_bytes,
        verifier::{MultiSignature, SignatureVerifier},
    },
    types::{decode_canonical_limited, PubKey, Signature, SingleKey, Tx},
};
use std::sync::Arc;

/// Upper bound for an encoded multisig signature.
const MAX_MULTISIG_BYTES: usize = 16 * 1024;

/// Verification gas for one key.
fn verify_cost(pk: &PubKey, params: &Params) -> u64 {
    match pk {
        PubKey::Ed25519(_) => params.sig_verify_cost_ed25519,
        PubKey::Secp256k1(_) => params.sig_verify_cost_secp256k1,
        PubKey::Multisig { keys, .. } => keys
            .iter()
            .map(|k| match k {
                SingleKey::Ed25519(_) => params.sig_verify_cost_ed25519,
                SingleKey::Secp256k1(_) => params.sig_verify_cost_secp256k1,
            })
            .fold(0u64, u64::saturating_add),
    }
}

/// Checks sequences and signatures of every signer.
pub struct SigVerify<K, V: ?Sized> {
    keeper: Arc<K>,
    verifier: Arc<V>,
}

impl<K, V: ?Sized> SigVerify<K, V> {
    /// New stage.
    pub fn new(keeper: Arc<K>, verifier: Arc<V>) -> Self {
        Self { keeper, verifier }
    }
}

impl<K: AccountKeeper, V: SignatureVerifier + ?Sized> SigVerify<K, V> {
    fn verify_one(&self, signer: &SignerMeta, msg: &[u8], sig: &Signature) -> Result<(), StageError> {
        let unauthorized = || StageError::Unauthorized(signer.address);
        match &signer.pub_key {
            PubKey::Multisig { threshold, keys } => {
                let multi: MultiSignature = decode_canonical_limited(&sig.0, MAX_MULTISIG_BYTES)
                    .map_err(|_| unauthorized())?;
                if multi.signatures.len() != keys.len() {
                    return Err(unauthorized());
                }
                let mut valid = 0u32;
                for (k, s) in keys.iter().zip(multi.signatures.iter()) {
                    if let Some(s) = s {
                        self.verifier
                            .verify(&PubKey::from(k.clone()), msg, s)
                            .map_err(|_| unauthorized())?;
                        valid += 1;
                    }
                }
                if valid < *threshold {
                    return Err(unauthorized());
                }
                Ok(())
            }
            pk => self.verifier.verify(pk, msg, sig).map_err(|_| unauthorized()),
        }
    }
}

impl<K: AccountKeeper, V: SignatureVerifier + ?Sized> AnteStage for SigVerify<K, V> {
    fn name(&self) -> &'static str {
        "sig_verify"
    }

    fn handle(&self, mut ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError> {
        let params = self.keeper.params()?;
        for signer in &ctx.signers {
            ctx.gas_meter
                .consume(verify_cost(&signer.pub_key, &params), "sigVerify")?;
        }
        if simulate {
            return Ok(ctx);
        }

        for (i, signer) in ctx.signers.iter().enumerate() {
            let declared = tx
                .auth_info
                .signer_infos
                .get(i)
                .map(|si| si.sequence)
                .unwrap_or_default();
            if declared != signer.sequence {
                return Err(StageError::WrongSequence {
                    address: signer.address,
                    expected: signer.sequence,
                    got: declared,
                });
            }

            let sig = tx
                .signatures
                .get(i)
                .filter(|s| !s.is_empty())
                .ok_or(StageError::MissingSignature(signer.address))?;
            let msg = tx_sign_bytes(tx, &ctx.env.chain_id, signer.account_number, signer.sequence)?;
            self.verify_one(signer, &msg, sig)?;
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ante::context::{BlockEnv, ExecMode},
        auth::keeper::{Account, KeeperError},
        security::verifier::DefaultVerifier,
        types::{Address, AuthInfo, Fee, Msg, SignerInfo, TxBody},
    };
    use ring::{
        rand::SystemRandom,
        signature::{Ed25519KeyPair, KeyPair},
    };

    struct OneAccount(Account);

    impl AccountKeeper for OneAccount {
        fn account(&self, addr: &Address) -> Result<Option<Account>, KeeperError> {
            Ok((addr == &self.0.address).then(|| self.0.clone()))
        }
        fn params(&self) -> Result<Params, KeeperError> {
            Ok(Params::default())
        }
    }

    fn setup() -> (Ed25519KeyPair, PubKey, Tx, AnteContext) {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let pk = PubKey::Ed25519(kp.public_key().as_ref().to_vec());
        let tx = Tx {
            body: TxBody {
                messages: vec![Msg { type_url: "/x".into(), signers: vec![pk.address()], value: vec![] }],
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: vec![SignerInfo { public_key: Some(pk.clone()), sequence: 4 }],
                fee: Fee { amount: 0, gas_limit: 10_000 },
            },
            signatures: vec![],
        };
        let mut ctx = AnteContext::new(ExecMode::Finalize, BlockEnv::new("chain-x", 9), 0);
        ctx.signers.push(SignerMeta {
            address: pk.address(),
            pub_key: pk.clone(),
            account_number: 12,
            sequence: 4,
            placeholder_key: false,
        });
        (kp, pk, tx, ctx)
    }

    fn stage(pk: &PubKey) -> SigVerify<OneAccount, DefaultVerifier> {
        let acc = Account { address: pk.address(), pub_key: Some(pk.clone()), account_number: 12, sequence: 4 };
        SigVerify::new(Arc::new(OneAccount(acc)), Arc::new(DefaultVerifier::new()))
    }

    #[test]
    fn valid_signature_passes_and_charges_gas() {
        let (kp, pk, mut tx, ctx) = setup();
        let msg = tx_sign_bytes(&tx, "chain-x", 12, 4).unwrap();
        tx.signatures = vec![Signature(kp.sign(&msg).as_ref().to_vec())];

        let out = stage(&pk).handle(ctx, &tx, false).unwrap();
        assert_eq!(out.gas_meter.consumed(), 590);
    }

    #[test]
    fn signature_for_other_chain_is_rejected() {
        let (kp, pk, mut tx, ctx) = setup();
        let msg = tx_sign_bytes(&tx, "chain-y", 12, 4).unwrap();
        tx.signatures = vec![Signature(kp.sign(&msg).as_ref().to_vec())];
        assert!(matches!(stage(&pk).handle(ctx, &tx, false), Err(StageError::Unauthorized(_))));
    }

    #[test]
    fn stale_sequence_is_rejected() {
        let (_kp, pk, mut tx, ctx) = setup();
        tx.auth_info.signer_infos[0].sequence = 3;
        tx.signatures = vec![Signature(vec![1u8; 64])];
        assert!(matches!(
            stage(&pk).handle(ctx, &tx, false),
            Err(StageError::WrongSequence { expected: 4, got: 3, .. })
        ));
    }

    #[test]
    fn multisig_needs_threshold_member_signatures() {
        let rng = SystemRandom::new();
        let pairs: Vec<Ed25519KeyPair> = (0..3)
            .map(|_| {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
                Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
            })
            .collect();
        let multi = PubKey::Multisig {
            threshold: 2,
            keys: pairs
                .iter()
                .map(|kp| SingleKey::Ed25519(kp.public_key().as_ref().to_vec()))
                .collect(),
        };
        let (_kp, _pk, mut tx, _ctx) = setup();
        tx.body.messages[0].signers = vec![multi.address()];
        tx.auth_info.signer_infos[0].public_key = Some(multi.clone());
        let msg = tx_sign_bytes(&tx, "chain-x", 12, 4).unwrap();

        let run = |members: Vec<Option<Signature>>| {
            let mut tx = tx.clone();
            let multi_sig = MultiSignature { signatures: members };
            tx.signatures = vec![Signature(crate::core::types::encode_canonical(&multi_sig).unwrap())];
            let mut ctx = AnteContext::new(ExecMode::Finalize, BlockEnv::new("chain-x", 9), 0);
            ctx.signers.push(SignerMeta {
                address: multi.address(),
                pub_key: multi.clone(),
                account_number: 12,
                sequence: 4,
                placeholder_key: false,
            });
            stage(&multi).handle(ctx, &tx, false)
        };
        let sign = |i: usize| Some(Signature(pairs[i].sign(&msg).as_ref().to_vec()));

        let out = run(vec![sign(0), None, sign(2)]).unwrap();
        assert_eq!(out.gas_meter.consumed(), 3 * 590);
        assert!(matches!(run(vec![sign(0), None, None]), Err(StageError::Unauthorized(_))));
    }

    #[test]
    fn simulation_charges_without_verifying() {
        let (_kp, pk, tx, ctx) = setup();
        let out = stage(&pk).handle(ctx, &tx, true).unwrap();
        assert_eq!(out.gas_meter.consumed(), 590);
    }
}
