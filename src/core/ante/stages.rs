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

//! The standard stages, listed in pipeline order. [`standard_stages`] is the
//! only place that order is written down. Size gas is charged before any key
//! is resolved, so garbage signatures never get cryptographic work for free.

use crate::core::{
    ante::{
        context::{AnteContext, ExecMode, GasMeter, SignerMeta},
        pipeline::{AnteStage, StageError},
    },
    auth::keeper::AccountKeeper,
    types::{PubKey, Tx},
};
use std::sync::Arc;

/// Compressed secp256k1 key standing in for a missing key during simulation.
pub const SIM_SECP256K1_PUBKEY: [u8; 33] = [
    0x03, 0x5a, 0xd6, 0x81, 0x0a, 0x47, 0xf0, 0x73, 0x55, 0x3f, 0xf3, 0x0d, 0x2f, 0xcc, 0x7e,
    0x0d, 0x3b, 0x1c, 0x0b, 0x74, 0xb6, 0x1a, 0x1a, 0xaa, 0x25, 0x82, 0x34, 0x40, 0x37, 0x15,
    0x1e, 0x14, 0x3a,
];

/// Size of the signature assumed for an unsigned signer in simulation.
const SIM_SIGNATURE_LEN: u64 = 64;
/// Framing bytes added per simulated signature.
const SIM_SIGNATURE_OVERHEAD: u64 = 6;
/// Largest gas limit a tx may declare.
const MAX_GAS_WANTED: u64 = i64::MAX as u64;

fn sim_pubkey() -> PubKey {
    PubKey::Secp256k1(SIM_SECP256K1_PUBKEY.to_vec())
}

/// The seven standard stages, in order.
pub fn standard_stages<K: AccountKeeper + 'static>(keeper: Arc<K>) -> Vec<Box<dyn AnteStage>> {
    vec![
        Box::new(SetUpContext),
        Box::new(ValidateBasic),
        Box::new(TxTimeoutHeight),
        Box::new(ValidateMemo::new(keeper.clone())),
        Box::new(ConsumeTxSizeGas::new(keeper.clone())),
        Box::new(SetPubKey::new(keeper.clone())),
        Box::new(ValidateSigCount::new(keeper)),
    ]
}

/// Installs the gas meter and clears the signer accumulator.
pub struct SetUpContext;

impl AnteStage for SetUpContext {
    fn name(&self) -> &'static str {
        "setup_context"
    }

    fn handle(&self, mut ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError> {
        let gas = tx.auth_info.fee.gas_limit;
        ctx.gas_wanted = gas;
        // Genesis txs run before any fee market exists.
        ctx.gas_meter = if simulate || ctx.env.height == 0 {
            GasMeter::infinite()
        } else {
            GasMeter::with_limit(gas)
        };
        ctx.signers.clear();

        if ctx.env.max_block_gas > 0 && gas > ctx.env.max_block_gas as u64 {
            return Err(StageError::InvalidGasLimit {
                gas,
                max: ctx.env.max_block_gas as u64,
            });
        }
        Ok(ctx)
    }
}

/// Cheap structural checks. Skipped on re-check: the tx already passed them.
pub struct ValidateBasic;

impl AnteStage for ValidateBasic {
    fn name(&self) -> &'static str {
        "validate_basic"
    }

    fn handle(&self, ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError> {
        if ctx.mode == ExecMode::ReCheck {
            return Ok(ctx);
        }
        if tx.body.messages.is_empty() {
            return Err(StageError::NoMessages);
        }
        if let Some(index) = tx.body.messages.iter().position(|m| m.signers.is_empty()) {
            return Err(StageError::MessageWithoutSigners { index });
        }
        if tx.auth_info.fee.gas_limit > MAX_GAS_WANTED {
            return Err(StageError::InvalidGasLimit {
                gas: tx.auth_info.fee.gas_limit,
                max: MAX_GAS_WANTED,
            });
        }

        let signers = tx.signers();
        if tx.auth_info.signer_infos.len() != signers.len() {
            return Err(StageError::WrongSignerInfoCount {
                expected: signers.len(),
                got: tx.auth_info.signer_infos.len(),
            });
        }

        // Simulation estimates cost for txs that are not signed yet.
        if simulate {
            return Ok(ctx);
        }
        if tx.signatures.is_empty() {
            return Err(StageError::NoSignatures);
        }
        if tx.signatures.len() != signers.len() {
            return Err(StageError::WrongSignatureCount {
                expected: signers.len(),
                got: tx.signatures.len(),
            });
        }
        if let Some(i) = tx.signatures.iter().position(|s| s.is_empty()) {
            return Err(StageError::MissingSignature(signers[i]));
        }
        Ok(ctx)
    }
}

/// Rejects txs whose declared timeout height has passed.
pub struct TxTimeoutHeight;

impl AnteStage for TxTimeoutHeight {
    fn name(&self) -> &'static str {
        "tx_timeout_height"
    }

    fn handle(&self, ctx: AnteContext, tx: &Tx, _simulate: bool) -> Result<AnteContext, StageError> {
        let timeout = tx.body.timeout_height;
        if timeout > 0 && ctx.env.height > timeout {
            return Err(StageError::TxTimeoutHeight {
                timeout,
                height: ctx.env.height,
            });
        }
        Ok(ctx)
    }
}

/// Bounds the memo's UTF-8 byte length by the module's `max_memo_characters`.
pub struct ValidateMemo<K> {
    keeper: Arc<K>,
}

impl<K> ValidateMemo<K> {
    pub fn new(keeper: Arc<K>) -> Self {
        Self { keeper }
    }
}

impl<K: AccountKeeper> AnteStage for ValidateMemo<K> {
    fn name(&self) -> &'static str {
        "validate_memo"
    }

    fn handle(&self, ctx: AnteContext, tx: &Tx, _simulate: bool) -> Result<AnteContext, StageError> {
        let params = self.keeper.params()?;
        let got = tx.body.memo.len() as u64;
        if got > params.max_memo_characters {
            return Err(StageError::MemoTooLarge {
                max: params.max_memo_characters,
                got,
            });
        }
        Ok(ctx)
    }
}

/// Charges `tx_size_cost_per_byte` for every encoded byte. In simulation, also
/// charges for the signatures the tx will carry once signed.
pub struct ConsumeTxSizeGas<K> {
    keeper: Arc<K>,
}

impl<K> ConsumeTxSizeGas<K> {
    pub fn new(keeper: Arc<K>) -> Self {
        Self { keeper }
    }
}

impl<K: AccountKeeper> AnteStage for ConsumeTxSizeGas<K> {
    fn name(&self) -> &'static str {
        "consume_tx_size_gas"
    }

    fn handle(&self, mut ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError> {
        let params = self.keeper.params()?;
        let size_cost = params
            .tx_size_cost_per_byte
            .checked_mul(ctx.tx_size as u64)
            .ok_or(StageError::GasOverflow { descriptor: "txSize" })?;
        ctx.gas_meter.consume(size_cost, "txSize")?;

        if !simulate {
            return Ok(ctx);
        }
        for (i, signer) in tx.signers().iter().enumerate() {
            let signed = tx.signatures.get(i).map(|s| !s.is_empty()).unwrap_or(false);
            if signed {
                continue;
            }
            let declared = tx
                .auth_info
                .signer_infos
                .get(i)
                .and_then(|si| si.public_key.clone());
            let pub_key = match declared {
                Some(pk) => pk,
                None => self
                    .keeper
                    .account(signer)?
                    .and_then(|a| a.pub_key)
                    .unwrap_or_else(sim_pubkey),
            };

            let mut cost = SIM_SIGNATURE_LEN + pub_key.encoded_len() as u64 + SIM_SIGNATURE_OVERHEAD;
            if matches!(pub_key, PubKey::Multisig { .. }) {
                cost = cost.saturating_mul(params.tx_sig_limit);
            }
            let gas = params
                .tx_size_cost_per_byte
                .checked_mul(cost)
                .ok_or(StageError::GasOverflow { descriptor: "txSize" })?;
            ctx.gas_meter.consume(gas, "txSize")?;
        }
        Ok(ctx)
    }
}

/// Resolves each signer's key and caches it, with account number and sequence,
/// in the context.
pub struct SetPubKey<K> {
    keeper: Arc<K>,
}

impl<K> SetPubKey<K> {
    pub fn new(keeper: Arc<K>) -> Self {
        Self { keeper }
    }
}

impl<K: AccountKeeper> AnteStage for SetPubKey<K> {
    fn name(&self) -> &'static str {
        "set_pubkey"
    }

    fn handle(&self, mut ctx: AnteContext, tx: &Tx, simulate: bool) -> Result<AnteContext, StageError> {
        for (i, address) in tx.signers().into_iter().enumerate() {
            let account = self
                .keeper
                .account(&address)?
                .ok_or(StageError::UnknownAddress(address))?;

            let declared = tx
                .auth_info
                .signer_infos
                .get(i)
                .and_then(|si| si.public_key.clone());
            if let Some(pk) = &declared {
                pk.validate()
                    .map_err(|e| StageError::InvalidPubKey(e.to_string()))?;
                if !simulate && pk.address() != address {
                    return Err(StageError::InvalidPubKey(format!(
                        "pubkey does not match signer address {address}"
                    )));
                }
            }

            let (pub_key, placeholder_key) = match account.pub_key.clone().or(declared) {
                Some(pk) => (pk, false),
                None if simulate => (sim_pubkey(), true),
                None => {
                    return Err(StageError::InvalidPubKey(format!(
                        "no pubkey on record or in tx for {address}"
                    )))
                }
            };

            ctx.signers.push(SignerMeta {
                address,
                pub_key,
                account_number: account.account_number,
                sequence: account.sequence,
                placeholder_key,
            });
        }
        Ok(ctx)
    }
}

/// Caps the number of signatures, counting every multisig member.
pub struct ValidateSigCount<K> {
    keeper: Arc<K>,
}

impl<K> ValidateSigCount<K> {
    pub fn new(keeper: Arc<K>) -> Self {
        Self { keeper }
    }
}

impl<K: AccountKeeper> AnteStage for ValidateSigCount<K> {
    fn name(&self) -> &'static str {
        "validate_sig_count"
    }

    fn handle(&self, ctx: AnteContext, _tx: &Tx, _simulate: bool) -> Result<AnteContext, StageError> {
        let params = self.keeper.params()?;
        let got: u64 = ctx
            .signers
            .iter()
            .map(|s| s.pub_key.signature_count() as u64)
            .sum();
        if got > params.tx_sig_limit {
            return Err(StageError::TooManySignatures {
                limit: params.tx_sig_limit,
                got,
            });
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ante::context::BlockEnv,
        auth::{keeper::{Account, KeeperError}, params::Params},
        types::{Address, AuthInfo, Fee, Msg, Signature, SignerInfo, SingleKey, TxBody},
    };
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemKeeper {
        accounts: BTreeMap<Address, Account>,
        params: Params,
    }

    impl AccountKeeper for MemKeeper {
        fn account(&self, addr: &Address) -> Result<Option<Account>, KeeperError> {
            Ok(self.accounts.get(addr).cloned())
        }
        fn params(&self) -> Result<Params, KeeperError> {
            Ok(self.params.clone())
        }
    }

    fn key(n: u8) -> PubKey {
        PubKey::Ed25519(vec![n; 32])
    }

    fn keeper_with(keys: &[PubKey], store_keys: bool) -> Arc<MemKeeper> {
        let mut k = MemKeeper::default();
        for (i, pk) in keys.iter().enumerate() {
            let address = pk.address();
            k.accounts.insert(
                address,
                Account {
                    address,
                    pub_key: if store_keys { Some(pk.clone()) } else { None },
                    account_number: i as u64,
                    sequence: 3,
                },
            );
        }
        Arc::new(k)
    }

    fn tx_for(keys: &[PubKey], signed: bool) -> Tx {
        Tx {
            body: TxBody {
                messages: vec![Msg {
                    type_url: "/bank.Send".into(),
                    signers: keys.iter().map(PubKey::address).collect(),
                    value: vec![1, 2, 3],
                }],
                memo: "hi".into(),
                timeout_height: 0,
            },
            auth_info: AuthInfo {
                signer_infos: keys
                    .iter()
                    .map(|k| SignerInfo { public_key: Some(k.clone()), sequence: 3 })
                    .collect(),
                fee: Fee { amount: 10, gas_limit: 200_000 },
            },
            signatures: if signed {
                keys.iter().map(|_| Signature(vec![7u8; 64])).collect()
            } else {
                Vec::new()
            },
        }
    }

    fn run_all(keeper: Arc<MemKeeper>, tx: &Tx, mode: ExecMode, height: u64) -> Result<AnteContext, StageError> {
        let mut ctx = AnteContext::new(mode, BlockEnv::new("test-1", height), 300);
        for s in standard_stages(keeper) {
            ctx = s.handle(ctx, tx, mode.is_simulate())?;
        }
        Ok(ctx)
    }

    #[test]
    fn order_is_fixed() {
        let names: Vec<_> = standard_stages(Arc::new(MemKeeper::default()))
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "setup_context",
                "validate_basic",
                "tx_timeout_height",
                "validate_memo",
                "consume_tx_size_gas",
                "set_pubkey",
                "validate_sig_count",
            ]
        );
    }

    #[test]
    fn signed_tx_passes_and_caches_signers() {
        let keys = [key(1), key(2)];
        let ctx = run_all(keeper_with(&keys, false), &tx_for(&keys, true), ExecMode::Check, 10).unwrap();
        assert_eq!(ctx.signers.len(), 2);
        assert_eq!(ctx.signers[1].account_number, 1);
        assert_eq!(ctx.gas_meter.consumed(), 3000);
        assert_eq!(ctx.gas_meter.limit(), Some(200_000));
    }

    #[test]
    fn block_max_gas_caps_declared_gas() {
        let keys = [key(1)];
        let tx = tx_for(&keys, true);
        let mut ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("test-1", 5), 10);
        ctx.env.max_block_gas = 100_000;
        assert!(matches!(
            SetUpContext.handle(ctx, &tx, false),
            Err(StageError::InvalidGasLimit { gas: 200_000, max: 100_000 })
        ));
    }

    #[test]
    fn recheck_skips_basic_validation() {
        let tx = Tx::default();
        let ctx = AnteContext::new(ExecMode::ReCheck, BlockEnv::new("t", 1), 0);
        assert!(ValidateBasic.handle(ctx.clone(), &tx, false).is_ok());
        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("t", 1), 0);
        assert!(matches!(ValidateBasic.handle(ctx, &tx, false), Err(StageError::NoMessages)));
    }

    #[test]
    fn memo_over_limit_is_rejected() {
        let keys = [key(1)];
        let mut tx = tx_for(&keys, true);
        tx.body.memo = "x".repeat(257);
        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("t", 1), 0);
        let stage = ValidateMemo::new(keeper_with(&keys, false));
        assert!(matches!(
            stage.handle(ctx, &tx, false),
            Err(StageError::MemoTooLarge { max: 256, got: 257 })
        ));
    }

    #[test]
    fn memo_limit_counts_bytes_not_chars() {
        let keys = [key(1)];
        let stage = ValidateMemo::new(keeper_with(&keys, false));
        let mut tx = tx_for(&keys, true);

        tx.body.memo = "\u{1F600}".repeat(64);
        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("t", 1), 0);
        assert!(stage.handle(ctx, &tx, false).is_ok());

        tx.body.memo = "\u{1F600}".repeat(65);
        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("t", 1), 0);
        assert!(matches!(
            stage.handle(ctx, &tx, false),
            Err(StageError::MemoTooLarge { max: 256, got: 260 })
        ));
    }

    #[test]
    fn size_gas_runs_out_before_key_resolution() {
        let keys = [key(1)];
        let mut tx = tx_for(&keys, true);
        tx.auth_info.fee.gas_limit = 100;
        // unknown signer: would fail in set_pubkey, but size gas fails first
        let err = run_all(Arc::new(MemKeeper::default()), &tx, ExecMode::Check, 4).unwrap_err();
        assert!(matches!(err, StageError::OutOfGas { descriptor: "txSize", .. }));
    }

    #[test]
    fn mismatched_pubkey_is_rejected_outside_simulation() {
        let keys = [key(1)];
        let mut tx = tx_for(&keys, true);
        tx.auth_info.signer_infos[0].public_key = Some(key(9));
        let err = run_all(keeper_with(&keys, false), &tx, ExecMode::Check, 4).unwrap_err();
        assert!(matches!(err, StageError::InvalidPubKey(_)));
    }

    #[test]
    fn simulation_uses_placeholder_and_charges_signature_bytes() {
        let keys = [key(1)];
        let mut tx = tx_for(&keys, false);
        tx.auth_info.signer_infos[0].public_key = None;
        let ctx = run_all(keeper_with(&keys, false), &tx, ExecMode::Simulate, 4).unwrap();
        assert!(ctx.signers[0].placeholder_key);
        // 300 bytes + (64 + 33 + 6) bytes of simulated signature, 10 gas each
        assert_eq!(ctx.gas_meter.consumed(), 3000 + 1030);
        assert_eq!(ctx.gas_meter.limit(), None);
    }

    #[test]
    fn multisig_members_count_against_the_limit() {
        let members: Vec<SingleKey> = (1..=8).map(|n| SingleKey::Ed25519(vec![n; 32])).collect();
        let multi = PubKey::Multisig { threshold: 2, keys: members };
        let keys = [multi];
        let err = run_all(keeper_with(&keys, true), &tx_for(&keys, true), ExecMode::Check, 4).unwrap_err();
        assert!(matches!(err, StageError::TooManySignatures { limit: 7, got: 8 }));
    }
}
