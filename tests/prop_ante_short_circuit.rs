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

use amunchain_modkit::core::{
    ante::{AnteContext, AntePipeline, AnteStage, BlockEnv, ExecMode, StageError},
    module::AuthModule,
    state::persistent_state::PersistentState,
    types::{AuthInfo, Fee, Msg, PubKey, Signature, SignerInfo, Tx, TxBody},
};
use proptest::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

const NAMES: [&str; 8] = ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"];

struct Probe {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl AnteStage for Probe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, mut ctx: AnteContext, _tx: &Tx, _simulate: bool) -> Result<AnteContext, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StageError::NoSignatures);
        }
        ctx.gas_meter.consume(1, "probe")?;
        Ok(ctx)
    }
}

proptest! {
    #[test]
    fn prop_no_stage_runs_after_rejection(len in 1usize..8, fail_at in proptest::option::of(0usize..8)) {
        let calls: Vec<Arc<AtomicUsize>> = (0..len).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let stages: Vec<Box<dyn AnteStage>> = (0..len)
            .map(|i| Box::new(Probe { name: NAMES[i], calls: calls[i].clone(), fail: fail_at == Some(i) }) as Box<dyn AnteStage>)
            .collect();
        let pipeline = AntePipeline::new(stages);

        let ctx = AnteContext::new(ExecMode::Check, BlockEnv::new("prop", 1), 0);
        let res = pipeline.execute(ctx, &Tx::default(), false);

        match fail_at.filter(|k| *k < len) {
            Some(k) => {
                let err = res.unwrap_err();
                prop_assert_eq!(err.stage, NAMES[k]);
                for (i, c) in calls.iter().enumerate() {
                    prop_assert_eq!(c.load(Ordering::SeqCst), usize::from(i <= k));
                }
            }
            None => {
                let out = res.unwrap();
                prop_assert_eq!(out.gas_meter.consumed(), len as u64);
                for c in &calls {
                    prop_assert_eq!(c.load(Ordering::SeqCst), 1);
                }
            }
        }
    }
}

fn memo_tx(pk: &PubKey, memo: String) -> Tx {
    Tx {
        body: TxBody {
            messages: vec![Msg { type_url: "/bank.Send".into(), signers: vec![pk.address()], value: vec![0; 8] }],
            memo,
            timeout_height: 0,
        },
        auth_info: AuthInfo {
            signer_infos: vec![SignerInfo { public_key: Some(pk.clone()), sequence: 0 }],
            fee: Fee { amount: 1, gas_limit: 1_000_000 },
        },
        signatures: vec![Signature(vec![1u8; 64])],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_memo_limit_decides_at_memo_stage(len in 0usize..400) {
        let dir = tempfile::tempdir().unwrap();
        let st = PersistentState::open(dir.path().to_str().unwrap()).unwrap();
        let module = AuthModule::builder(st).build().unwrap();
        let pk = PubKey::Ed25519(vec![3u8; 32]);
        module.keeper().create_account(pk.address(), Some(pk.clone())).unwrap();

        let res = module.validate_tx(&BlockEnv::new("prop", 5), &memo_tx(&pk, "m".repeat(len)), ExecMode::Check);
        if len <= 256 {
            prop_assert!(res.is_ok());
        } else {
            let err = res.unwrap_err();
            prop_assert_eq!(err.stage, "validate_memo");
        }
    }
}
