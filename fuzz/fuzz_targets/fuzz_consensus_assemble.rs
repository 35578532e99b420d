#![no_main]
use amunchain_modkit::core::consensus::{
    assemble, AbciParams, BlockParams, ConsensusMsgParams, EvidenceParams, StaticVersionSource,
    ValidatorParams, VersionParams,
};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    block: Option<(i64, i64)>,
    evidence: Option<(i64, u64, i64)>,
    validator: Option<Vec<String>>,
    version: Option<u64>,
    abci: Option<i64>,
    base_app: u64,
}

fuzz_target!(|input: Input| {
    let complete = input.block.is_some()
        && input.evidence.is_some()
        && input.validator.is_some()
        && input.version.is_some();
    let candidate = ConsensusMsgParams {
        block: input.block.map(|(max_bytes, max_gas)| BlockParams { max_bytes, max_gas }),
        evidence: input.evidence.map(|(a, d, b)| EvidenceParams {
            max_age_num_blocks: a,
            max_age_duration_ms: d,
            max_bytes: b,
        }),
        validator: input.validator.map(|pub_key_types| ValidatorParams { pub_key_types }),
        version: input.version.map(|app| VersionParams { app }),
        abci: input.abci.map(|h| AbciParams { vote_extensions_enable_height: h }),
    };
    let res = assemble(&candidate, &StaticVersionSource(VersionParams { app: input.base_app }));
    assert_eq!(res.is_ok(), complete);
    if let Ok(cp) = res {
        assert_eq!(cp.feature.is_some(), input.abci.is_some());
        let _ = cp.validate_basic();
    }
});
