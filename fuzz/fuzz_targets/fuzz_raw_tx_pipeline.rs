#![no_main]
use amunchain_modkit::core::{
    ante::{BlockEnv, ExecMode},
    module::AuthModule,
    state::persistent_state::PersistentState,
};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

struct Harness {
    _dir: tempfile::TempDir,
    module: AuthModule,
}

fn harness() -> Option<&'static Harness> {
    static H: OnceLock<Option<Harness>> = OnceLock::new();
    H.get_or_init(|| {
        let dir = tempfile::tempdir().ok()?;
        let st = PersistentState::open(dir.path().to_str()?).ok()?;
        let module = AuthModule::builder(st).max_tx_bytes(64 * 1024).build().ok()?;
        Some(Harness { _dir: dir, module })
    })
    .as_ref()
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected with an error, never a panic.
    let Some(h) = harness() else { return };
    let env = BlockEnv::new("fuzz", 1);
    for mode in [ExecMode::Check, ExecMode::Simulate] {
        let _ = h.module.validate_raw(&env, data, mode);
    }
});
