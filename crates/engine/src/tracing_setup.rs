//! Minimal ambient logging setup, grounded on `crates/core/src/startup.rs`'s
//! `configure_tracing`: a layered `tracing_subscriber` registry driven by
//! `EnvFilter`, without the disk-rotation/flamegraph machinery the
//! teacher's server binary needs and this library crate doesn't.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber reading `RUST_LOG` (falling
/// back to `info`). Intended for binaries/tests embedding this crate;
/// library code here never installs a subscriber itself.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
