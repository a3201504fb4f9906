//! Stock cryopool worker binary.
//!
//! Serves the demo work function in [`cryopool_worker::stock`]. Embedding
//! applications ship their own binary built on [`cryopool_worker::serve`]
//! or [`cryopool_worker::serve_typed`] instead.

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // stdout is the result channel, so all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cryopool_worker::serve_typed(cryopool_worker::stock::work)
}
