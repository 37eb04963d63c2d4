//! Run registered time-series models against `LATA` data files and post-process the
//! results with scripts.
//!
//! Linking this crate links the model catalog and the `series` script engine, so both are
//! available from the global registries.

pub mod cli;

pub use modelrun_core;
pub use modelrun_models;
pub use modelrun_script;

use tracing_subscriber::EnvFilter;

/// Default log filter, overridden by `RUST_LOG`
pub const DEFAULT_LOG_FILTER: &str =
    "modelrun=info,modelrun_core=info,modelrun_models=info,modelrun_script=info";

/// Initialise logging to stderr.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
