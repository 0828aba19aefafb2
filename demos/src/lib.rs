//! Shared helpers for the `dl4ds-burn` command-line demos.

pub mod backend;

pub use backend::{create_device, get_backend_name, SelectedBackend, SelectedDevice};

/// Installs a formatting subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
