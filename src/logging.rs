use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing with env-driven filtering (RUST_LOG).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,actix_server=warn"));

    fmt().with_env_filter(env_filter).with_target(false).init();
}
