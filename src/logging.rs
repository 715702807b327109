//! Logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Events go to stderr so stdout stays machine-readable. `RUST_LOG` wins unless
/// `verbose` is set; otherwise only warnings are shown.
pub fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::registry().with(env_filter).with(layer).try_init();
}
