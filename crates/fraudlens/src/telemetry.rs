//! Process-wide log output for binaries and tests embedding the crate.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global subscriber, reading `RUST_LOG` and falling back to
/// `default_filter` (e.g. `"info"` or `"fraudlens=debug"`).
///
/// `log` records are forwarded into the same subscriber. Returns false when a
/// subscriber was already installed, so repeated calls are harmless.
pub fn init_logging(default_filter: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_log::LogTracer::init() {
        log::debug!("log bridge already installed: {}", e);
    }

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
        }
        LogFormat::Json => tracing::subscriber::set_global_default(registry.with(fmt::layer().json())),
    };

    match installed {
        Ok(()) => {
            tracing::info!("Logging initialized ({:?})", format);
            true
        }
        Err(_) => false,
    }
}
