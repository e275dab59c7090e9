//! Diagnostic logging
//!
//! User-facing messages go through [`crate::cli::Output`]; this is the
//! `tracing` side, always written to stderr so stdout stays parseable in
//! `--format json` mode.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used with `--verbose` when `RUST_LOG` is unset
pub const VERBOSE_FILTER: &str = "plugin_pave=debug";

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Picks the filter directive: `RUST_LOG` wins over the verbose flag
pub fn filter_directive(rust_log: Option<String>, verbose: bool) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => VERBOSE_FILTER.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the global subscriber
///
/// Calling it twice is harmless; the second subscriber is discarded.
pub fn init(verbose: bool) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
