//! Structured logging setup
//!
//! Log records go to stderr so that step listings on stdout stay parseable.
//! Level precedence: `--log-level`, `-v`/`-q`, `STEPGEN_LOG_LEVEL` or the
//! global config, then `RUST_LOG`, then `warn`.

use anyhow::{bail, Result};
use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "warn";

/// Pick the effective level, or `None` to defer to `RUST_LOG`
pub fn resolve_level(
    flag: Option<&str>,
    verbose: bool,
    quiet: bool,
    configured: Option<&str>,
) -> Result<Option<String>> {
    if let Some(level) = flag {
        return parse_level(level).map(|l| Some(l.to_string()));
    }
    if verbose {
        return Ok(Some("debug".to_string()));
    }
    if quiet {
        return Ok(Some("error".to_string()));
    }
    configured
        .map(|level| parse_level(level).map(str::to_string))
        .transpose()
}

/// Normalise a level name
pub fn parse_level(level: &str) -> Result<&'static str> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        other => bail!(
            "invalid log level '{}', expected one of trace, debug, info, warn, error",
            other
        ),
    })
}

/// Install the global subscriber
pub fn init(level: Option<&str>) {
    INIT.call_once(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init();
    });
}
