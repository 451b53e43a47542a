//! Logging setup for condoguard.
//!
//! Library code logs through the `tracing` macros only. Installing a
//! subscriber is up to the application; [`init`] does it from environment
//! variables when the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `CONDOGUARD_DEBUG=true|1|yes` - Enable debug logging
//! - `CONDOGUARD_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `CONDOGUARD_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use condoguard_query::logging;
//!
//! // Once, at startup.
//! logging::init();
//! ```
//!
//! What gets logged:
//!
//! - `debug`: tenant resolution outcome, each executed operation
//! - `trace`: rendered SQL, cache hits
//! - `warn`: tenant-scoped rows with no tenant seen under an active tenant
//!
//! Attempted subdomains appear only at `debug`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "CONDOGUARD_DEBUG";
const LEVEL_VAR: &str = "CONDOGUARD_LOG_LEVEL";
const FORMAT_VAR: &str = "CONDOGUARD_LOG_FORMAT";

/// Check if debug logging is enabled via `CONDOGUARD_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).is_ok_and(|v| is_truthy(&v))
}

/// The configured log level. Defaults to `debug` when `CONDOGUARD_DEBUG` is
/// set, otherwise `warn`.
pub fn get_log_level() -> &'static str {
    resolve_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// The configured log format. Defaults to `json`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var(FORMAT_VAR).ok().as_deref())
}

/// Initialize logging from the environment.
///
/// Does nothing unless `CONDOGUARD_DEBUG` or `CONDOGUARD_LOG_LEVEL` is set.
/// Subsequent calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    install(get_log_level(), get_log_format());
}

/// Initialize logging at `level`, ignoring `CONDOGUARD_LOG_LEVEL`.
pub fn init_with_level(level: &str) {
    install(resolve_level(Some(level), false), get_log_format());
}

/// Initialize debug-level logging.
pub fn init_debug() {
    install("debug", get_log_format());
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match requested.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str, format: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "condoguard={level},condoguard_query={level},condoguard_axum={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format, "condoguard logging initialized");
            }
        }
    });
}
