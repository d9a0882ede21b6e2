//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL holds filter directives, e.g. "debug" or
//!   "info,authoring=trace,levelcraft=debug".
//! - LOG_FORMAT=json switches to structured JSON lines; anything else is the
//!   human-readable format.
//!
//! Targets in use: `levelcraft` (service, store, sockets) and `authoring`
//! (stage validation, level building, wizard steps). tower-http's TraceLayer
//! adds the per-request spans.

use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
const DEFAULT_DIRECTIVES: &str = "info,authoring=debug,levelcraft=debug,tower_http=info,axum=info";

/// Filter from LOG_LEVEL, or the default directives when unset or invalid.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The json and pretty builders are different types, so init in each arm.
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
