//! Logging utilities for the Sheetbook application.
//!
//! Every crate logs through `tracing` macros; the binary installs the
//! subscriber once at startup.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber from a textual level ("debug", "warn", ...).
///
/// Unknown values fall back to INFO.
pub fn init_from_str(level: Option<&str>) {
    let level = level
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    init_with_level(level);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured; the given level is applied to the
/// `sheetbook*` crates on top of them.
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    for target in ["sheetbook_backend", "sheetbook_bookings", "sheetbook_sheets", "sheetbook_stripe", "sheetbook_config", "sheetbook_common"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    if let Ok(directive) = "tower_http=info".parse() {
        filter = filter.add_directive(directive);
    }

    // Use try_init to handle the case where a global default subscriber has already been set
    let result = tracing_subscriber::registry()
        .with(fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true))
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => tracing::error!("{}: {}", error_context, e),
    }
    result
}
