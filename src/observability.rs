//! Logging setup for the command-line tool.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Logs always go to stderr so reports on stdout stay clean.

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a filter directive that overrides `-v`/`-q`.
pub const LOG_ENV_VAR: &str = "LAYERMAP_LOG";

static INIT: Once = Once::new();

/// Filter directive for a verbosity count (`-v` repeats) and the quiet flag.
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "layermap=error";
    }
    match verbosity {
        0 => "layermap=warn",
        1 => "layermap=debug",
        _ => "layermap=trace",
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: u8, quiet: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

        let result = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity > 1),
            )
            .with(filter)
            .try_init();

        if let Err(e) = result {
            eprintln!("Note: logging already configured: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_levels() {
        assert_eq!(default_directive(0, false), "layermap=warn");
        assert_eq!(default_directive(1, false), "layermap=debug");
        assert_eq!(default_directive(3, false), "layermap=trace");
        assert_eq!(default_directive(2, true), "layermap=error");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(0, true);
        init_logging(2, false);
    }
}
