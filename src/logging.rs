//! Tracing subscriber bootstrap.
//!
//! Verbosity levels:
//! - 0: warnings and errors only
//! - 1: wave summaries and run totals
//! - 2: every resolved task and every ingested record
//! - 3: everything

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

pub const VERBOSITY_QUIET: u8 = 0;
pub const VERBOSITY_WAVES: u8 = 1;
pub const VERBOSITY_TASKS: u8 = 2;

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        VERBOSITY_QUIET => "warn",
        VERBOSITY_WAVES => "info",
        VERBOSITY_TASKS => "debug",
        _ => "trace",
    }
}

/// Install a stderr fmt subscriber. `RUST_LOG` takes precedence over
/// `verbosity`. Returns `false` when a global subscriber was already set.
pub fn init_logging(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_directives() {
        assert_eq!(default_directive(VERBOSITY_QUIET), "warn");
        assert_eq!(default_directive(VERBOSITY_WAVES), "info");
        assert_eq!(default_directive(VERBOSITY_TASKS), "debug");
        assert_eq!(default_directive(7), "trace");
    }

    #[test]
    fn second_init_is_a_no_op() {
        init_logging(VERBOSITY_QUIET);
        assert!(!init_logging(VERBOSITY_TASKS));
    }
}
