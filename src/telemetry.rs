//! `tracing` subscriber bootstrap.
//!
//! The library only emits events; hosts that have no subscriber of their own
//! can call [`init_tracing`] once at startup.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` (e.g. `"info"` or `"transect_viewer=debug"`).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Default filter for the current build mode.
#[must_use]
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // The first call may lose to another test in the same binary.
        let _ = init_tracing("warn");
        assert!(!init_tracing("warn"));
    }

    #[test]
    fn test_default_level_is_known() {
        assert!(matches!(default_log_level(), "debug" | "info"));
    }
}
