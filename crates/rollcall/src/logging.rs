//! Logging setup for rollcall.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber once at startup through [`init_logging`].

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a verbosity.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Convert verbosity to a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("rollcall={}", self.to_level_filter())
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG`, when set, takes precedence over `verbosity`. Logs go to
/// stderr so command output on stdout stays machine-readable.
///
/// # Examples
///
/// ```no_run
/// use rollcall::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity != Verbosity::Normal)
            .with_file(false)
            .with_line_number(false),
    );

    // A subscriber may already be installed (tests, embedding).
    let _ = subscriber.try_init();
}

/// Initialize logging for tests at warn level.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 4), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(Verbosity::Normal.default_directive(), "rollcall=INFO");
        assert_eq!(Verbosity::Verbose.default_directive(), "rollcall=DEBUG");
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_test_logging();
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
