//! Structured logging with `tracing`.
//!
//! Two profiles, chosen by the `APP_ENV` environment value:
//!
//! - development: compact human-readable lines on stderr at `debug`
//! - production (default): JSON lines on stderr at `info`
//!
//! `RUST_LOG` overrides the level filter in both profiles.

use tracing_subscriber::EnvFilter;

/// Logging verbosity and format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogProfile {
    /// Verbose, human-readable.
    Development,
    /// Terse, machine-readable.
    #[default]
    Production,
}

impl LogProfile {
    /// Pick a profile from an `APP_ENV`-style value.
    ///
    /// Only `development` (any case) selects [`LogProfile::Development`].
    pub fn from_app_env(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("development") => Self::Development,
            _ => Self::Production,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn default_directive(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup. Later calls leave the first subscriber in place and
/// return `false`.
pub fn init_subscriber(profile: LogProfile) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match profile {
        LogProfile::Development => builder.compact().try_init().is_ok(),
        LogProfile::Production => builder
            .json()
            .with_current_span(true)
            .try_init()
            .is_ok(),
    }
}
