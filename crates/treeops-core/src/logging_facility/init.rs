//! Subscriber installation
//!
//! The core is usually embedded in a host process that may already have a
//! global subscriber, so installation never panics: the first `init` call
//! tries once and every later call is a no-op.

use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Environment variable read by [`Profile::from_env`]
pub const PROFILE_ENV: &str = "TREEOPS_LOG_PROFILE";

/// Output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Human-readable lines, `treeops=debug`
    #[default]
    Development,
    /// JSON lines, `treeops=info`
    Production,
    /// Bare registry; tests install the capture layer themselves
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "treeops=debug",
            Profile::Production | Profile::Test => "treeops=info",
        }
    }

    /// Profile named by `TREEOPS_LOG_PROFILE`, or the default when unset or unknown
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown log profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// `RUST_LOG` overrides the profile's default filter.
///
/// ```
/// use treeops_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        if installed.is_ok() {
            tracing::debug!(?profile, "logging initialized");
        }
    });
}
