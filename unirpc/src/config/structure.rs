//! Configuration structure
// (c) 2026 The unirpc developers

use std::sync::LazyLock;

use figment::{
    Profile, Provider,
    providers::Serialized,
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::util::TimeFormat;

/// The set of configurable options.
///
/// There is no `default()`: the hard-wired defaults are [`Configuration::system_default()`].
/// See the [module documentation](super) for how values are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Largest request payload the session will attempt to decode, in bytes.
    ///
    /// Larger requests fail with `resource_exhausted` without reaching the provider.
    pub max_request_size: u32,

    /// Whether `internal` statuses describe the error that caused them.
    ///
    /// If false, clients see a fixed "unknown error processing request" message instead.
    /// The detail is always logged.
    pub error_detail: bool,

    /// Number of worker threads for applications that build their own runtime
    /// (0 means the runtime's default)
    pub worker_threads: usize,

    /// Format of timestamps in log output
    pub time_format: TimeFormat,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    max_request_size: 4 * 1_048_576,
    error_detail: true,
    worker_threads: 0,
    time_format: TimeFormat::Local,
});

impl Configuration {
    /// Returns the system default settings
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// Performs additional validation checks on a configuration object
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_request_size == 0 {
            return Err(ConfigError::Invalid(
                "max_request_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// A configuration is itself a source of settings, at default priority.
/// [`Manager::apply_system_default`](super::Manager::apply_system_default) layers in
/// [`Configuration::system_default()`] this way.
impl Provider for Configuration {
    fn metadata(&self) -> figment::Metadata {
        figment::Metadata::named("built-in defaults")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
