// (c) 2026 The unirpc developers

//! # 📖 Configuration management
//!
//! The session's tunables are gathered in [`Configuration`]. Values are obtained from
//! the following sources, highest priority first:
//!
//! 1. Environment variables, named for the field in upper case and prefixed `UNIRPC_`
//!    (for example `UNIRPC_MAX_REQUEST_SIZE=65536`)
//! 2. A configuration file in [TOML](https://toml.io/) format, if one was given
//! 3. Hard-wired defaults ([`Configuration::system_default()`])
//!
//! Each option may appear in multiple places, but only the highest priority value is used.
//!
//! ## Example
//!
//! ```text
//! # Refuse requests over 64k
//! max_request_size = 65536
//! # Don't tell clients why their calls failed
//! error_detail = false
//! time_format = "utc"
//! ```
//!
//! The layering is done by a [`Manager`], which can also extract other structures,
//! for applications that want to keep their own settings in the same file.

mod manager;
pub use manager::Manager;

mod structure;
pub use structure::Configuration;

/// Prefix for environment variables read by [`Manager::standard`]
pub const ENV_PREFIX: &str = "UNIRPC_";

/// Problems obtaining a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read, or did not make sense
    #[error(transparent)]
    Figment(Box<figment::Error>),
    /// The configuration was read but is not usable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}
