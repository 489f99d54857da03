//! Configuration source wrangling
// (c) 2026 The unirpc developers

use std::path::Path;

use figment::{
    Figment, Provider,
    providers::{Env, Format as _, Toml},
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ConfigError, Configuration, ENV_PREFIX};

/// Processes and merges all possible configuration sources.
#[derive(Debug, Default)]
pub struct Manager {
    /// Configuration data
    data: Figment,
}

impl Manager {
    /// Constructor for an empty manager.
    ///
    /// Nothing is applied, not even the system defaults; use the `merge_` and `apply_` methods to add sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// General constructor for production use
    ///
    /// Applies the system defaults, then `config_file` (if given), then the environment.
    #[must_use]
    pub fn standard(config_file: Option<&Path>) -> Self {
        let mut new1 = Self::new();
        new1.apply_system_default();
        if let Some(path) = config_file {
            new1.merge_toml_file(path);
        }
        new1.merge_env();
        new1
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Merges in a TOML file. A file that does not exist is skipped with a warning.
    pub fn merge_toml_file<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();
        if !path.exists() {
            warn!("configuration file {path:?} not present");
            return;
        }
        debug!("reading configuration from {path:?}");
        self.merge_provider(Toml::file(path));
    }

    /// Merges in environment variables starting with [`ENV_PREFIX`]
    pub fn merge_env(&mut self) {
        self.merge_provider(Env::prefixed(ENV_PREFIX));
    }

    /// Applies the system default settings, at a lower priority than everything else
    pub fn apply_system_default(&mut self) {
        let f = std::mem::take(&mut self.data);
        self.data = f.join(*Configuration::system_default());
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// `T` is usually [Configuration], but it isn't intrinsically required to be.
    pub fn get<'de, T>(&self) -> Result<T, ConfigError>
    where
        T: Deserialize<'de>,
    {
        self.data.extract_lossy::<T>().map_err(ConfigError::from)
    }

    /// Extracts and validates the [Configuration]
    pub fn configuration(&self) -> Result<Configuration, ConfigError> {
        let cfg = self.get::<Configuration>()?;
        cfg.validate()?;
        Ok(cfg)
    }
}
