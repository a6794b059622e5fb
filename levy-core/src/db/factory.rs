//! Opening the storage backend named in the `[database]` section of
//! `levy.toml`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::repository::{LevyRepository, RepositoryError};

pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_CONNECTION_STRING: &str = "levy.db";

/// Where calculations, requests and rate sheets are stored.
///
/// Deserializes from the `[database]` table; missing keys fall back to a
/// `levy.db` SQLite file in the working directory.
///
/// | backend  | connection_string                            |
/// |----------|----------------------------------------------|
/// | `sqlite` | `levy.db`, `sqlite://levy.db`, `:memory:`    |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    /// Passed to the backend unchanged.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
        }
    }
}

impl DbConfig {
    /// Replaces the configured values with whichever command-line overrides
    /// were given.
    pub fn overridden(
        self,
        backend: Option<String>,
        connection_string: Option<String>,
    ) -> Self {
        Self {
            backend: backend.unwrap_or(self.backend),
            connection_string: connection_string.unwrap_or(self.connection_string),
        }
    }
}

/// Opens one kind of database. The repository it returns is migrated and
/// seeded, ready for the calculators.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Name used in `DbConfig::backend`, e.g. `"sqlite"`.
    fn backend_name(&self) -> &'static str;

    async fn create(&self, config: &DbConfig) -> Result<Box<dyn LevyRepository>, RepositoryError>;
}

/// The backends this build can open.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing a backend registered under the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Opens the repository `config` describes.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::Configuration`] if this build has no backend by
    ///   that name.
    /// * Whatever the backend returns when it cannot open or migrate the
    ///   database.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LevyRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            let known: Vec<&str> = self.factories.keys().copied().collect();
            return Err(RepositoryError::Configuration(format!(
                "unknown database backend '{}' (supported: {})",
                config.backend,
                known.join(", ")
            )));
        };

        debug!(
            backend = %config.backend,
            connection_string = %config.connection_string,
            "opening repository"
        );
        let repo = factory.create(config).await?;
        info!(backend = %config.backend, "repository ready");
        Ok(repo)
    }
}
