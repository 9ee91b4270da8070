use std::env;
use std::time::Duration;
use anyhow::{Context, Result, bail};

/// Which persistence collaborator backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Spanner,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "spanner" => Ok(StorageBackend::Spanner),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be one of: spanner, memory, got '{}'", other),
        }
    }
}

/// Spanner database coordinates, only present for the Spanner backend
#[derive(Debug, Clone)]
pub struct SpannerSettings {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerSettings {
    fn from_env() -> Result<Self> {
        let emulator_host = env::var("SPANNER_EMULATOR_HOST").ok();

        let project = env::var("SPANNER_PROJECT")
            .context("SPANNER_PROJECT environment variable is required")?;

        let instance = env::var("SPANNER_INSTANCE")
            .context("SPANNER_INSTANCE environment variable is required")?;

        let database = env::var("SPANNER_DATABASE")
            .context("SPANNER_DATABASE environment variable is required")?;

        Ok(SpannerSettings {
            emulator_host,
            project,
            instance,
            database,
        })
    }

    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub spanner: Option<SpannerSettings>,
    pub service_port: u16,
    pub service_host: String,
    pub db_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend = StorageBackend::parse(
            &env::var("STORAGE_BACKEND").unwrap_or_else(|_| "spanner".to_string()),
        )?;

        let spanner = match backend {
            StorageBackend::Spanner => Some(SpannerSettings::from_env()?),
            StorageBackend::Memory => None,
        };

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let db_timeout_ms = env::var("DB_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .context("DB_TIMEOUT_MS must be a whole number of milliseconds")?;
        if db_timeout_ms == 0 {
            bail!("DB_TIMEOUT_MS must be greater than zero");
        }

        Ok(Config {
            backend,
            spanner,
            service_port,
            service_host,
            db_timeout: Duration::from_millis(db_timeout_ms),
        })
    }

    /// Configuration for the in-process store with test-friendly values
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Config {
            backend: StorageBackend::Memory,
            spanner: None,
            service_port: 4000,
            service_host: "127.0.0.1".to_string(),
            db_timeout: Duration::from_secs(5),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Storage backend: {:?}", self.backend);
        if let Some(spanner) = &self.spanner {
            tracing::info!("  Spanner emulator: {}",
                spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
            tracing::info!("  Spanner database: {}", spanner.database_path());
        }
        tracing::info!("  Store call deadline: {:?}", self.db_timeout);
        tracing::info!("  Service listening on: {}", self.bind_address());
    }
}
