//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE_NAME: &str = "inkpost";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store for dev/test. Data is lost on shutdown.
    Memory,
    MongoDb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            other => Err(format!("unknown storage backend '{other}' (expected memory or mongodb)")),
        }
    }
}

/// Runtime settings for the HTTP server and its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: String,
    pub database_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageBackend::MongoDb,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Settings for tests: in-memory store on an ephemeral loopback port.
    pub fn in_memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            storage: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Read `HOST`, `PORT`, `STORAGE_BACKEND`, `DATABASE_URL` and
    /// `DATABASE_NAME` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Settings::from_env`], but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let storage = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>().map_err(|reason| ConfigError::Invalid {
                var: "STORAGE_BACKEND",
                value: raw.clone(),
                reason,
            })?,
            None => defaults.storage,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            storage,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            database_name: lookup("DATABASE_NAME").unwrap_or(defaults.database_name),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "HOST",
            value: self.host.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_addr().unwrap().port(), DEFAULT_PORT);
    }

    #[test]
    fn reads_all_variables() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("STORAGE_BACKEND", "memory"),
            ("DATABASE_URL", "mongodb://db:27017"),
            ("DATABASE_NAME", "blog-test"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert_eq!(settings.database_url, "mongodb://db:27017");
        assert_eq!(settings.database_name, "blog-test");
        assert_eq!(settings.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn rejects_bad_port() {
        let err = Settings::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = Settings::from_lookup(lookup_from(&[("STORAGE_BACKEND", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STORAGE_BACKEND", .. }));
    }
}
