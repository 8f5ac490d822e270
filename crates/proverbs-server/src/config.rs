use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_VERSION: &str = "New International Version - 1984";

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub default_version: String,
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("PROVERBS_PORT", "3000");
        let cleanup = var("PROVERBS_CLEANUP_INTERVAL_SECS", "3600");

        Ok(Self {
            jwt_secret: var("PROVERBS_JWT_SECRET", "dev-secret-change-me"),
            db_path: PathBuf::from(var("PROVERBS_DB_PATH", "proverbs.db")),
            host: var("PROVERBS_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("PROVERBS_PORT is not a port: {}", port))?,
            default_version: var("PROVERBS_DEFAULT_VERSION", DEFAULT_VERSION),
            cleanup_interval_secs: cleanup.parse().with_context(|| {
                format!("PROVERBS_CLEANUP_INTERVAL_SECS is not a number: {}", cleanup)
            })?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("invalid listen address {}", addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("proverbs.db"));
        assert_eq!(cfg.default_version, DEFAULT_VERSION);
        assert_eq!(cfg.cleanup_interval_secs, 3600);
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PROVERBS_PORT", "8080"),
            ("PROVERBS_HOST", "127.0.0.1"),
            ("PROVERBS_DEFAULT_VERSION", "King James Version"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.default_version, "King James Version");
    }

    #[test]
    fn bad_numbers_fail() {
        assert!(config(&[("PROVERBS_PORT", "http")]).is_err());
        assert!(config(&[("PROVERBS_CLEANUP_INTERVAL_SECS", "-5")]).is_err());
    }
}
