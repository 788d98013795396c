use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::models::JlptLevel;

const DEFAULT_DATABASE_URL: &str = "sqlite://nihongo.db?mode=rwc";
const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub log_level: String,
    pub batch_size: usize,
    pub level: JlptLevel,
    pub vocabulary_file: Option<PathBuf>,
    pub particle_file: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Read settings from the process environment. Call `dotenvy::dotenv()`
    /// first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = var("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = var("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let log_level = var("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let batch_size = var("BATCH_SIZE")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|&size| size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let level = var("JLPT_LEVEL")
            .and_then(|value| value.parse::<JlptLevel>().ok())
            .unwrap_or(JlptLevel::N5);

        let path = |name: &str| var(name).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        Self {
            host,
            port,
            database_url,
            log_level,
            batch_size,
            level,
            vocabulary_file: path("VOCABULARY_FILE"),
            particle_file: path("PARTICLE_FILE"),
            static_dir: path("STATIC_DIR"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.level, JlptLevel::N5);
        assert!(config.vocabulary_file.is_none());
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("BATCH_SIZE", "5"),
            ("JLPT_LEVEL", "n4"),
            ("PARTICLE_FILE", "particles.json"),
        ]);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.level, JlptLevel::N4);
        assert_eq!(config.particle_file, Some(PathBuf::from("particles.json")));
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = config(&[
            ("PORT", "eighty"),
            ("BATCH_SIZE", "0"),
            ("JLPT_LEVEL", "N9"),
            ("VOCABULARY_FILE", "  "),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.level, JlptLevel::N5);
        assert!(config.vocabulary_file.is_none());
    }
}
