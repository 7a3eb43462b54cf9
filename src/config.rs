use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub series_dir: PathBuf,
    pub target_format: String,
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            library: LibraryConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        LibraryConfig {
            series_dir: home.join("Videos").join("Series"),
            target_format: ".mp4".to_string(),
            video_extensions: [".mp4", ".mkv", ".avi", ".mov", ".wmv", ".m4v"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: config_dir().join("reelsync.db"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        // 30 minutes
        CacheConfig { ttl_seconds: 30 * 60 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// ~/.config/reelsync
pub fn config_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".config").join("reelsync"),
        None => PathBuf::from("."),
    }
}

/// Get the path to the config file (tries the working directory first, then ~/.config/reelsync/config.yaml)
pub fn get_config_path() -> PathBuf {
    let local_config = PathBuf::from("config.yaml");

    if local_config.exists() {
        return local_config;
    }

    let home_config = config_dir().join("config.yaml");
    if home_config.exists() {
        return home_config;
    }

    // Default to the working directory even if it doesn't exist
    local_config
}

impl Config {
    /// Load config from ./config.yaml or ~/.config/reelsync/config.yaml
    pub fn load() -> Result<Self> {
        let config_path = get_config_path();

        if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            Self::load_from_file(&config_path)
        } else {
            warn!("No config.yaml found, using defaults");
            Ok(Config::default())
        }
    }

    /// Load config from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if !config.library.target_format.starts_with('.') {
            config.library.target_format = format!(".{}", config.library.target_format);
        }

        debug!(
            "Config loaded: series_dir={}, ttl={}s",
            config.library.series_dir.display(),
            config.cache.ttl_seconds
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(1800));
        assert_eq!(config.library.target_format, ".mp4");
        assert_eq!(config.library.video_extensions.len(), 6);
        assert_eq!(config.server.port, 3000);
        assert!(config.database.path.ends_with("reelsync.db"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
library:
  series_dir: /media/series
  target_format: .mp4
  video_extensions: [".mp4", ".mkv"]
database:
  path: /tmp/reelsync.db
cache:
  ttl_seconds: 60
server:
  host: 0.0.0.0
  port: 8080
log_level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.library.series_dir, PathBuf::from("/media/series"));
        assert_eq!(config.library.video_extensions, vec![".mp4", ".mkv"]);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = "cache:\n  ttl_seconds: 5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cache.ttl_seconds, 5);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.library.target_format, ".mp4");
    }

    #[test]
    fn test_load_from_file_normalizes_target_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "library:\n  target_format: mp4\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.library.target_format, ".mp4");
    }

    #[test]
    fn test_config_serialization() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("ttl_seconds: 1800"));

        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.library.target_format, ".mp4");
        assert_eq!(back.server.port, 3000);
    }
}
