mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level agentstudio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Root directory for the database and per-user files.
    #[serde(default = "default_app_dir")]
    pub app_dir: PathBuf,

    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(ref p) if p.exists() => {
                let mut config = load_config_file(p)?;
                config.source = Some(p.clone());
                config
            }
            Some(ref p) if path.is_some() => {
                anyhow::bail!("Config file '{}' does not exist", p.display());
            }
            _ => Config::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let mut value = serde_json::to_value(Config::default())?;
        // Leave the app directory to follow the home directory.
        if let Some(obj) = value.as_object_mut() {
            obj.remove("appDir");
        }
        write_config_file(Path::new(path), &value)
    }

    /// SQLite file backing the entity store.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| self.app_dir.join(DATABASE_FILE_NAME))
    }

    /// Root of the per-user file folders.
    pub fn files_root(&self) -> PathBuf {
        self.app_dir.join(FILES_DIR_NAME)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("AGENTSTUDIO_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Some(host) = var("AGENTSTUDIO_HOST") {
            self.server.host = host;
        }

        if let Some(db) = var("AGENTSTUDIO_DATABASE") {
            self.database.path = Some(PathBuf::from(db));
        }

        if let Some(level) = var("AGENTSTUDIO_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(dir) = var("AGENTSTUDIO_APP_DIR").filter(|d| !d.is_empty()) {
            self.app_dir = PathBuf::from(dir);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            app_dir: default_app_dir(),
            source: None,
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("agentstudio.json"),
        PathBuf::from("agentstudio.yaml"),
        PathBuf::from("agentstudio.yml"),
        PathBuf::from("agentstudio.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(APP_DIR_NAME).join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Default app directory for persistent data, under the home directory.
fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_into_app_dir() {
        let mut config = Config::default();
        config.app_dir = PathBuf::from("/srv/studio");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/studio/database.sqlite")
        );
        assert_eq!(config.files_root(), PathBuf::from("/srv/studio/files"));
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.cors_origins.len(), 4);
    }

    #[test]
    fn explicit_database_path_wins() {
        let mut config = Config::default();
        config.database.path = Some(PathBuf::from("/tmp/other.sqlite"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.sqlite"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(Config::load(missing.to_str()).is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstudio.yaml");
        std::fs::write(&path, "server:\n  host: 0.0.0.0\n  port: 9100\n").unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn app_dir_comes_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstudio.json");
        std::fs::write(&path, r#"{"appDir": "/srv/studio"}"#).unwrap();

        let mut config = load_config_file(&path).unwrap();
        assert_eq!(config.app_dir, PathBuf::from("/srv/studio"));
        assert_eq!(config.files_root(), PathBuf::from("/srv/studio/files"));

        config.apply_overrides(|_| None);
        assert_eq!(config.app_dir, PathBuf::from("/srv/studio"));

        let shown = serde_json::to_value(&config).unwrap();
        assert_eq!(shown["appDir"], "/srv/studio");
    }

    #[test]
    fn app_dir_env_beats_file() {
        let mut config: Config = serde_json::from_str(r#"{"appDir": "/srv/studio"}"#).unwrap();
        config.apply_overrides(|key| match key {
            "AGENTSTUDIO_APP_DIR" => Some("/var/lib/studio".to_string()),
            "AGENTSTUDIO_PORT" => Some("9200".to_string()),
            _ => None,
        });
        assert_eq!(config.app_dir, PathBuf::from("/var/lib/studio"));
        assert_eq!(config.server.port, 9200);
    }

    #[test]
    fn app_dir_defaults_under_home() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.app_dir.ends_with(APP_DIR_NAME));
    }

    #[test]
    fn write_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstudio.json");
        Config::write_default(path.to_str().unwrap()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("appDir").is_none());

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }
}
