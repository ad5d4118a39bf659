use anyhow::{bail, Context, Result};
use std::path::Path;

use super::Config;

/// Maximum size for a config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Parse a JSON5 configuration string.
pub fn parse_config_json5(content: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = json5::from_str(content)?;
    Ok(value)
}

/// Read a configuration file into a JSON value, dispatching on extension.
///
/// YAML and TOML are converted; anything else is read as JSON, falling back
/// to JSON5 for hand-written files with comments or trailing commas.
pub fn read_config_value(path: &Path) -> Result<serde_json::Value> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            let value: serde_json::Value = serde_yaml::from_str(&content)?;
            Ok(value)
        }
        Some("toml") => {
            let value: serde_json::Value = toml::from_str(&content)?;
            Ok(value)
        }
        _ => serde_json::from_str(&content).or_else(|_| parse_config_json5(&content)),
    }
}

/// Load a typed configuration from a file path.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let value = read_config_value(path)?;
    let config = serde_json::from_value(value)
        .with_context(|| format!("Invalid configuration in '{}'", path.display()))?;
    Ok(config)
}

/// Compute a hash of a configuration snapshot for change detection.
pub fn resolve_config_snapshot_hash(value: &serde_json::Value) -> String {
    use sha2::{Digest, Sha256};
    let canonical = serde_json::to_string(value).unwrap_or_default();
    let hash = Sha256::digest(canonical.as_bytes());
    hex::encode(hash)
}

/// Write configuration to a JSON file.
pub fn write_config_file(path: &Path, config: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json5_comments_and_trailing_commas() {
        let value = parse_config_json5("{ // dev box\n server: { port: 9000, }, }").unwrap();
        assert_eq!(value["server"]["port"].as_f64(), Some(9000.0));
    }

    #[test]
    fn toml_files_are_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstudio.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\njson = true\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentstudio.json");
        std::fs::write(&path, vec![b' '; (MAX_CONFIG_FILE_BYTES + 1) as usize]).unwrap();
        assert!(read_config_value(&path).is_err());
    }

    #[test]
    fn snapshot_hash_is_stable() {
        let a = resolve_config_snapshot_hash(&json!({"server": {"port": 1}}));
        let b = resolve_config_snapshot_hash(&json!({"server": {"port": 1}}));
        let c = resolve_config_snapshot_hash(&json!({"server": {"port": 2}}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
