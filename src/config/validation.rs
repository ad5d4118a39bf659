use super::Config;
use anyhow::Result;
use axum::http::HeaderValue;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigValidationError {
            path: "server.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "server.host".to_string(),
            message: "Host is required".to_string(),
        });
    }

    for (i, origin) in config.server.cors_origins.iter().enumerate() {
        if origin.trim().is_empty() || HeaderValue::from_str(origin).is_err() {
            errors.push(ConfigValidationError {
                path: format!("server.corsOrigins[{i}]"),
                message: format!("Invalid origin '{origin}'"),
            });
        } else if origin.trim() == "*" {
            errors.push(ConfigValidationError {
                path: format!("server.corsOrigins[{i}]"),
                message: "Wildcard origin cannot be used with credentialed requests".to_string(),
            });
        }
    }

    if config.server.cors_origins.is_empty() {
        warn!("No CORS origins configured; browser clients on other origins will be refused");
    }

    if config.server.model_test_timeout_secs == 0 {
        errors.push(ConfigValidationError {
            path: "server.modelTestTimeoutSecs".to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
