use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Tolerance when checking that risk weights sum to one.
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.max_concurrent_analyses == 0 {
        return Err(ConfigError::Validation {
            message: "maxConcurrentAnalyses must be at least 1".to_string(),
        });
    }

    let thresholds = &config.thresholds;
    if !(0.0..=100.0).contains(&thresholds.medium)
        || !(0.0..=100.0).contains(&thresholds.high)
        || thresholds.medium >= thresholds.high
    {
        return Err(ConfigError::Validation {
            message: format!(
                "Thresholds must satisfy 0 <= medium < high <= 100 (got medium={}, high={})",
                thresholds.medium, thresholds.high
            ),
        });
    }

    let weights = &config.weights;
    if weights.duplicate < 0.0 || weights.manipulation < 0.0 || weights.consistency < 0.0 {
        return Err(ConfigError::Validation {
            message: "Risk weights must not be negative".to_string(),
        });
    }
    if (weights.sum() - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ConfigError::Validation {
            message: format!("Risk weights must sum to 1.0 (got {})", weights.sum()),
        });
    }

    Ok(())
}
