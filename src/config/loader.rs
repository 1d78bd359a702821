//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.relay.path, "/dns-query");
        assert_eq!(config.providers.len(), 6);
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn test_parse_providers() {
        let config = parse_config(
            r#"
            [relay]
            cache_ttl_secs = 120
            selection_seed = 7

            [[providers]]
            name = "primary"
            url = "https://one.example/dns-query"
            weight = 3

            [[providers]]
            name = "secondary"
            url = "https://two.example/dns-query"
            "#,
        )
        .unwrap();

        assert_eq!(config.relay.cache_ttl_secs, 120);
        assert_eq!(config.relay.selection_seed, Some(7));
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].weight, 3);
        assert_eq!(config.providers[1].weight, 1);
    }

    #[test]
    fn test_negative_weight_is_a_parse_error() {
        let err = parse_config(
            r#"
            [[providers]]
            name = "bad"
            url = "https://bad.example/dns-query"
            weight = -5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_weight_is_a_validation_error() {
        let err = parse_config(
            r#"
            [[providers]]
            name = "bad"
            url = "https://bad.example/dns-query"
            weight = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("weight 0"));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("doh_relay_missing_config.toml");
        let _ = fs::remove_file(&path);
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("doh_relay_loader_test.toml");
        fs::write(&path, "[listener]\nbind_address = \"127.0.0.1:5353\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:5353");

        fs::remove_file(&path).unwrap_or_default();
    }
}
