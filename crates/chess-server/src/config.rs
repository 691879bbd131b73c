//! Configuration loading for the game server.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_port() -> u16 {
    9090
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Loads `chess.toml` from the current directory or a parent, falling
    /// back to defaults when no file is found.
    pub async fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let paths = ["chess.toml", "../chess.toml", "../../chess.toml"];

        for path in paths {
            if Path::new(path).exists() {
                let content = tokio::fs::read_to_string(path).await?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!(path, "loaded config");
                return Ok(config);
            }
        }

        tracing::info!("no chess.toml found, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind, "127.0.0.1");
    }

    #[test]
    fn file_values_override_defaults() {
        let config: Config = toml::from_str("port = 4000\nbind = \"0.0.0.0\"").unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind, "0.0.0.0");
    }
}
