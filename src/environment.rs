// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub fonts_path: PathBuf,
    #[serde(skip)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = Self::load_from_file(&environment)?;
        config.cors_allowed_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS").unwrap_or_default().as_str(),
        );
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("CVPRESS_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(environment: &str) -> Result<Self> {
        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            info!("config.yaml not found, using built-in local defaults");
            return Ok(Self::local_defaults());
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            fonts_path: Self::resolve_path(&env_config.fonts_path)?,
            cors_allowed_origins: Vec::new(),
        })
    }

    fn local_defaults() -> Self {
        Self {
            database_path: PathBuf::from("data/cvpress.db"),
            fonts_path: PathBuf::from("/usr/share/fonts/truetype/dejavu"),
            cors_allowed_origins: Vec::new(),
        }
    }

    fn resolve_path(path: &PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.clone())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the database parent directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(db_parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(db_parent).await.with_context(|| {
                format!("Failed to create database directory: {}", db_parent.display())
            })?;
        }

        info!("All configured directories ensured to exist");
        Ok(())
    }
}

/// Split a comma-separated allowlist; empty input means allow all.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_origins_default_to_wildcard() {
        assert_eq!(parse_cors_origins(""), vec!["*".to_string()]);
        assert_eq!(parse_cors_origins("  "), vec!["*".to_string()]);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let parsed = parse_cors_origins("https://cv.example.com, http://localhost:3000");
        assert_eq!(
            parsed,
            vec![
                "https://cv.example.com".to_string(),
                "http://localhost:3000".to_string()
            ]
        );
    }
}
