//! `AppConfig` struct, config file location and TOML read/write.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anidex_api::jikan::{DEFAULT_ITEM_DELAY, DEFAULT_SPACING};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog API settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Account backend settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Batch resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Catalog API configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL override (default: public Jikan v4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// User-Agent override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Milliseconds between two catalog requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_ms: Option<u64>,
    /// Maximum number of waiting requests (unbounded when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queue_depth: Option<usize>,
}

impl CatalogConfig {
    /// Spacing between requests.
    #[must_use]
    pub fn spacing(&self) -> Duration {
        self.spacing_ms
            .map_or(DEFAULT_SPACING, Duration::from_millis)
    }
}

/// Account backend configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL override (default: `http://localhost:5000/api/users/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Batch resolution configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Milliseconds between two identifiers of a batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_delay_ms: Option<u64>,
}

impl ResolverConfig {
    /// Delay between identifiers.
    #[must_use]
    pub fn item_delay(&self) -> Duration {
        self.item_delay_ms
            .map_or(DEFAULT_ITEM_DELAY, Duration::from_millis)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Fills every unset pacing key with its built-in default.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        let spacing = self.catalog.spacing();
        let item_delay = self.resolver.item_delay();
        self.catalog.spacing_ms = Some(duration_ms(spacing));
        self.resolver.item_delay_ms = Some(duration_ms(item_delay));
        self
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Directory name under the user config directory.
const APP_DIR_NAME: &str = "anidex";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolves the config file path.
///
/// Lookup order: `{dir}/config.toml`, `$XDG_CONFIG_HOME/anidex/config.toml`,
/// then `~/.config/anidex/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is usable (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    config_path_from(
        dir,
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_path_from(
    dir: Option<&PathBuf>,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE_NAME));
    }

    // relative XDG paths are invalid and must be ignored
    let base = match xdg_config_home.filter(|p| p.is_absolute()) {
        Some(xdg) => xdg,
        None => home
            .filter(|p| !p.as_os_str().is_empty())
            .context("neither XDG_CONFIG_HOME nor HOME is set")?
            .join(".config"),
    };
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.catalog.base_url.is_none());
        assert_eq!(config.catalog.spacing(), Duration::from_millis(350));
        assert_eq!(config.resolver.item_delay(), Duration::from_millis(300));
        assert!(config.catalog.max_queue_depth.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            catalog: CatalogConfig {
                base_url: Some(String::from("http://127.0.0.1:8080/v4/")),
                spacing_ms: Some(500),
                max_queue_depth: Some(16),
                ..CatalogConfig::default()
            },
            ..AppConfig::default()
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
        assert_eq!(loaded.catalog.spacing(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resolver]\nitem_delay_ms = 0\n").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.resolver.item_delay(), Duration::ZERO);
        assert_eq!(config.catalog, CatalogConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog\nspacing_ms = ").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_prefers_explicit_dir() {
        // Arrange
        let dir = PathBuf::from("/tmp/anidex-project");

        // Act
        let path = config_path_from(
            Some(&dir),
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/tmp/anidex-project/config.toml"));
    }

    #[test]
    fn test_config_path_uses_xdg_config_home() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/xdg/anidex/config.toml"));
    }

    #[test]
    fn test_config_path_ignores_relative_xdg() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("relative/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.config/anidex/config.toml"));
    }

    #[test]
    fn test_config_path_without_home_fails() {
        // Arrange & Act
        let result = config_path_from(None, None, Some(PathBuf::new()));

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_with_defaults_keeps_overrides() {
        // Arrange
        let config = AppConfig {
            catalog: CatalogConfig {
                spacing_ms: Some(1_000),
                ..CatalogConfig::default()
            },
            ..AppConfig::default()
        };

        // Act
        let filled = config.with_defaults();

        // Assert
        assert_eq!(filled.catalog.spacing_ms, Some(1_000));
        assert_eq!(filled.resolver.item_delay_ms, Some(300));
    }
}
