//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level tileboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasConfig>,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Canvas dimensions and palette. Fixed for the process lifetime; the
/// grid is allocated from these values before the first connection is
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_color: Option<u8>,

    /// Number of accepted color values; writes with `color` at or above
    /// this are rejected. At most 256, one byte per cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<u16>,
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::TileboardError::Io)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::TileboardError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Listener bind address.
    pub fn bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    /// Listener port.
    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(8081)
    }

    /// Canvas width in cells.
    pub fn width(&self) -> u32 {
        self.canvas.as_ref().and_then(|c| c.width).unwrap_or(1000)
    }

    /// Canvas height in cells.
    pub fn height(&self) -> u32 {
        self.canvas.as_ref().and_then(|c| c.height).unwrap_or(1000)
    }

    /// Fill color for freshly allocated cells.
    pub fn default_color(&self) -> u8 {
        self.canvas
            .as_ref()
            .and_then(|c| c.default_color)
            .unwrap_or(0)
    }

    /// Size of the accepted color palette.
    pub fn palette(&self) -> u16 {
        self.canvas.as_ref().and_then(|c| c.palette).unwrap_or(16)
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileboard")
}

fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind(), "0.0.0.0");
        assert_eq!(config.port(), 8081);
        assert_eq!(config.width(), 1000);
        assert_eq!(config.height(), 1000);
        assert_eq!(config.default_color(), 0);
        assert_eq!(config.palette(), 16);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.port(), 8081);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9000}, "canvas": {"width": 64, "height": 32, "palette": 8}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.width(), 64);
        assert_eq!(config.height(), 32);
        assert_eq!(config.palette(), 8);
        // Untouched sections keep their defaults
        assert_eq!(config.bind(), "0.0.0.0");
        assert_eq!(config.default_color(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{{{{").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_TB_PORT", "1234") };
        let input = r#"{"server": {"port": ${TEST_TB_PORT}}}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("1234"));
        unsafe { std::env::remove_var("TEST_TB_PORT") };
    }
}
