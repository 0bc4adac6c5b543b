//! Application configuration, stored as JSON in the user's config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "GYMSTATS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database holding exercises, trackers and workouts
    pub database_path: PathBuf,
    /// Where the CLI writes the rendered chart
    pub plot_path: PathBuf,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Horizontal padding before the first point, in pixels
    pub left_padding: f64,
    pub dark_mode: bool,
    /// Number of rendered charts kept by the render cache
    pub render_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: app_dir(dirs::data_dir()).join("workouts.db"),
            plot_path: PathBuf::from("workout_chart.png"),
            canvas_width: 1000,
            canvas_height: 600,
            left_padding: 60.0,
            dark_mode: false,
            render_cache_size: 10,
        }
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join("gymstats")
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => app_dir(dirs::config_dir()).join("config.json"),
        }
    }

    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::Config("canvas size must be non-zero".to_string()));
        }
        if self.left_padding < 0.0 || self.left_padding >= self.canvas_width as f64 {
            return Err(Error::Config(format!(
                "left_padding {} must lie inside the canvas",
                self.left_padding
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = Config {
            canvas_width: 800,
            dark_mode: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "canvas_height": 480 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.canvas_height, 480);
        assert_eq!(config.canvas_width, Config::default().canvas_width);
    }

    #[test]
    fn test_rejects_zero_canvas() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "canvas_width": 0 }"#).unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
