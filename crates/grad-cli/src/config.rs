//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$GRAD_CONFIG` environment variable
//! 2. `~/.config/grad/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use grad_core::{SamplingOptions, SessionConfig, DEFAULT_ARROW_LENGTH, GRADING_TOLERANCE};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grading: GradingConfig,
    pub question: QuestionConfig,
    pub surface: SurfaceConfig,
    pub arrow: ArrowConfig,
}

/// Answer checking.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Absolute tolerance per partial derivative.
    pub tolerance: f64,
}

/// Question generation.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuestionConfig {
    /// Points are drawn from `[-point_range, point_range]`.
    pub point_range: u32,
    /// Fixed seed for reproducible sessions. Default: random.
    pub seed: Option<u64>,
}

/// Surface sampling window around the question point.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub half_range: f64,
    pub step: f64,
}

/// Gradient arrow drawing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    pub length: f64,
}

// --- Defaults ---

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            tolerance: GRADING_TOLERANCE,
        }
    }
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            point_range: 2,
            seed: None,
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        let options = SamplingOptions::default();
        Self {
            half_range: options.half_range,
            step: options.step,
        }
    }
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_ARROW_LENGTH,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tolerance: self.grading.tolerance,
            point_range: self.question.point_range,
            surface: SamplingOptions {
                half_range: self.surface.half_range,
                step: self.surface.step,
            },
            arrow_length: self.arrow.length,
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("GRAD_CONFIG") {
        return Some(PathBuf::from(p));
    }

    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("grad")
            .join("config.toml")
    })
}

/// Show the active config path (for `grad config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.grading.tolerance, 0.05);
        assert_eq!(config.question.point_range, 2);
        assert!(config.question.seed.is_none());
        assert_eq!(config.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[grading]
tolerance = 0.01
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.grading.tolerance, 0.01);
        // Other fields should be defaults
        assert_eq!(config.surface.step, 0.3);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[grading]
tolerance = 0.1

[question]
point_range = 3
seed = 1234

[surface]
half_range = 4.0
step = 0.5

[arrow]
length = 0.6
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.question.seed, Some(1234));
        let session = config.session_config();
        assert_eq!(session.point_range, 3);
        assert_eq!(session.surface.half_range, 4.0);
        assert_eq!(session.surface.step, 0.5);
        assert_eq!(session.arrow_length, 0.6);
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_fail_session_validation() {
        let config: Config = toml::from_str("[surface]\nstep = -1.0\n").unwrap();
        assert!(config.session_config().validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[question]\nseed = 7\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.question.seed, Some(7));
    }

    #[test]
    fn test_load_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[grading\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err}").contains("parsing"));
    }
}
