//! User configuration loaded from `config.toml`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use midilint_core::transform::DEFAULT_VELOCITY;
use midilint_core::{PieceTransform, Strategy, TransformChain};

/// Settings read from `config.toml`; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub velocity: u8,
    pub precision: u32,
    pub strategy: Strategy,
    /// Steps run by the `run` command, in order
    pub pipeline: Vec<PieceTransform>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            velocity: DEFAULT_VELOCITY,
            precision: 1,
            strategy: Strategy::default(),
            pipeline: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn chain(&self) -> TransformChain {
        let mut chain = TransformChain::new();
        for step in &self.pipeline {
            chain.add(step.clone());
        }
        chain
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("midilint")
        .join("config.toml")
}

/// Load an explicitly given config file, or the default one if it exists.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path();
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), steps = config.pipeline.len(), "Loaded config");
    Ok(config)
}

fn parse_config(text: &str) -> Result<AppConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midilint_core::{Align, CorrectPitch, Normalize};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.velocity, 127);
        assert!(config.chain().is_empty());
    }

    #[test]
    fn test_pipeline_steps() {
        let text = r#"
            velocity = 90
            strategy = "shift_down"

            [[pipeline]]
            type = "normalize"
            velocity = 100

            [[pipeline]]
            type = "align"
            precision = 4

            [[pipeline]]
            type = "correct_pitch"
            key = "a_minor"
        "#;
        let config = parse_config(text).unwrap();

        assert_eq!(config.velocity, 90);
        assert_eq!(config.precision, 1);
        assert_eq!(config.strategy, Strategy::ShiftDown);
        assert_eq!(
            config.pipeline,
            vec![
                PieceTransform::Normalize(Normalize::new(100)),
                PieceTransform::Align(Align::new(4)),
                PieceTransform::CorrectPitch(CorrectPitch::new("a_minor".parse().unwrap(), Strategy::Nearest)),
            ]
        );
        assert_eq!(config.chain().len(), 3);
    }

    #[test]
    fn test_rejects_unknown_key() {
        let text = r#"
            [[pipeline]]
            type = "transpose"
            key = "h_major"
        "#;
        assert!(parse_config(text).is_err());
    }
}
