//! Engine configuration.
//!
//! The two fixed literal contracts of the engine live here as named
//! configuration rather than hard-coded values: the suffix marking a file
//! as a template, and the fallback directory substituted when a caller
//! hands the directory ensurer an invalid path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Suffix marking a file as a template to be rendered.
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".ejs";

/// Directory substituted when a target directory path is invalid.
pub const DEFAULT_FALLBACK_DIR: &str = "generated";

/// Policy for handling an invalid target directory path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPathPolicy {
    /// Log the invalid value and substitute the fallback directory.
    #[default]
    Fallback,
    /// Fail with [`TemplateError::InvalidTargetDir`](crate::TemplateError::InvalidTargetDir).
    Fail,
}

/// Configuration for the rendering engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Suffix stripped from a template path to obtain its destination path.
    #[serde(default = "default_template_suffix")]
    pub template_suffix: String,
    /// Directory used when a target directory path is invalid.
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: PathBuf,
    /// What to do when a target directory path is invalid.
    #[serde(default)]
    pub invalid_path_policy: InvalidPathPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_suffix: default_template_suffix(),
            fallback_dir: default_fallback_dir(),
            invalid_path_policy: InvalidPathPolicy::default(),
        }
    }
}

fn default_template_suffix() -> String {
    DEFAULT_TEMPLATE_SUFFIX.to_string()
}

fn default_fallback_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FALLBACK_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.template_suffix, ".ejs");
        assert_eq!(config.fallback_dir, PathBuf::from("generated"));
        assert_eq!(config.invalid_path_policy, InvalidPathPolicy::Fallback);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"invalid_path_policy": "fail"}"#).unwrap();
        assert_eq!(config.template_suffix, ".ejs");
        assert_eq!(config.invalid_path_policy, InvalidPathPolicy::Fail);
    }
}
