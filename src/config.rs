//! Match run configuration, persisted as TOML.
//!
//! Every field has a default so a config file only needs the values it
//! overrides:
//!
//! ```toml
//! threshold = 0.7
//! language = "en"
//! selection = { bounded = 2 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::matcher::structural::StructuralStrategy;
use crate::selection::SelectionType;

/// Thresholds, weights and switches for one match run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Final selection threshold.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Minimum one-to-one gain for an optional stage to be merged.
    #[serde(default = "default_min_gain")]
    pub min_gain: f64,
    /// Threshold for the word extension stage.
    #[serde(default = "default_word_threshold")]
    pub word_threshold: f64,
    /// Threshold for the string extension stage.
    #[serde(default = "default_string_threshold")]
    pub string_threshold: f64,
    /// Threshold for the structural extension stage.
    #[serde(default = "default_structural_threshold")]
    pub structural_threshold: f64,
    /// How parent and child similarity are folded into one score.
    #[serde(default)]
    pub structural_strategy: StructuralStrategy,
    /// Hierarchy depth considered by neighbour similarity (1 = direct).
    #[serde(default = "default_structural_depth")]
    pub structural_depth: usize,
    /// Weight of the running alignment when blending in structural scores.
    #[serde(default = "default_structural_weight")]
    pub structural_weight: f64,
    /// Selection policy. Unset picks one from the observed cardinality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionType>,
    /// Restrict lexical matching to names in this language (plus untagged).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Allow pairs whose two entities share a URI.
    #[serde(default)]
    pub match_same_uri: bool,
    #[serde(default = "default_true")]
    pub match_properties: bool,
    #[serde(default = "default_true")]
    pub match_individuals: bool,
    /// Worker threads for scoring sweeps. Unset uses available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Candidate pairs per scoring task.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_threshold() -> f64 {
    0.6
}
fn default_min_gain() -> f64 {
    0.02
}
fn default_word_threshold() -> f64 {
    0.7
}
fn default_string_threshold() -> f64 {
    0.75
}
fn default_structural_threshold() -> f64 {
    0.6
}
fn default_structural_depth() -> usize {
    1
}
fn default_structural_weight() -> f64 {
    0.75
}
fn default_true() -> bool {
    true
}
fn default_batch_size() -> usize {
    256
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_gain: default_min_gain(),
            word_threshold: default_word_threshold(),
            string_threshold: default_string_threshold(),
            structural_threshold: default_structural_threshold(),
            structural_strategy: StructuralStrategy::default(),
            structural_depth: default_structural_depth(),
            structural_weight: default_structural_weight(),
            selection: None,
            language: None,
            match_same_uri: false,
            match_properties: true,
            match_individuals: true,
            threads: None,
            batch_size: default_batch_size(),
        }
    }
}

impl MatchConfig {
    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let unit = [
            ("threshold", self.threshold),
            ("min_gain", self.min_gain),
            ("word_threshold", self.word_threshold),
            ("string_threshold", self.string_threshold),
            ("structural_threshold", self.structural_threshold),
            ("structural_weight", self.structural_weight),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.structural_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "structural_depth".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid {
                field: "threads".into(),
                message: "must be at least 1 when set".into(),
            });
        }
        if let Some(SelectionType::Bounded(0)) = self.selection {
            return Err(ConfigError::Invalid {
                field: "selection".into(),
                message: "bounded cardinality must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Parse and validate TOML text. `origin` names the input in errors.
    pub fn from_toml(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = MatchConfig::from_toml("", "inline").unwrap();
        assert_eq!(config, MatchConfig::default());
        assert_eq!(config.threshold, 0.6);
        assert_eq!(config.batch_size, 256);
        assert!(config.selection.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let toml = r#"
            threshold = 0.8
            language = "en"
            structural_strategy = "ancestors"
            selection = { bounded = 3 }
        "#;
        let config = MatchConfig::from_toml(toml, "inline").unwrap();
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.structural_strategy, StructuralStrategy::Ancestors);
        assert_eq!(config.selection, Some(SelectionType::Bounded(3)));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = MatchConfig::from_toml("threshold = 1.5", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "threshold"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = MatchConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("match.toml");
        let config = MatchConfig {
            threshold: 0.7,
            selection: Some(SelectionType::PermissiveOneToOne),
            threads: Some(2),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(MatchConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn bad_syntax_is_a_parse_error() {
        let err = MatchConfig::from_toml("threshold = ", "broken.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
