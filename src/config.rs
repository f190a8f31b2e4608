//! Cleaner configuration.
//!
//! Every threshold the pipeline uses is a named field here. All sections
//! default independently, so a TOML file only has to mention what it changes:
//!
//! ```toml
//! parallel = false
//!
//! [filter]
//! min_odia_ratio = 0.3
//!
//! [[extra_rules]]
//! priority = 35
//! pattern = "ଓଷଧ"
//! replacement = "ଔଷଧ"
//! description = "Restore the AU vowel in medicine"
//! ```

use crate::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub normalizer: NormalizerConfig,
    pub filter: FilterConfig,
    pub vocabulary: VocabularyConfig,
    pub analyzer: AnalyzerConfig,
    /// Process units (and batch files) on the rayon pool.
    pub parallel: bool,
    /// Additional rewrite rules, slotted among the built-in ones by priority.
    pub extra_rules: Vec<RuleConfig>,
    /// Replace the embedded confusion table with this file.
    pub confusion_table: Option<PathBuf>,
    /// Replace the embedded vocabulary table with this file.
    pub vocabulary_table: Option<PathBuf>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            filter: FilterConfig::default(),
            vocabulary: VocabularyConfig::default(),
            analyzer: AnalyzerConfig::default(),
            parallel: true,
            extra_rules: Vec::new(),
            confusion_table: None,
            vocabulary_table: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Characters inspected on each side of a candidate symbol.
    pub context_window: usize,
    /// Odia characters required inside the window before a symbol is replaced.
    pub min_context_chars: usize,
    /// NFC-compose input before scanning.
    pub unicode_nfc: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            context_window: 3,
            min_context_chars: 2,
            unicode_nfc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Units must have strictly more than this share of Odia characters.
    pub min_odia_ratio: f64,
    /// Units shorter than this many characters are always kept.
    pub short_unit_len: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_odia_ratio: 0.2,
            short_unit_len: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Replace a variant only when it is not glued to surrounding Odia letters.
    #[default]
    WordBoundary,
    /// Replace every literal occurrence, including inside longer words
    /// (`ମୂଲ` inside `ମୂଲ୍ୟ`).
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub enabled: bool,
    pub match_mode: MatchMode,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            match_mode: MatchMode::WordBoundary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Characters of context kept on each side of a sampled match.
    pub context_chars: usize,
    /// Sampled matches kept per error category.
    pub max_samples: usize,
    /// Entries kept in the character histogram.
    pub top_chars: usize,
    /// Entries kept in the word-break pair ranking.
    pub top_breaks: usize,
    /// Occurrences above which a confusion symbol is reported as systematic.
    pub systematic_threshold: usize,
    /// Occurrences above which a systematic finding is high confidence.
    pub high_confidence_threshold: usize,
    /// Occurrences above which a diagnostic pattern is reported.
    pub pattern_threshold: usize,
    /// Occurrences above which a word-break pair is sent to manual review.
    pub word_break_review_threshold: usize,
    /// Occurrences above which an unrecognized character is sent to manual review.
    pub char_review_threshold: usize,
    /// Sample matches attached to each recommendation.
    pub recommendation_samples: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            context_chars: 30,
            max_samples: 20,
            top_chars: 100,
            top_breaks: 20,
            systematic_threshold: 10,
            high_confidence_threshold: 50,
            pattern_threshold: 5,
            word_break_review_threshold: 5,
            char_review_threshold: 100,
            recommendation_samples: 5,
        }
    }
}

/// A user-supplied rewrite rule. `replacement` uses regex expansion syntax (`$1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub priority: u16,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub description: String,
}

impl CleanerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CleanerError::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CleanerError::config(format!("failed to read config file {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CleanerError::config(format!("invalid TOML in {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that are out of range or that would silently disable a stage.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.filter.min_odia_ratio;
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(CleanerError::config(format!(
                "filter.min_odia_ratio must be within [0, 1], got {}",
                ratio
            )));
        }

        let window = &self.normalizer;
        if window.min_context_chars > 2 * window.context_window {
            return Err(CleanerError::config(format!(
                "normalizer.min_context_chars ({}) exceeds the {} characters a window of {} can hold",
                window.min_context_chars,
                2 * window.context_window,
                window.context_window
            )));
        }

        let analyzer = &self.analyzer;
        if analyzer.max_samples == 0 {
            return Err(CleanerError::config("analyzer.max_samples must be at least 1"));
        }
        if analyzer.high_confidence_threshold < analyzer.systematic_threshold {
            return Err(CleanerError::config(format!(
                "analyzer.high_confidence_threshold ({}) is below analyzer.systematic_threshold ({})",
                analyzer.high_confidence_threshold, analyzer.systematic_threshold
            )));
        }

        for rule in &self.extra_rules {
            if rule.pattern.is_empty() {
                return Err(CleanerError::config(format!(
                    "extra rule with priority {} has an empty pattern",
                    rule.priority
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CleanerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.normalizer.context_window, 3);
        assert_eq!(config.normalizer.min_context_chars, 2);
        assert_eq!(config.filter.min_odia_ratio, 0.2);
        assert_eq!(config.filter.short_unit_len, 5);
        assert_eq!(config.analyzer.context_chars, 30);
        assert_eq!(config.analyzer.max_samples, 20);
        assert_eq!(config.vocabulary.match_mode, MatchMode::WordBoundary);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = CleanerConfig::from_toml_str(
            r#"
            parallel = false

            [filter]
            min_odia_ratio = 0.35

            [vocabulary]
            match_mode = "substring"
            "#,
        )
        .unwrap();
        assert!(!config.parallel);
        assert_eq!(config.filter.min_odia_ratio, 0.35);
        assert_eq!(config.filter.short_unit_len, 5);
        assert_eq!(config.vocabulary.match_mode, MatchMode::Substring);
        assert!(config.vocabulary.enabled);
    }

    #[test]
    fn test_extra_rules_parse() {
        let config = CleanerConfig::from_toml_str(
            r#"
            [[extra_rules]]
            priority = 35
            pattern = "ଓଷଧ"
            replacement = "ଔଷଧ"
            "#,
        )
        .unwrap();
        assert_eq!(config.extra_rules.len(), 1);
        assert_eq!(config.extra_rules[0].priority, 35);
        assert!(config.extra_rules[0].description.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_ratio() {
        let err = CleanerConfig::from_toml_str("[filter]\nmin_odia_ratio = 1.5\n").unwrap_err();
        assert!(matches!(err, CleanerError::Config { .. }));
    }

    #[test]
    fn test_rejects_unreachable_context_threshold() {
        let mut config = CleanerConfig::default();
        config.normalizer.context_window = 1;
        config.normalizer.min_context_chars = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_confidence_thresholds() {
        let mut config = CleanerConfig::default();
        config.analyzer.high_confidence_threshold = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_samples() {
        let mut config = CleanerConfig::default();
        config.analyzer.max_samples = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analyzer.max_samples"));
    }

    #[test]
    fn test_rejects_empty_extra_rule_pattern() {
        let err = CleanerConfig::from_toml_str(
            r#"
            [[extra_rules]]
            priority = 35
            pattern = ""
            replacement = "ଔଷଧ"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CleanerError::Config { .. }));
        assert!(err.to_string().contains("priority 35 has an empty pattern"));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = CleanerConfig::from_toml_str("[filter\n").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = CleanerConfig::from_toml_file("/nonexistent/cleaner.toml").unwrap_err();
        assert!(matches!(err, CleanerError::Config { .. }));
    }
}
