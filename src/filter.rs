//! Script-ratio filtering of structural units.

use crate::config::FilterConfig;
use crate::script::odia_counts;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

lazy_static! {
    // Page numbers, verse markers, separators. `\d` covers native numerals too.
    static ref NUMERIC_OR_PUNCTUATION: Regex = Regex::new(r"^[\d\s।॥.,;:!?()\-]+$").unwrap();
}

/// One addressable block of document text and where it sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextUnit {
    pub content: String,
    pub index: usize,
}

impl TextUnit {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitDecision {
    /// Enough Odia text to be worth keeping.
    Keep,
    /// Only digits, punctuation and whitespace.
    KeepNumeric,
    /// Below the short-unit length; assumed structural.
    KeepShort,
    Drop,
}

impl UnitDecision {
    pub fn is_kept(self) -> bool {
        self != UnitDecision::Drop
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub kept: Vec<TextUnit>,
    /// Structural indices of the dropped units, in input order.
    pub dropped: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    config: FilterConfig,
}

impl LineFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, content: &str) -> UnitDecision {
        let (odia, total) = odia_counts(content);
        if total == 0 {
            return UnitDecision::Drop;
        }
        if odia as f64 / total as f64 > self.config.min_odia_ratio {
            UnitDecision::Keep
        } else if NUMERIC_OR_PUNCTUATION.is_match(content) {
            UnitDecision::KeepNumeric
        } else if total < self.config.short_unit_len {
            UnitDecision::KeepShort
        } else {
            UnitDecision::Drop
        }
    }

    pub fn filter_units(&self, units: Vec<TextUnit>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for unit in units {
            if self.decide(&unit.content).is_kept() {
                outcome.kept.push(unit);
            } else {
                debug!(index = unit.index, "unit dropped by script filter");
                outcome.dropped.push(unit.index);
            }
        }
        outcome
    }
}
