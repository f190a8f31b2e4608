//! Read-only error diagnostics.
//!
//! The analyzer classifies what is wrong with a text without changing it:
//! categorized matches with context, a character histogram, word-break
//! statistics, confusion symbols frequent enough to look systematic, and
//! ranked recommendations and review items for a human to act on. Nothing
//! here feeds back into the correction stages.

use crate::config::AnalyzerConfig;
use crate::confusion::{ConfusionModel, SymbolDomain};
use crate::patterns::{PatternCorrector, RuleId};
use crate::script::{
    BASE_CLASS, CharClass, HSPACE, SIGN_CLASS, SYMBOL_CLASS, classify, dominant_script, is_horizontal_space,
    is_joinable, is_recognized, odia_ratio,
};
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategoryKind {
    BrokenWords,
    IncorrectHalanta,
    ForeignIntrusions,
    NumberArtifacts,
    SymbolArtifacts,
    PunctuationErrors,
    SpacingErrors,
}

impl ErrorCategoryKind {
    pub const ALL: [ErrorCategoryKind; 7] = [
        ErrorCategoryKind::BrokenWords,
        ErrorCategoryKind::IncorrectHalanta,
        ErrorCategoryKind::ForeignIntrusions,
        ErrorCategoryKind::NumberArtifacts,
        ErrorCategoryKind::SymbolArtifacts,
        ErrorCategoryKind::PunctuationErrors,
        ErrorCategoryKind::SpacingErrors,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorCategoryKind::BrokenWords => "broken_words",
            ErrorCategoryKind::IncorrectHalanta => "incorrect_halanta",
            ErrorCategoryKind::ForeignIntrusions => "foreign_intrusions",
            ErrorCategoryKind::NumberArtifacts => "number_artifacts",
            ErrorCategoryKind::SymbolArtifacts => "symbol_artifacts",
            ErrorCategoryKind::PunctuationErrors => "punctuation_errors",
            ErrorCategoryKind::SpacingErrors => "spacing_errors",
        }
    }

    /// Categories whose fixes are safe enough to apply wholesale.
    fn is_high_priority(self) -> bool {
        matches!(
            self,
            ErrorCategoryKind::BrokenWords | ErrorCategoryKind::NumberArtifacts | ErrorCategoryKind::SymbolArtifacts
        )
    }

    /// The correction rule that addresses this category.
    fn rule(self) -> RuleId {
        match self {
            ErrorCategoryKind::BrokenWords => RuleId::BrokenWords,
            ErrorCategoryKind::IncorrectHalanta => RuleId::TrailingHalanta,
            ErrorCategoryKind::ForeignIntrusions => RuleId::StrayLatin,
            ErrorCategoryKind::NumberArtifacts => RuleId::NativeDigits,
            ErrorCategoryKind::SymbolArtifacts => RuleId::SymbolClusters,
            ErrorCategoryKind::PunctuationErrors => RuleId::SpaceBeforePunctuation,
            ErrorCategoryKind::SpacingErrors => RuleId::CollapseWhitespace,
        }
    }
}

impl From<SymbolDomain> for ErrorCategoryKind {
    fn from(domain: SymbolDomain) -> Self {
        match domain {
            SymbolDomain::Letter => ErrorCategoryKind::ForeignIntrusions,
            SymbolDomain::Digit => ErrorCategoryKind::NumberArtifacts,
            SymbolDomain::Symbol => ErrorCategoryKind::SymbolArtifacts,
        }
    }
}

lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(ErrorCategoryKind, Vec<Regex>)> = {
        let (b, s, h) = (BASE_CLASS, SIGN_CLASS, HSPACE);
        vec![
            (ErrorCategoryKind::BrokenWords, vec![
                Regex::new(&format!("{b}{h}+{b}")).unwrap(),
                Regex::new(&format!("{b}{h}+{s}")).unwrap(),
                Regex::new(&format!("{s}{h}+{b}")).unwrap(),
            ]),
            (ErrorCategoryKind::IncorrectHalanta, vec![
                // halanta ending a word
                Regex::new(&format!(r"(?m){b}\x{{0B4D}}(?:{h}|$)")).unwrap(),
                // halanta with nothing to attach to
                Regex::new(r"(?m)(?:^|\s)\x{0B4D}").unwrap(),
                // doubled halanta, or a vowel sign after it
                Regex::new(&format!(r"\x{{0B4D}}(?:\x{{0B4D}}|{s})")).unwrap(),
            ]),
            (ErrorCategoryKind::ForeignIntrusions, vec![
                Regex::new(r"[A-Za-z]+").unwrap(),
            ]),
            (ErrorCategoryKind::NumberArtifacts, vec![
                Regex::new("[0-9]+").unwrap(),
                Regex::new(&format!("[0-9](?:{b}|{s})")).unwrap(),
                Regex::new(&format!("(?:{b}|{s})[0-9]")).unwrap(),
            ]),
            (ErrorCategoryKind::SymbolArtifacts, vec![
                Regex::new(SYMBOL_CLASS).unwrap(),
                Regex::new("_{2,}").unwrap(),
                Regex::new(r"\|{2,}").unwrap(),
            ]),
            (ErrorCategoryKind::PunctuationErrors, vec![
                Regex::new("।{2,}").unwrap(),
                Regex::new(",{2,}").unwrap(),
                Regex::new(&format!("{h}+[।॥,;:!?]")).unwrap(),
            ]),
            (ErrorCategoryKind::SpacingErrors, vec![
                Regex::new(&format!("{h}{{2,}}")).unwrap(),
                Regex::new(&format!("(?m)^{h}+")).unwrap(),
                Regex::new(&format!("(?m){h}+$")).unwrap(),
            ]),
        ]
    };

    // Recurring shapes worth a bulk fix once they pass the pattern threshold.
    static ref HOTSPOT_PATTERNS: Vec<(Regex, &'static str)> = {
        let (b, s, h) = (BASE_CLASS, SIGN_CLASS, HSPACE);
        vec![
            (Regex::new("[0-9]+").unwrap(), "Convert to Odia numerals"),
            (Regex::new(&format!("{b}{h}+{s}")).unwrap(), "Join character with vowel sign"),
            (Regex::new(&format!(r"{b}\x{{0B4D}}{h}")).unwrap(), "Remove trailing halanta"),
            (Regex::new(r"\|").unwrap(), "Replace with danda (।)"),
        ]
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub matched_text: String,
    /// Character offset of the match.
    pub position: usize,
    /// Surrounding text with the match in brackets.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub kind: ErrorCategoryKind,
    pub count: usize,
    pub samples: Vec<Occurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharFrequency {
    pub character: char,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakPair {
    pub left: char,
    pub right: char,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BreakTypes {
    pub consonant_consonant: usize,
    pub consonant_vowel_sign: usize,
    pub vowel_consonant: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WordBreakStats {
    pub total: usize,
    pub common_breaks: Vec<BreakPair>,
    pub break_types: BreakTypes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystematicSubstitution {
    pub symbol: String,
    pub domain: SymbolDomain,
    pub count: usize,
    /// The model's replacement first, then its alternatives.
    pub suggested_replacements: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHotspot {
    pub pattern: String,
    pub description: String,
    pub count: usize,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionRecommendation {
    pub category: ErrorCategoryKind,
    pub priority: Priority,
    pub description: String,
    pub suggested_pattern: String,
    pub suggested_replacement: String,
    pub sample_matches: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    WordBreak,
    Character,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub kind: ReviewKind,
    pub priority: Priority,
    pub subject: String,
    pub count: usize,
    pub description: String,
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_characters: usize,
    pub total_lines: usize,
    pub odia_ratio: Option<f64>,
    pub dominant_script: Option<String>,
    pub categories: Vec<CategoryReport>,
    pub character_frequency: Vec<CharFrequency>,
    pub word_breaks: WordBreakStats,
    pub systematic_substitutions: Vec<SystematicSubstitution>,
    pub pattern_hotspots: Vec<PatternHotspot>,
    pub recommendations: Vec<CorrectionRecommendation>,
    pub review_items: Vec<ReviewItem>,
}

impl AnalysisReport {
    pub fn category(&self, kind: ErrorCategoryKind) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.kind == kind)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ErrorAnalyzer {
    model: Arc<ConfusionModel>,
    patterns: Arc<PatternCorrector>,
    config: AnalyzerConfig,
}

impl ErrorAnalyzer {
    pub fn new(model: Arc<ConfusionModel>, patterns: Arc<PatternCorrector>, config: AnalyzerConfig) -> Self {
        Self {
            model,
            patterns,
            config,
        }
    }

    pub fn analyze(&self, text: &str) -> AnalysisReport {
        let categories = self.categorize(text);
        let character_frequency = self.character_frequency(text);
        let word_breaks = self.word_breaks(text);
        let systematic_substitutions = self.systematic_substitutions(text);
        let pattern_hotspots = self.pattern_hotspots(text);
        let recommendations = self.recommendations(text, &categories, &systematic_substitutions);
        let review_items = self.review_items(&word_breaks, &character_frequency);

        debug!(
            chars = text.chars().count(),
            recommendations = recommendations.len(),
            review_items = review_items.len(),
            "analysis finished"
        );

        AnalysisReport {
            total_characters: text.chars().count(),
            total_lines: text.lines().count(),
            odia_ratio: odia_ratio(text),
            dominant_script: dominant_script(text),
            categories,
            character_frequency,
            word_breaks,
            systematic_substitutions,
            pattern_hotspots,
            recommendations,
            review_items,
        }
    }

    fn categorize(&self, text: &str) -> Vec<CategoryReport> {
        CATEGORY_PATTERNS
            .iter()
            .map(|(kind, patterns)| {
                let mut count = 0;
                let mut samples = Vec::new();
                for pattern in patterns {
                    for m in pattern.find_iter(text) {
                        count += 1;
                        if samples.len() < self.config.max_samples {
                            samples.push(Occurrence {
                                matched_text: m.as_str().to_string(),
                                position: text[..m.start()].chars().count(),
                                context: extract_context(text, m.start(), m.end(), self.config.context_chars),
                            });
                        }
                    }
                }
                CategoryReport {
                    kind: *kind,
                    count,
                    samples,
                }
            })
            .collect()
    }

    fn character_frequency(&self, text: &str) -> Vec<CharFrequency> {
        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in text.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }
        let mut frequency: Vec<CharFrequency> = counts
            .into_iter()
            .map(|(character, count)| CharFrequency { character, count })
            .collect();
        frequency.sort_by(|a, b| b.count.cmp(&a.count).then(a.character.cmp(&b.character)));
        frequency.truncate(self.config.top_chars);
        frequency
    }

    fn word_breaks(&self, text: &str) -> WordBreakStats {
        let chars: Vec<char> = text.chars().collect();
        let mut stats = WordBreakStats::default();
        let mut pairs: HashMap<(char, char), usize> = HashMap::new();

        let mut i = 1;
        while i < chars.len() {
            if !is_horizontal_space(chars[i]) {
                i += 1;
                continue;
            }
            let left = chars[i - 1];
            let mut j = i;
            while j < chars.len() && is_horizontal_space(chars[j]) {
                j += 1;
            }
            if let Some(&right) = chars.get(j) {
                if is_joinable(left, right) {
                    stats.total += 1;
                    *pairs.entry((left, right)).or_insert(0) += 1;
                    let bucket = &mut stats.break_types;
                    match (classify(left), classify(right)) {
                        (CharClass::Consonant, CharClass::Consonant) => bucket.consonant_consonant += 1,
                        (CharClass::Consonant, CharClass::VowelSign) => bucket.consonant_vowel_sign += 1,
                        (CharClass::IndependentVowel | CharClass::VowelSign, CharClass::Consonant) => {
                            bucket.vowel_consonant += 1
                        }
                        _ => bucket.other += 1,
                    }
                }
            }
            i = j;
        }

        let mut common: Vec<BreakPair> = pairs
            .into_iter()
            .map(|((left, right), count)| BreakPair { left, right, count })
            .collect();
        common.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(a.left.cmp(&b.left))
                .then(a.right.cmp(&b.right))
        });
        common.truncate(self.config.top_breaks);
        stats.common_breaks = common;
        stats
    }

    fn systematic_substitutions(&self, text: &str) -> Vec<SystematicSubstitution> {
        let mut found: Vec<SystematicSubstitution> = self
            .model
            .entries()
            .iter()
            .filter_map(|entry| {
                let count = text.matches(entry.symbol.as_str()).count();
                if count <= self.config.systematic_threshold {
                    return None;
                }
                let confidence = if count > self.config.high_confidence_threshold {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                Some(SystematicSubstitution {
                    symbol: entry.symbol.clone(),
                    domain: entry.domain,
                    count,
                    suggested_replacements: std::iter::once(entry.replacement.clone())
                        .chain(entry.alternatives.iter().cloned())
                        .collect(),
                    confidence,
                })
            })
            .collect();
        found.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.symbol.cmp(&b.symbol)));
        found
    }

    fn pattern_hotspots(&self, text: &str) -> Vec<PatternHotspot> {
        HOTSPOT_PATTERNS
            .iter()
            .filter_map(|(pattern, description)| {
                let count = pattern.find_iter(text).count();
                (count > self.config.pattern_threshold).then(|| PatternHotspot {
                    pattern: pattern.as_str().to_string(),
                    description: description.to_string(),
                    count,
                    priority: if count > self.config.high_confidence_threshold {
                        Priority::High
                    } else {
                        Priority::Medium
                    },
                })
            })
            .collect()
    }

    fn recommendations(
        &self,
        text: &str,
        categories: &[CategoryReport],
        substitutions: &[SystematicSubstitution],
    ) -> Vec<CorrectionRecommendation> {
        let samples = self.config.recommendation_samples;
        let mut recommendations = Vec::new();

        for category in categories.iter().filter(|c| c.count > 0) {
            let (suggested_pattern, suggested_replacement) = match self.patterns.rule(category.kind.rule()) {
                Some(rule) => (rule.pattern().to_string(), rule.replacement().into_owned()),
                None => (String::new(), String::new()),
            };
            recommendations.push(CorrectionRecommendation {
                category: category.kind,
                priority: if category.kind.is_high_priority() {
                    Priority::High
                } else {
                    Priority::Medium
                },
                description: format!(
                    "Fix {} {} matches",
                    category.count,
                    category.kind.name().replace('_', " ")
                ),
                suggested_pattern,
                suggested_replacement,
                sample_matches: category
                    .samples
                    .iter()
                    .take(samples)
                    .map(|o| o.matched_text.clone())
                    .collect(),
                count: category.count,
            });
        }

        for substitution in substitutions {
            let sample_matches = text
                .match_indices(substitution.symbol.as_str())
                .take(samples)
                .map(|(start, m)| extract_context(text, start, start + m.len(), self.config.context_chars))
                .collect();
            recommendations.push(CorrectionRecommendation {
                category: substitution.domain.into(),
                priority: match substitution.confidence {
                    Confidence::High => Priority::High,
                    Confidence::Medium => Priority::Medium,
                },
                description: format!(
                    "Replace {} instances of '{}' with {}",
                    substitution.count,
                    substitution.symbol,
                    describe_replacements(&substitution.suggested_replacements)
                ),
                suggested_pattern: regex::escape(&substitution.symbol),
                suggested_replacement: substitution.suggested_replacements.first().cloned().unwrap_or_default(),
                sample_matches,
                count: substitution.count,
            });
        }

        // stable: category order is kept among equal counts
        recommendations.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.count.cmp(&a.count)));
        recommendations
    }

    fn review_items(&self, word_breaks: &WordBreakStats, frequency: &[CharFrequency]) -> Vec<ReviewItem> {
        let mut items = Vec::new();

        for pair in word_breaks.common_breaks.iter().take(10) {
            if pair.count > self.config.word_break_review_threshold {
                items.push(ReviewItem {
                    kind: ReviewKind::WordBreak,
                    priority: Priority::Medium,
                    subject: format!("{} {}", pair.left, pair.right),
                    count: pair.count,
                    description: format!(
                        "Review {} instances of '{} {}' - should these be joined?",
                        pair.count, pair.left, pair.right
                    ),
                    suggested_action: format!("Consider joining as '{}{}'", pair.left, pair.right),
                });
            }
        }

        for entry in frequency {
            if entry.count > self.config.char_review_threshold && !is_recognized(entry.character) {
                items.push(ReviewItem {
                    kind: ReviewKind::Character,
                    priority: Priority::High,
                    subject: entry.character.to_string(),
                    count: entry.count,
                    description: format!(
                        "High-frequency non-Odia character {:?} appears {} times",
                        entry.character, entry.count
                    ),
                    suggested_action: "Review and determine appropriate replacement".to_string(),
                });
            }
        }

        items.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.count.cmp(&a.count)));
        items
    }
}

fn describe_replacements(replacements: &[String]) -> String {
    let quoted: Vec<String> = replacements
        .iter()
        .map(|r| if r.is_empty() { "nothing".to_string() } else { format!("'{}'", r) })
        .collect();
    quoted.join(" or ")
}

/// Up to `context_chars` characters either side of `text[start..end]`, with
/// the match itself in brackets. Offsets are byte offsets on char boundaries.
fn extract_context(text: &str, start: usize, end: usize, context_chars: usize) -> String {
    let ctx_start = text[..start]
        .char_indices()
        .rev()
        .take(context_chars)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(start);
    let ctx_end = text[end..]
        .char_indices()
        .nth(context_chars)
        .map(|(idx, _)| end + idx)
        .unwrap_or(text.len());

    format!(
        "{}[{}]{}",
        &text[ctx_start..start],
        &text[start..end],
        &text[end..ctx_end]
    )
}
