//! Ordered regex rewrite rules.
//!
//! Rules run in ascending priority and each one sees the output of the
//! previous one. Symbol-cluster removal has to run before the punctuation
//! rules so they see the cleaned stream, and whitespace collapsing runs last
//! to absorb the gaps earlier deletions leave. Moving a rule means changing
//! its priority here and in the tests below.
//!
//! Every built-in rule is idempotent: applying it to its own output changes
//! nothing. Rules added through configuration carry no such guarantee.

use crate::config::RuleConfig;
use crate::script::{BASE_CLASS, HSPACE, SIGN_CLASS, SYMBOL_CLASS, to_native_digits};
use crate::{CleanerError, Result};
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    SymbolClusters,
    BrokenWords,
    TrailingHalanta,
    StrayLatin,
    NativeDigits,
    RepeatedPunctuation,
    SpaceBeforePunctuation,
    CollapseWhitespace,
    Custom(u16),
}

impl RuleId {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            RuleId::SymbolClusters => "symbol_clusters".into(),
            RuleId::BrokenWords => "broken_words".into(),
            RuleId::TrailingHalanta => "trailing_halanta".into(),
            RuleId::StrayLatin => "stray_latin".into(),
            RuleId::NativeDigits => "native_digits".into(),
            RuleId::RepeatedPunctuation => "repeated_punctuation".into(),
            RuleId::SpaceBeforePunctuation => "space_before_punctuation".into(),
            RuleId::CollapseWhitespace => "collapse_whitespace".into(),
            RuleId::Custom(priority) => format!("custom_{}", priority).into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Rewrite {
    /// Regex expansion template (`${1}`).
    Template(String),
    /// Re-apply `${1}${2}${3}${4}` until nothing matches.
    JoinUntilStable,
    NativeDigits,
    /// Keep only the first character of the match.
    FirstChar,
    /// A run containing a line break becomes `\n`, anything else one space.
    CollapseSpace,
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub id: RuleId,
    pub priority: u16,
    pub description: String,
    regex: Regex,
    rewrite: Rewrite,
}

impl PatternRule {
    fn compile(id: RuleId, priority: u16, description: &str, pattern: &str, rewrite: Rewrite) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| CleanerError::InvalidPattern {
            rule: id.name().into_owned(),
            source,
        })?;
        Ok(Self {
            id,
            priority,
            description: description.to_string(),
            regex,
            rewrite,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replacement template, or a short description for computed rewrites.
    pub fn replacement(&self) -> Cow<'_, str> {
        match &self.rewrite {
            Rewrite::Template(template) => Cow::Borrowed(template),
            Rewrite::JoinUntilStable => Cow::Borrowed("${1}${2}${3}${4}"),
            Rewrite::NativeDigits => Cow::Borrowed("୦-୯, digit for digit"),
            Rewrite::FirstChar => Cow::Borrowed("first mark of the run"),
            Rewrite::CollapseSpace => Cow::Borrowed("one space, or one newline"),
        }
    }

    /// Apply this rule alone, returning the new text and the number of matches rewritten.
    pub fn apply<'a>(&self, text: &'a str) -> (Cow<'a, str>, usize) {
        let matches = self.regex.find_iter(text).count();
        if matches == 0 {
            return (Cow::Borrowed(text), 0);
        }

        let rewritten = match &self.rewrite {
            Rewrite::Template(template) => self.regex.replace_all(text, template.as_str()).into_owned(),
            Rewrite::NativeDigits => self
                .regex
                .replace_all(text, |caps: &Captures| to_native_digits(&caps[0]))
                .into_owned(),
            Rewrite::FirstChar => self
                .regex
                .replace_all(text, |caps: &Captures| caps[0].chars().take(1).collect::<String>())
                .into_owned(),
            Rewrite::CollapseSpace => self
                .regex
                .replace_all(text, |caps: &Captures| if caps[0].contains('\n') { "\n" } else { " " })
                .into_owned(),
            Rewrite::JoinUntilStable => {
                // Adjacent breaks share a character (`ଭ ି ଷ`), so one non-overlapping
                // pass leaves every other break in place.
                let mut current = self.regex.replace_all(text, "${1}${2}${3}${4}").into_owned();
                let mut total = matches;
                loop {
                    let more = self.regex.find_iter(&current).count();
                    if more == 0 {
                        break;
                    }
                    total += more;
                    current = self.regex.replace_all(&current, "${1}${2}${3}${4}").into_owned();
                }
                return (Cow::Owned(current), total);
            }
        };
        (Cow::Owned(rewritten), matches)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleCount {
    pub rule: RuleId,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOutcome {
    pub text: String,
    /// One entry per rule, in application order.
    pub counts: Vec<RuleCount>,
}

impl PatternOutcome {
    pub fn count_for(&self, rule: RuleId) -> usize {
        self.counts
            .iter()
            .find(|c| c.rule == rule)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }
}

fn builtin_rules() -> Result<Vec<PatternRule>> {
    let b = BASE_CLASS;
    let s = SIGN_CLASS;
    let h = HSPACE;
    Ok(vec![
        PatternRule::compile(
            RuleId::SymbolClusters,
            10,
            "Remove currency, math and typographic symbol runs",
            &format!("{}+", SYMBOL_CLASS),
            Rewrite::Template(String::new()),
        )?,
        PatternRule::compile(
            RuleId::BrokenWords,
            20,
            "Join Odia characters separated by spaces",
            &format!("({b}){h}+({b}|{s})|({s}){h}+({b})"),
            Rewrite::JoinUntilStable,
        )?,
        PatternRule::compile(
            RuleId::TrailingHalanta,
            30,
            "Drop a halanta that ends a word",
            &format!("({b})\u{0B4D}{h}+"),
            Rewrite::Template("${1} ".to_string()),
        )?,
        PatternRule::compile(
            RuleId::StrayLatin,
            40,
            "Remove standalone one- or two-letter Latin tokens",
            r"\b[A-Za-z]{1,2}\b",
            Rewrite::Template(String::new()),
        )?,
        PatternRule::compile(
            RuleId::NativeDigits,
            50,
            "Convert ASCII digit runs to Odia numerals",
            "[0-9]+",
            Rewrite::NativeDigits,
        )?,
        PatternRule::compile(
            RuleId::RepeatedPunctuation,
            60,
            "Collapse repeated danda, comma and stop runs",
            &format!(r"।(?:{h}*।)+|॥(?:{h}*॥)+|,(?:{h}*,)+|\.(?:{h}*\.)+|!(?:{h}*!)+|\?(?:{h}*\?)+"),
            Rewrite::FirstChar,
        )?,
        PatternRule::compile(
            RuleId::SpaceBeforePunctuation,
            70,
            "Remove space before punctuation",
            &format!("{h}+([।॥,;:!?.])"),
            Rewrite::Template("${1}".to_string()),
        )?,
        PatternRule::compile(
            RuleId::CollapseWhitespace,
            80,
            "Collapse whitespace runs",
            r"\s{2,}",
            Rewrite::CollapseSpace,
        )?,
    ])
}

#[derive(Debug, Clone)]
pub struct PatternCorrector {
    rules: Vec<PatternRule>,
}

impl PatternCorrector {
    /// The built-in rules plus `extra`, ordered by priority.
    pub fn new(extra: &[RuleConfig]) -> Result<Self> {
        let mut rules = builtin_rules()?;
        for custom in extra {
            let description = if custom.description.is_empty() {
                format!("Custom rule {}", custom.priority)
            } else {
                custom.description.clone()
            };
            rules.push(PatternRule::compile(
                RuleId::Custom(custom.priority),
                custom.priority,
                &description,
                &custom.pattern,
                Rewrite::Template(custom.replacement.clone()),
            )?);
        }

        let mut priorities = HashSet::new();
        for rule in &rules {
            if !priorities.insert(rule.priority) {
                return Err(CleanerError::config(format!(
                    "two pattern rules share priority {}",
                    rule.priority
                )));
            }
        }
        rules.sort_by_key(|rule| rule.priority);

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn apply(&self, text: &str) -> PatternOutcome {
        let mut current = text.to_string();
        let mut counts = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let (rewritten, count) = rule.apply(&current);
            if let Cow::Owned(next) = rewritten {
                current = next;
            }
            if count > 0 {
                debug!(rule = %rule.id.name(), count, "{}", rule.description);
            }
            counts.push(RuleCount { rule: rule.id, count });
        }

        PatternOutcome { text: current, counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector() -> PatternCorrector {
        PatternCorrector::new(&[]).unwrap()
    }

    fn apply_rule(id: RuleId, text: &str) -> String {
        corrector().rule(id).unwrap().apply(text).0.into_owned()
    }

    #[test]
    fn test_builtin_order() {
        let ids: Vec<RuleId> = corrector().rules().iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::SymbolClusters,
                RuleId::BrokenWords,
                RuleId::TrailingHalanta,
                RuleId::StrayLatin,
                RuleId::NativeDigits,
                RuleId::RepeatedPunctuation,
                RuleId::SpaceBeforePunctuation,
                RuleId::CollapseWhitespace,
            ]
        );
    }

    #[test]
    fn test_symbol_clusters_removed() {
        assert_eq!(apply_rule(RuleId::SymbolClusters, "ରୋଗ€©× ଭଲ"), "ରୋଗ ଭଲ");
    }

    #[test]
    fn test_base_and_vowel_sign_join() {
        assert_eq!(apply_rule(RuleId::BrokenWords, "କ ା"), "କା");
        assert_eq!(apply_rule(RuleId::BrokenWords, "ଭ ି ଷ ପ"), "ଭିଷପ");
        assert_eq!(apply_rule(RuleId::BrokenWords, "ି  କ"), "ିକ");
    }

    #[test]
    fn test_join_ignores_line_breaks_and_latin() {
        assert_eq!(apply_rule(RuleId::BrokenWords, "କ\nଖ"), "କ\nଖ");
        assert_eq!(apply_rule(RuleId::BrokenWords, "କ a"), "କ a");
    }

    #[test]
    fn test_join_counts_every_break() {
        let (_, count) = corrector().rule(RuleId::BrokenWords).unwrap().apply("ଭ ି ଷ ପ");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_trailing_halanta() {
        assert_eq!(apply_rule(RuleId::TrailingHalanta, "ରୋଗ୍ ଭଲ"), "ରୋଗ ଭଲ");
        // mid-cluster halanta stays
        assert_eq!(apply_rule(RuleId::TrailingHalanta, "ପତ୍ର"), "ପତ୍ର");
    }

    #[test]
    fn test_stray_latin_tokens() {
        assert_eq!(apply_rule(RuleId::StrayLatin, "ରୋଗ a ଭଲ Ok"), "ରୋଗ  ଭଲ ");
        assert_eq!(apply_rule(RuleId::StrayLatin, "ରୋଗ abc"), "ରୋଗ abc");
    }

    #[test]
    fn test_native_digits() {
        assert_eq!(apply_rule(RuleId::NativeDigits, "୧2 ସେର 10"), "୧୨ ସେର ୧୦");
    }

    #[test]
    fn test_repeated_punctuation() {
        assert_eq!(apply_rule(RuleId::RepeatedPunctuation, "ଭଲ।। ହେଲା। ।"), "ଭଲ। ହେଲା।");
        assert_eq!(apply_rule(RuleId::RepeatedPunctuation, "ଏବଂ,, ତା...!!"), "ଏବଂ, ତା.!");
        // spaced stops collapse too, so removing the gap cannot leave a fresh run
        assert_eq!(apply_rule(RuleId::RepeatedPunctuation, "ହେଲା ! ! . . ? ?"), "ହେଲା ! . ?");
    }

    #[test]
    fn test_space_before_punctuation() {
        assert_eq!(apply_rule(RuleId::SpaceBeforePunctuation, "ଭଲ ।  ହେଲା ,"), "ଭଲ।  ହେଲା,");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(apply_rule(RuleId::CollapseWhitespace, "କ   ଖ\t\tଗ"), "କ ଖ ଗ");
        assert_eq!(apply_rule(RuleId::CollapseWhitespace, "କ \n ଖ"), "କ\nଖ");
    }

    #[test]
    fn test_every_builtin_rule_is_idempotent() {
        let samples = [
            "ଭ ି ଷ ପ ୧୨୩",
            "ରୋଗ୍ ଭଲ  ହେଲା ।।",
            "a b cd efg ରୋଗ x",
            "€€ ©ରୋଗ × ",
            "।  ।,, ,..??!",
            "ି ି ା କ  ି",
            "କ୍  ଖ୍ \n ଗ ୍ ",
            "12 ab3 ୩4 ",
            "   \n\n  \t",
            "ପତ୍ର  ମୂଳ , ଫଳ ।",
        ];
        let corrector = corrector();
        for rule in corrector.rules() {
            for sample in samples {
                let once = rule.apply(sample).0.into_owned();
                let twice = rule.apply(&once).0.into_owned();
                assert_eq!(once, twice, "rule {} is not idempotent on {:?}", rule.id.name(), sample);
            }
        }
    }

    #[test]
    fn test_rules_see_previous_output() {
        // symbol removal exposes the repeated danda, and the collapsed run then
        // loses its leading space
        let outcome = corrector().apply("ଭଲ ।€।");
        assert_eq!(outcome.text, "ଭଲ।");
        assert_eq!(outcome.count_for(RuleId::SymbolClusters), 1);
        assert_eq!(outcome.count_for(RuleId::RepeatedPunctuation), 1);
        assert_eq!(outcome.count_for(RuleId::SpaceBeforePunctuation), 1);
    }

    #[test]
    fn test_counts_cover_every_rule() {
        let outcome = corrector().apply("ଭଲ");
        assert_eq!(outcome.counts.len(), 8);
        assert_eq!(outcome.total(), 0);
        assert_eq!(outcome.text, "ଭଲ");
    }

    #[test]
    fn test_custom_rule_slots_by_priority() {
        let extra = [RuleConfig {
            priority: 45,
            pattern: "ଓଷଧ".to_string(),
            replacement: "ଔଷଧ".to_string(),
            description: String::new(),
        }];
        let corrector = PatternCorrector::new(&extra).unwrap();
        let ids: Vec<RuleId> = corrector.rules().iter().map(|r| r.id).collect();
        assert_eq!(ids[4], RuleId::Custom(45));
        assert_eq!(corrector.apply("ଓଷଧ।").text, "ଔଷଧ।");
    }

    #[test]
    fn test_custom_rule_errors() {
        let bad = [RuleConfig {
            priority: 45,
            pattern: "(".to_string(),
            replacement: String::new(),
            description: String::new(),
        }];
        assert!(matches!(
            PatternCorrector::new(&bad).unwrap_err(),
            CleanerError::InvalidPattern { .. }
        ));

        let clash = [RuleConfig {
            priority: 20,
            pattern: "x".to_string(),
            replacement: String::new(),
            description: String::new(),
        }];
        assert!(matches!(
            PatternCorrector::new(&clash).unwrap_err(),
            CleanerError::Config { .. }
        ));
    }
}
