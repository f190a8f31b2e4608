//! Known-term correction.
//!
//! The vocabulary maps each canonical term to the misspellings OCR produces
//! for it. Variants are literal character sequences, tried longest first.
//! Loading rejects tables whose rewrites could feed each other: a variant
//! may not occur inside any canonical form, so one pass can never create
//! a match for another.

use crate::config::{MatchMode, VocabularyConfig};
use crate::confusion::looks_mis_encoded;
use crate::script::{is_odia, is_target_punctuation, is_word_char};
use crate::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const EMBEDDED_TABLE: &str = include_str!("../data/vocabulary.toml");
/// Passes before a non-converging substring rewrite is given up on.
const MAX_PASSES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub canonical: String,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    version: u32,
    #[serde(rename = "entry", default)]
    entries: Vec<VocabularyEntry>,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    version: u32,
    entries: Vec<VocabularyEntry>,
    /// (variant, entry index), longest variant first.
    rewrites: Vec<(String, usize)>,
}

impl Vocabulary {
    /// The medical vocabulary shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_TABLE)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CleanerError::InvalidTable { table, message } => CleanerError::InvalidTable {
                table,
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile =
            toml::from_str(content).map_err(|e| CleanerError::table("vocabulary", e.to_string()))?;
        Self::new(file.version, file.entries)
    }

    /// Validate `entries` and build the rewrite order. Variants equal to their
    /// own canonical form are dropped.
    pub fn new(version: u32, mut entries: Vec<VocabularyEntry>) -> Result<Self> {
        for entry in &mut entries {
            let canonical = entry.canonical.clone();
            entry.variants.retain(|variant| *variant != canonical);
        }

        let mut canonical_owner: HashMap<&str, usize> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            validate_term(&entry.canonical, false)?;
            if canonical_owner.insert(entry.canonical.as_str(), idx).is_some() {
                return Err(CleanerError::table(
                    "vocabulary",
                    format!("canonical form {:?} is listed twice", entry.canonical),
                ));
            }
        }

        let mut variant_owner: HashMap<&str, usize> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for variant in &entry.variants {
                validate_term(variant, true)?;
                if let Some(&other) = variant_owner.get(variant.as_str()) {
                    return Err(CleanerError::table(
                        "vocabulary",
                        format!(
                            "variant {:?} is claimed by both {:?} and {:?}",
                            variant, entries[other].canonical, entry.canonical
                        ),
                    ));
                }
                variant_owner.insert(variant.as_str(), idx);
                if canonical_owner.contains_key(variant.as_str()) {
                    return Err(CleanerError::table(
                        "vocabulary",
                        format!("variant {:?} of {:?} is itself a canonical form", variant, entry.canonical),
                    ));
                }
                if let Some(host) = entries.iter().find(|e| e.canonical.contains(variant.as_str())) {
                    return Err(CleanerError::table(
                        "vocabulary",
                        format!(
                            "variant {:?} of {:?} occurs inside canonical form {:?}",
                            variant, entry.canonical, host.canonical
                        ),
                    ));
                }
            }
        }

        let mut rewrites: Vec<(String, usize)> = entries
            .iter()
            .enumerate()
            .flat_map(|(idx, entry)| entry.variants.iter().map(move |v| (v.clone(), idx)))
            .collect();
        rewrites.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

        Ok(Self {
            version,
            entries,
            rewrites,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical form for an exact variant.
    pub fn canonical_for(&self, variant: &str) -> Option<&str> {
        self.rewrites
            .iter()
            .find(|(v, _)| v == variant)
            .map(|&(_, idx)| self.entries[idx].canonical.as_str())
    }
}

fn validate_term(term: &str, is_variant: bool) -> Result<()> {
    let kind = if is_variant { "variant" } else { "canonical form" };
    if term.trim().is_empty() {
        return Err(CleanerError::table("vocabulary", format!("empty {}", kind)));
    }
    if looks_mis_encoded(term) {
        return Err(CleanerError::table(
            "vocabulary",
            format!("{} {:?} looks like mis-decoded UTF-8", kind, term),
        ));
    }
    let allowed = |c: char| {
        is_odia(c) || is_target_punctuation(c) || matches!(c, '\u{200C}' | '\u{200D}') || (is_variant && c == ' ')
    };
    if let Some(bad) = term.chars().find(|&c| !allowed(c)) {
        return Err(CleanerError::table(
            "vocabulary",
            format!("{} {:?} contains non-Odia character {:?}", kind, term, bad),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyOutcome {
    pub text: String,
    pub replacements: usize,
}

#[derive(Debug, Clone)]
pub struct VocabularyCorrector {
    vocabulary: Arc<Vocabulary>,
    config: VocabularyConfig,
}

impl VocabularyCorrector {
    pub fn new(vocabulary: Arc<Vocabulary>, config: VocabularyConfig) -> Self {
        Self { vocabulary, config }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Rewrite every known variant to its canonical form. Running this on its
    /// own output changes nothing.
    pub fn correct(&self, text: &str) -> VocabularyOutcome {
        let mut current = text.to_string();
        let mut replacements = 0;

        for pass in 0..MAX_PASSES {
            let (next, count) = self.rewrite_pass(&current);
            if count == 0 {
                return VocabularyOutcome {
                    text: current,
                    replacements,
                };
            }
            debug!(pass, count, "vocabulary variants replaced");
            replacements += count;
            current = next;
        }

        warn!(passes = MAX_PASSES, "vocabulary rewrite did not settle");
        VocabularyOutcome {
            text: current,
            replacements,
        }
    }

    fn rewrite_pass(&self, text: &str) -> (String, usize) {
        let mut current = text.to_string();
        let mut total = 0;
        for (variant, idx) in &self.vocabulary.rewrites {
            if !current.contains(variant.as_str()) {
                continue;
            }
            let canonical = &self.vocabulary.entries[*idx].canonical;
            let (next, count) = match self.config.match_mode {
                MatchMode::Substring => {
                    let count = current.matches(variant.as_str()).count();
                    (current.replace(variant.as_str(), canonical), count)
                }
                MatchMode::WordBoundary => replace_bounded(&current, variant, canonical),
            };
            if count > 0 {
                total += count;
                current = next;
            }
        }
        (current, total)
    }
}

/// Replace occurrences of `needle` whose neighbours are not Odia word characters.
fn replace_bounded(text: &str, needle: &str, replacement: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    for (start, _) in text.match_indices(needle) {
        let end = start + needle.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(replacement);
        last = end;
        count += 1;
    }
    out.push_str(&text[last..]);
    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(canonical: &str, variants: &[&str]) -> VocabularyEntry {
        VocabularyEntry {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn corrector(mode: MatchMode) -> VocabularyCorrector {
        VocabularyCorrector::new(
            Arc::new(Vocabulary::embedded().unwrap()),
            VocabularyConfig {
                enabled: true,
                match_mode: mode,
            },
        )
    }

    #[test]
    fn test_embedded_table_loads() {
        let vocabulary = Vocabulary::embedded().unwrap();
        assert_eq!(vocabulary.version(), 1);
        assert_eq!(vocabulary.len(), 30);
        assert_eq!(vocabulary.canonical_for("ଔଷଦ"), Some("ଔଷଧ"));
        assert_eq!(vocabulary.canonical_for("ଚିକିତ\u{0B4D}\u{200C}ସା"), Some("ଚିକିତ୍ସା"));
        assert_eq!(vocabulary.canonical_for("ଔଷଧ"), None);
    }

    #[test]
    fn test_isolated_variant_is_corrected() {
        let outcome = corrector(MatchMode::WordBoundary).correct("ଔଷଦ। ଜ୍ବର");
        assert_eq!(outcome.text, "ଔଷଧ। ଜ୍ବର");
        assert_eq!(outcome.replacements, 1);
    }

    #[test]
    fn test_word_boundary_skips_longer_words() {
        // ମୂଲ is a variant of ମୂଳ but ମୂଲ୍ୟ is a different word
        let outcome = corrector(MatchMode::WordBoundary).correct("ମୂଲ୍ୟ");
        assert_eq!(outcome.text, "ମୂଲ୍ୟ");
        assert_eq!(outcome.replacements, 0);

        // substring mode rewrites inside the word
        let outcome = corrector(MatchMode::Substring).correct("ମୂଲ୍ୟ");
        assert_ne!(outcome.text, "ମୂଲ୍ୟ");
    }

    #[test]
    fn test_spaced_variant_is_joined() {
        let outcome = corrector(MatchMode::WordBoundary).correct("ଔଷ ଧ ଦିଅ");
        assert_eq!(outcome.text, "ଔଷଧ ଦିଅ");
    }

    #[test]
    fn test_longest_variant_wins() {
        let vocabulary = Vocabulary::new(1, vec![entry("ଜ୍ବର", &["ଜ ବର"]), entry("ଜଳ", &["ଜ ବ"])]).unwrap();
        let config = VocabularyConfig {
            enabled: true,
            match_mode: MatchMode::Substring,
        };
        let corrector = VocabularyCorrector::new(Arc::new(vocabulary), config);
        assert_eq!(corrector.correct("ଜ ବର").text, "ଜ୍ବର");
    }

    #[test]
    fn test_correction_is_idempotent() {
        let samples = [
            "ଔଷଦ ଓ ପତର",
            "ରସସସ",
            "ମୁ ଣଡ ରୋଗ୍।",
            "ଚିକିତସା ଚିକିତସା",
            "ପା ନ ପା ଦ",
            "plain text",
            "",
        ];
        for mode in [MatchMode::WordBoundary, MatchMode::Substring] {
            let corrector = corrector(mode);
            for sample in samples {
                let once = corrector.correct(sample);
                let twice = corrector.correct(&once.text);
                assert_eq!(once.text, twice.text, "{:?} in {:?}", sample, mode);
                assert_eq!(twice.replacements, 0, "{:?} in {:?}", sample, mode);
            }
        }
    }

    #[test]
    fn test_repeated_substring_settles() {
        let outcome = corrector(MatchMode::Substring).correct("ରସସସ");
        assert_eq!(outcome.text, "ରସ");
        assert_eq!(outcome.replacements, 2);
    }

    #[test]
    fn test_identity_variant_is_dropped() {
        let vocabulary = Vocabulary::new(1, vec![entry("ରୋଗ", &["ରୋଗ", "ରୋଗ୍"])]).unwrap();
        assert_eq!(vocabulary.entries()[0].variants, vec!["ରୋଗ୍".to_string()]);
    }

    #[test]
    fn test_rejects_variant_inside_canonical() {
        let err = Vocabulary::new(1, vec![entry("ଦ୍ରବ୍ୟ", &["ଦ୍ରବୟ"]), entry("ରସ", &["ଦ୍ରବ"])]).unwrap_err();
        assert!(err.to_string().contains("occurs inside canonical form"));
    }

    #[test]
    fn test_rejects_chained_and_duplicate_variants() {
        assert!(Vocabulary::new(1, vec![entry("ଫଳ", &["ଫଲ"]), entry("ଫଲ", &["ଫ ଲ"])]).is_err());
        assert!(Vocabulary::new(1, vec![entry("ଫଳ", &["ଫ ଳ"]), entry("ଜଳ", &["ଫ ଳ"])]).is_err());
        assert!(Vocabulary::new(1, vec![entry("ଫଳ", &[]), entry("ଫଳ", &[])]).is_err());
    }

    #[test]
    fn test_rejects_non_odia_terms() {
        let err = Vocabulary::new(1, vec![entry("ଫଳ", &["fala"])]).unwrap_err();
        assert!(matches!(err, CleanerError::InvalidTable { table: "vocabulary", .. }));
        assert!(Vocabulary::new(1, vec![entry("à¬«", &[])]).is_err());
        assert!(Vocabulary::new(1, vec![entry("ଫ ଳ", &[])]).is_err());
    }
}
