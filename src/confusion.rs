//! The confusion model: symbols OCR emits in place of Odia characters.
//!
//! The table is a versioned data asset (`data/confusion.toml`), embedded as
//! the default and replaceable from disk. Loading validates every entry so a
//! table saved under the wrong encoding is rejected instead of silently
//! never matching.

use crate::script::{is_odia, is_target_punctuation};
use crate::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const EMBEDDED_TABLE: &str = include_str!("../data/confusion.toml");
const MAX_SYMBOL_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolDomain {
    Symbol,
    Digit,
    Letter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionEntry {
    pub symbol: String,
    /// Odia text to substitute; empty deletes the symbol.
    pub replacement: String,
    pub domain: SymbolDomain,
    /// Other plausible readings, surfaced in analysis reports only.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl ConfusionEntry {
    fn symbol_len(&self) -> usize {
        self.symbol.chars().count()
    }
}

#[derive(Debug, Deserialize)]
struct ConfusionFile {
    version: u32,
    #[serde(rename = "entry", default)]
    entries: Vec<ConfusionEntry>,
}

#[derive(Debug, Clone)]
pub struct ConfusionModel {
    version: u32,
    entries: Vec<ConfusionEntry>,
    /// First character of a symbol -> entry indices, longest symbol first.
    by_first_char: HashMap<char, Vec<usize>>,
}

impl ConfusionModel {
    /// The table shipped with the crate.
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
        let file: ConfusionFile =
            toml::from_str(content).map_err(|e| CleanerError::table("confusion", e.to_string()))?;
        Self::new(file.version, file.entries)
    }

    pub fn new(version: u32, entries: Vec<ConfusionEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            validate_entry(entry)?;
            if !seen.insert(entry.symbol.as_str()) {
                return Err(CleanerError::table(
                    "confusion",
                    format!("symbol {:?} is listed twice", entry.symbol),
                ));
            }
        }

        let mut by_first_char: HashMap<char, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if let Some(first) = entry.symbol.chars().next() {
                by_first_char.entry(first).or_default().push(idx);
            }
        }
        for indices in by_first_char.values_mut() {
            indices.sort_by_key(|&idx| std::cmp::Reverse(entries[idx].symbol_len()));
        }

        Ok(Self {
            version,
            entries,
            by_first_char,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[ConfusionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&ConfusionEntry> {
        let first = symbol.chars().next()?;
        self.by_first_char
            .get(&first)?
            .iter()
            .map(|&idx| &self.entries[idx])
            .find(|entry| entry.symbol == symbol)
    }

    /// Longest entry whose symbol starts at `chars[pos]`.
    pub fn match_at(&self, chars: &[char], pos: usize) -> Option<&ConfusionEntry> {
        let candidates = self.by_first_char.get(chars.get(pos)?)?;
        candidates.iter().map(|&idx| &self.entries[idx]).find(|entry| {
            let mut rest = chars[pos..].iter();
            entry.symbol.chars().all(|c| rest.next() == Some(&c))
        })
    }
}

fn validate_entry(entry: &ConfusionEntry) -> Result<()> {
    let symbol_len = entry.symbol_len();
    if symbol_len == 0 || symbol_len > MAX_SYMBOL_CHARS {
        return Err(CleanerError::table(
            "confusion",
            format!(
                "symbol {:?} must be 1 to {} characters long",
                entry.symbol, MAX_SYMBOL_CHARS
            ),
        ));
    }
    if looks_mis_encoded(&entry.symbol) {
        return Err(CleanerError::table(
            "confusion",
            format!("symbol {:?} looks like mis-decoded UTF-8", entry.symbol),
        ));
    }
    if entry.symbol.chars().any(is_odia) {
        return Err(CleanerError::table(
            "confusion",
            format!("symbol {:?} is already Odia text", entry.symbol),
        ));
    }
    if entry.domain == SymbolDomain::Digit && !entry.symbol.chars().all(|c| c.is_ascii_digit()) {
        return Err(CleanerError::table(
            "confusion",
            format!("digit entry {:?} is not an ASCII digit", entry.symbol),
        ));
    }

    for target in std::iter::once(&entry.replacement).chain(entry.alternatives.iter()) {
        if !is_valid_target(target) {
            return Err(CleanerError::table(
                "confusion",
                format!(
                    "replacement {:?} for {:?} is not Odia text",
                    target, entry.symbol
                ),
            ));
        }
    }
    Ok(())
}

/// Empty, or made only of Odia codepoints and dandas.
pub(crate) fn is_valid_target(text: &str) -> bool {
    text.chars().all(|c| is_odia(c) || is_target_punctuation(c))
}

/// Odia UTF-8 read back as Latin-1 turns into `à¬…`/`à­…` runs; C1 controls
/// and U+FFFD are the other common residue of a bad decode.
pub(crate) fn looks_mis_encoded(text: &str) -> bool {
    let mut prev = None;
    for c in text.chars() {
        if ('\u{0080}'..='\u{009F}').contains(&c) || c == '\u{FFFD}' {
            return true;
        }
        if prev == Some('\u{00E0}') && (c == '\u{00AC}' || c == '\u{00AD}') {
            return true;
        }
        prev = Some(c);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, replacement: &str, domain: SymbolDomain) -> ConfusionEntry {
        ConfusionEntry {
            symbol: symbol.to_string(),
            replacement: replacement.to_string(),
            domain,
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn test_embedded_table_loads() {
        let model = ConfusionModel::embedded().unwrap();
        assert_eq!(model.version(), 1);
        assert!(model.len() > 40);
        assert_eq!(model.get("a").unwrap().replacement, "ଅ");
        assert_eq!(model.get("|").unwrap().replacement, "।");
        assert_eq!(model.get("×").unwrap().replacement, "");
        assert_eq!(model.get("a").unwrap().alternatives, vec!["ା".to_string()]);
    }

    #[test]
    fn test_embedded_digits_cover_all_ten() {
        let model = ConfusionModel::embedded().unwrap();
        let digits = model
            .entries()
            .iter()
            .filter(|e| e.domain == SymbolDomain::Digit)
            .count();
        assert_eq!(digits, 10);
    }

    #[test]
    fn test_match_prefers_longest_symbol() {
        let model = ConfusionModel::new(
            1,
            vec![
                entry("r", "ର", SymbolDomain::Letter),
                entry("rn", "ମ", SymbolDomain::Letter),
            ],
        )
        .unwrap();
        let chars: Vec<char> = "xrn".chars().collect();
        assert_eq!(model.match_at(&chars, 1).unwrap().symbol, "rn");
        let chars: Vec<char> = "xr".chars().collect();
        assert_eq!(model.match_at(&chars, 1).unwrap().symbol, "r");
        assert!(model.match_at(&chars, 0).is_none());
        assert!(model.match_at(&chars, 5).is_none());
    }

    #[test]
    fn test_rejects_mojibake_replacement() {
        let err = ConfusionModel::new(1, vec![entry("a", "à¬…", SymbolDomain::Letter)]).unwrap_err();
        assert!(matches!(err, CleanerError::InvalidTable { .. }));
    }

    #[test]
    fn test_rejects_mojibake_symbol() {
        assert!(looks_mis_encoded("à¬•"));
        assert!(looks_mis_encoded("a\u{0081}"));
        assert!(!looks_mis_encoded("€"));
        let err = ConfusionModel::new(1, vec![entry("à¬", "", SymbolDomain::Symbol)]).unwrap_err();
        assert!(err.to_string().contains("mis-decoded"));
    }

    #[test]
    fn test_rejects_duplicates_and_odia_symbols() {
        assert!(
            ConfusionModel::new(
                1,
                vec![
                    entry("a", "ଅ", SymbolDomain::Letter),
                    entry("a", "ା", SymbolDomain::Letter),
                ],
            )
            .is_err()
        );
        assert!(ConfusionModel::new(1, vec![entry("କ", "ଖ", SymbolDomain::Letter)]).is_err());
        assert!(ConfusionModel::new(1, vec![entry("", "ଖ", SymbolDomain::Letter)]).is_err());
        assert!(ConfusionModel::new(1, vec![entry("x", "୧", SymbolDomain::Digit)]).is_err());
    }

    #[test]
    fn test_from_toml_reports_parse_errors() {
        let err = ConfusionModel::from_toml_str("version = \"one\"").unwrap_err();
        assert!(matches!(err, CleanerError::InvalidTable { table: "confusion", .. }));
    }
}
