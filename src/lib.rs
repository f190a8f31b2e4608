//! Rule-based post-OCR correction for Odia text.
//!
//! Raw OCR output goes through four stages, in order: context-gated
//! replacement of confusion symbols, ordered regex rules, known-vocabulary
//! fixes and a script-ratio filter that drops units which are mostly noise.
//! A separate analyzer reports on error patterns without changing the text.
//!
//! ```
//! use odia_ocr_clean::Cleaner;
//!
//! let cleaner = Cleaner::with_defaults()?;
//! let (cleaned, stats) = cleaner.clean_text("ଭ ି ଷ ପ 123");
//! assert_eq!(cleaned, "ଭିଷପ ୧୨୩");
//! println!("{} corrections", stats.total_corrections());
//! # Ok::<(), odia_ocr_clean::CleanerError>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod confusion;
pub mod document;
pub mod error;
pub mod filter;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod script;
pub mod vocabulary;

#[cfg(feature = "python")]
mod python;

pub use analyzer::{AnalysisReport, CorrectionRecommendation, ErrorAnalyzer, ErrorCategoryKind, Priority, ReviewItem};
pub use config::{AnalyzerConfig, CleanerConfig, FilterConfig, MatchMode, NormalizerConfig, RuleConfig, VocabularyConfig};
pub use confusion::{ConfusionEntry, ConfusionModel, SymbolDomain};
pub use document::{DocumentStore, LineDocument, MemoryDocument};
pub use error::{CleanerError, Result};
pub use filter::{LineFilter, TextUnit, UnitDecision};
pub use normalizer::CharacterNormalizer;
pub use patterns::{PatternCorrector, PatternRule, RuleId};
pub use pipeline::{BatchReport, Cleaner, FileReport, RunStats, UnitOutcome};
pub use vocabulary::{Vocabulary, VocabularyCorrector, VocabularyEntry};
