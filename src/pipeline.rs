//! The cleaner: normalizer, pattern rules, vocabulary and filter in sequence.
//!
//! Tables and compiled rules are built once in [`Cleaner::new`] and shared
//! read-only, so units and files can be processed on the rayon pool. Every
//! counter lives in the [`RunStats`] returned by the call that produced it.

use crate::analyzer::{AnalysisReport, ErrorAnalyzer};
use crate::config::CleanerConfig;
use crate::confusion::ConfusionModel;
use crate::document::{DocumentStore, LineDocument};
use crate::filter::{LineFilter, TextUnit};
use crate::normalizer::CharacterNormalizer;
use crate::patterns::{PatternCorrector, RuleCount};
use crate::vocabulary::{Vocabulary, VocabularyCorrector};
use crate::{CleanerError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Corrections applied to a single unit, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub text: String,
    pub character_corrections: usize,
    pub pattern_counts: Vec<RuleCount>,
    pub vocabulary_corrections: usize,
}

impl UnitOutcome {
    pub fn total_corrections(&self) -> usize {
        self.character_corrections
            + self.pattern_counts.iter().map(|c| c.count).sum::<usize>()
            + self.vocabulary_corrections
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub units_total: usize,
    pub units_processed: usize,
    pub units_changed: usize,
    pub units_dropped: usize,
    /// Whitespace-only units and units without text.
    pub units_skipped: usize,
    /// Units that could not be read.
    pub units_failed: usize,
    pub chars_before: usize,
    pub chars_after: usize,
    pub character_corrections: usize,
    /// Matches rewritten, by rule name.
    pub pattern_corrections: BTreeMap<String, usize>,
    pub vocabulary_corrections: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &UnitOutcome) {
        self.units_processed += 1;
        self.character_corrections += outcome.character_corrections;
        self.vocabulary_corrections += outcome.vocabulary_corrections;
        for count in outcome.pattern_counts.iter().filter(|c| c.count > 0) {
            *self.pattern_corrections.entry(count.rule.name().into_owned()).or_insert(0) += count.count;
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.units_total += other.units_total;
        self.units_processed += other.units_processed;
        self.units_changed += other.units_changed;
        self.units_dropped += other.units_dropped;
        self.units_skipped += other.units_skipped;
        self.units_failed += other.units_failed;
        self.chars_before += other.chars_before;
        self.chars_after += other.chars_after;
        self.character_corrections += other.character_corrections;
        self.vocabulary_corrections += other.vocabulary_corrections;
        for (rule, count) in &other.pattern_corrections {
            *self.pattern_corrections.entry(rule.clone()).or_insert(0) += count;
        }
    }

    pub fn pattern_total(&self) -> usize {
        self.pattern_corrections.values().sum()
    }

    pub fn total_corrections(&self) -> usize {
        self.character_corrections + self.pattern_total() + self.vocabulary_corrections
    }
}

/// Result of cleaning a batch of units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitsOutcome {
    /// Corrected units that passed the filter, in index order.
    pub kept: Vec<TextUnit>,
    pub dropped: Vec<usize>,
    /// Whitespace-only units, left untouched.
    pub skipped: Vec<usize>,
    pub stats: RunStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub modified: bool,
    pub bytes_read: usize,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// Inputs that could not be cleaned, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    pub totals: RunStats,
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    config: CleanerConfig,
    normalizer: CharacterNormalizer,
    patterns: Arc<PatternCorrector>,
    vocabulary: VocabularyCorrector,
    filter: LineFilter,
    analyzer: ErrorAnalyzer,
}

impl Cleaner {
    /// Validate `config`, load the tables and compile the rules.
    pub fn new(config: CleanerConfig) -> Result<Self> {
        config.validate()?;

        let model = Arc::new(match &config.confusion_table {
            Some(path) => ConfusionModel::from_file(path)?,
            None => ConfusionModel::embedded()?,
        });
        let vocabulary = Arc::new(match &config.vocabulary_table {
            Some(path) => Vocabulary::from_file(path)?,
            None => Vocabulary::embedded()?,
        });
        let patterns = Arc::new(PatternCorrector::new(&config.extra_rules)?);

        info!(
            confusion_version = model.version(),
            confusion_entries = model.len(),
            vocabulary_version = vocabulary.version(),
            vocabulary_entries = vocabulary.len(),
            rules = patterns.rules().len(),
            "cleaner ready"
        );

        Ok(Self {
            normalizer: CharacterNormalizer::new(Arc::clone(&model), config.normalizer.clone()),
            vocabulary: VocabularyCorrector::new(vocabulary, config.vocabulary.clone()),
            filter: LineFilter::new(config.filter.clone()),
            analyzer: ErrorAnalyzer::new(model, Arc::clone(&patterns), config.analyzer.clone()),
            patterns,
            config,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(CleanerConfig::default())
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &CharacterNormalizer {
        &self.normalizer
    }

    pub fn patterns(&self) -> &PatternCorrector {
        &self.patterns
    }

    pub fn vocabulary(&self) -> &VocabularyCorrector {
        &self.vocabulary
    }

    pub fn filter(&self) -> &LineFilter {
        &self.filter
    }

    /// Correct one unit. Whitespace-only input is treated as absent.
    pub fn clean_unit(&self, content: &str) -> Option<UnitOutcome> {
        if content.trim().is_empty() {
            return None;
        }

        let normalized = self.normalizer.normalize(content);
        let patterned = self.patterns.apply(&normalized.text);
        let (text, vocabulary_corrections) = if self.config.vocabulary.enabled {
            let corrected = self.vocabulary.correct(&patterned.text);
            (corrected.text, corrected.replacements)
        } else {
            (patterned.text, 0)
        };

        Some(UnitOutcome {
            text: text.trim().to_string(),
            character_corrections: normalized.corrections,
            pattern_counts: patterned.counts,
            vocabulary_corrections,
        })
    }

    /// Correct and filter `units`, keeping their indices.
    pub fn clean_units(&self, units: Vec<TextUnit>) -> UnitsOutcome {
        let correct = |unit: TextUnit| {
            let outcome = self.clean_unit(&unit.content);
            (unit, outcome)
        };
        let results: Vec<(TextUnit, Option<UnitOutcome>)> = if self.config.parallel {
            units.into_par_iter().map(correct).collect()
        } else {
            units.into_iter().map(correct).collect()
        };

        let mut stats = RunStats {
            units_total: results.len(),
            ..RunStats::default()
        };
        let mut skipped = Vec::new();
        let mut corrected = Vec::with_capacity(results.len());
        let mut originals = HashMap::new();

        for (unit, outcome) in results {
            let Some(outcome) = outcome else {
                stats.units_skipped += 1;
                skipped.push(unit.index);
                continue;
            };
            stats.record(&outcome);
            stats.chars_before += unit.content.chars().count();
            corrected.push(TextUnit::new(unit.index, outcome.text));
            originals.insert(unit.index, unit.content);
        }

        let filtered = self.filter.filter_units(corrected);
        stats.units_dropped = filtered.dropped.len();
        for unit in &filtered.kept {
            stats.chars_after += unit.content.chars().count();
            if originals.get(&unit.index) != Some(&unit.content) {
                stats.units_changed += 1;
            }
        }

        UnitsOutcome {
            kept: filtered.kept,
            dropped: filtered.dropped,
            skipped,
            stats,
        }
    }

    /// Clean text whose lines are the units. Dropped lines are removed and
    /// whitespace-only lines are kept as they are.
    pub fn clean_text(&self, text: &str) -> (String, RunStats) {
        let units: Vec<TextUnit> = text
            .lines()
            .enumerate()
            .map(|(index, line)| TextUnit::new(index, line))
            .collect();
        let outcome = self.clean_units(units);

        let mut lines: BTreeMap<usize, &str> = outcome
            .kept
            .iter()
            .map(|unit| (unit.index, unit.content.as_str()))
            .collect();
        let skipped: HashSet<usize> = outcome.skipped.iter().copied().collect();
        for (index, line) in text.lines().enumerate() {
            if skipped.contains(&index) {
                lines.insert(index, line);
            }
        }

        let cleaned = lines.into_values().collect::<Vec<_>>().join("\n");
        (cleaned, outcome.stats)
    }

    /// Clean every text unit of `document` in place.
    ///
    /// Unreadable units are logged and counted, and processing continues.
    /// A failed write stops the run with a [`CleanerError::Unit`] naming the
    /// unit; units before it have already been written.
    #[instrument(skip_all, fields(document = %document.id()))]
    pub fn clean_document(&self, document: &mut dyn DocumentStore) -> Result<RunStats> {
        let id = document.id().to_string();
        let mut units = Vec::new();
        let mut structural = 0;
        let mut failed = 0;

        for index in 0..document.len() {
            match document.read_unit(index) {
                Ok(Some(content)) => units.push(TextUnit::new(index, content)),
                Ok(None) => structural += 1,
                Err(e) => {
                    warn!(index, error = %e, "unit unreadable, skipped");
                    failed += 1;
                }
            }
        }

        let originals: HashMap<usize, String> = units.iter().map(|u| (u.index, u.content.clone())).collect();
        let outcome = self.clean_units(units);

        let mut writes: Vec<(usize, Option<&str>)> = outcome
            .kept
            .iter()
            .filter(|unit| originals.get(&unit.index) != Some(&unit.content))
            .map(|unit| (unit.index, Some(unit.content.as_str())))
            .chain(outcome.dropped.iter().map(|&index| (index, None)))
            .collect();
        writes.sort_by_key(|&(index, _)| index);

        for (index, content) in writes {
            let written = match content {
                Some(text) => document.write_unit(index, text),
                None => document.clear_unit(index),
            };
            written.map_err(|e| match e {
                unit @ CleanerError::Unit { .. } => unit,
                other => CleanerError::unit(id.as_str(), index, other.to_string()),
            })?;
            debug!(index, dropped = content.is_none(), "unit written");
        }

        let mut stats = outcome.stats;
        stats.units_total += structural + failed;
        stats.units_skipped += structural;
        stats.units_failed += failed;

        info!(
            units = stats.units_total,
            changed = stats.units_changed,
            dropped = stats.units_dropped,
            failed = stats.units_failed,
            corrections = stats.total_corrections(),
            "document cleaned"
        );
        Ok(stats)
    }

    /// Clean a plain-text file line by line into `output`, creating parent
    /// directories. Dropped lines are left out of the output.
    pub fn clean_file_to_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<FileReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let mut document = LineDocument::load(input)?;
        let stats = self.clean_document(&mut document)?;
        document.save_as(output)?;

        Ok(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            modified: stats.units_changed > 0 || stats.units_dropped > 0,
            bytes_read: document.bytes_read(),
            stats,
        })
    }

    /// Clean many `(input, output)` pairs. A file that fails is recorded and
    /// the rest carry on.
    pub fn clean_files_batch(&self, pairs: &[(PathBuf, PathBuf)]) -> BatchReport {
        let run = |(input, output): &(PathBuf, PathBuf)| {
            self.clean_file_to_file(input, output)
                .map_err(|e| (input.clone(), e))
        };
        let results: Vec<std::result::Result<FileReport, (PathBuf, CleanerError)>> = if self.config.parallel {
            pairs.par_iter().map(run).collect()
        } else {
            pairs.iter().map(run).collect()
        };

        let mut report = BatchReport::default();
        for result in results {
            match result {
                Ok(file) => {
                    report.totals.merge(&file.stats);
                    report.files.push(file);
                }
                Err((input, e)) => {
                    warn!(input = %input.display(), error = %e, "file skipped");
                    report.failed.push((input, e.to_string()));
                }
            }
        }

        info!(
            files = report.files.len(),
            failed = report.failed.len(),
            corrections = report.totals.total_corrections(),
            "batch cleaned"
        );
        report
    }

    /// Diagnose `text` without changing it.
    pub fn analyze(&self, text: &str) -> AnalysisReport {
        self.analyzer.analyze(text)
    }
}
