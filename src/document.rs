//! The document container boundary.
//!
//! A document is an ordered sequence of units addressed by index. The
//! cleaner reads every unit, corrects the text ones and writes results back
//! at the same index; units without text (tables, images, page breaks) read
//! as `None` and are never written.

use crate::{CleanerError, Result};
use std::path::{Path, PathBuf};

pub trait DocumentStore {
    /// Identifier used in logs and unit errors.
    fn id(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of the unit at `index`, or `None` for a unit that carries no text.
    fn read_unit(&self, index: usize) -> Result<Option<String>>;

    /// Replace the text of the unit at `index`.
    fn write_unit(&mut self, index: usize, content: &str) -> Result<()>;

    /// Remove a unit rejected by the filter. Stores that cannot delete a unit
    /// keep the default, which blanks its text.
    fn clear_unit(&mut self, index: usize) -> Result<()> {
        self.write_unit(index, "")
    }
}

/// An in-memory document. `None` units stand for non-text structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    id: String,
    units: Vec<Option<String>>,
}

impl MemoryDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            units: Vec::new(),
        }
    }

    /// One text unit per line of `text`.
    pub fn from_lines(id: impl Into<String>, text: &str) -> Self {
        Self {
            id: id.into(),
            units: text.lines().map(|line| Some(line.to_string())).collect(),
        }
    }

    pub fn push_text(&mut self, content: impl Into<String>) -> &mut Self {
        self.units.push(Some(content.into()));
        self
    }

    pub fn push_structure(&mut self) -> &mut Self {
        self.units.push(None);
        self
    }

    pub fn units(&self) -> &[Option<String>] {
        &self.units
    }

    fn slot(&mut self, index: usize) -> Result<&mut String> {
        match self.units.get_mut(index) {
            Some(Some(text)) => Ok(text),
            Some(None) => Err(CleanerError::unit(&self.id, index, "unit carries no text")),
            None => Err(CleanerError::unit(&self.id, index, "index out of range")),
        }
    }
}

impl DocumentStore for MemoryDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn len(&self) -> usize {
        self.units.len()
    }

    fn read_unit(&self, index: usize) -> Result<Option<String>> {
        match self.units.get(index) {
            Some(unit) => Ok(unit.clone()),
            None => Err(CleanerError::unit(&self.id, index, "index out of range")),
        }
    }

    fn write_unit(&mut self, index: usize, content: &str) -> Result<()> {
        let slot = self.slot(index)?;
        slot.clear();
        slot.push_str(content);
        Ok(())
    }
}

/// A plain-text file whose lines are the units. Cleared lines are left out
/// when the file is saved.
#[derive(Debug, Clone)]
pub struct LineDocument {
    path: PathBuf,
    id: String,
    lines: Vec<Option<String>>,
    trailing_newline: bool,
    bytes_read: usize,
}

impl LineDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            id: path.display().to_string(),
            lines: content.lines().map(|line| Some(line.to_string())).collect(),
            trailing_newline: content.ends_with('\n'),
            bytes_read: content.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// The surviving lines joined back into file content.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.iter().flatten().map(String::as_str).collect::<Vec<_>>().join("\n");
        if self.trailing_newline && !text.is_empty() {
            text.push('\n');
        }
        text
    }

    pub fn save(&self) -> Result<()> {
        self.save_as(&self.path)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_text())?;
        Ok(())
    }
}

impl DocumentStore for LineDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn read_unit(&self, index: usize) -> Result<Option<String>> {
        match self.lines.get(index) {
            Some(line) => Ok(line.clone()),
            None => Err(CleanerError::unit(&self.id, index, "line out of range")),
        }
    }

    fn write_unit(&mut self, index: usize, content: &str) -> Result<()> {
        match self.lines.get_mut(index) {
            Some(Some(line)) => {
                *line = content.to_string();
                Ok(())
            }
            Some(None) => Err(CleanerError::unit(&self.id, index, "line was already removed")),
            None => Err(CleanerError::unit(&self.id, index, "line out of range")),
        }
    }

    fn clear_unit(&mut self, index: usize) -> Result<()> {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = None;
                Ok(())
            }
            None => Err(CleanerError::unit(&self.id, index, "line out of range")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_document_round_trip() {
        let mut doc = MemoryDocument::new("doc");
        doc.push_text("ରୋଗ").push_structure().push_text("ଔଷଧ");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.read_unit(1).unwrap(), None);

        doc.write_unit(2, "ଔଷଧ।").unwrap();
        assert_eq!(doc.read_unit(2).unwrap().as_deref(), Some("ଔଷଧ।"));

        doc.clear_unit(0).unwrap();
        assert_eq!(doc.read_unit(0).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_memory_document_rejects_bad_writes() {
        let mut doc = MemoryDocument::new("doc");
        doc.push_structure();
        let err = doc.write_unit(0, "x").unwrap_err();
        assert!(matches!(err, CleanerError::Unit { index: 0, .. }));
        assert!(doc.write_unit(5, "x").is_err());
        assert!(doc.read_unit(5).is_err());
    }

    #[test]
    fn test_line_document_drops_cleared_lines_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "ଏକ\nnoise\nତିନି\n").unwrap();

        let mut doc = LineDocument::load(&input).unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.bytes_read(), "ଏକ\nnoise\nତିନି\n".len());
        doc.clear_unit(1).unwrap();
        assert_eq!(doc.read_unit(1).unwrap(), None);
        assert!(doc.write_unit(1, "x").is_err());

        let output = dir.path().join("nested").join("out.txt");
        doc.save_as(&output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "ଏକ\nତିନି\n");
    }

    #[test]
    fn test_line_document_missing_file() {
        let err = LineDocument::load("/nonexistent/input.txt").unwrap_err();
        assert!(matches!(err, CleanerError::Io(_)));
    }
}
