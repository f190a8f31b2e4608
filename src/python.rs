//! Python extension module (`python` feature).

use crate::{Cleaner, CleanerError};
use lazy_static::lazy_static;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

lazy_static! {
    // Built once per interpreter; a failure is reported on every call.
    static ref CLEANER: std::result::Result<Cleaner, String> =
        Cleaner::with_defaults().map_err(|e| e.to_string());
}

fn cleaner() -> PyResult<&'static Cleaner> {
    CLEANER.as_ref().map_err(|e| PyValueError::new_err(e.clone()))
}

fn to_py_err(err: CleanerError) -> PyErr {
    match err {
        CleanerError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Clean text line by line with the default configuration
/// Returns: (cleaned_text, correction_count)
#[pyfunction]
fn clean_text(text: String) -> PyResult<(String, usize)> {
    let (cleaned, stats) = cleaner()?.clean_text(&text);
    Ok((cleaned, stats.total_corrections()))
}

/// Clean a single file, reading and writing entirely in Rust
/// Returns: (was_modified, correction_count, bytes_read)
#[pyfunction]
fn clean_file_to_file(input_path: String, output_path: String) -> PyResult<(bool, usize, usize)> {
    let report = cleaner()?
        .clean_file_to_file(&input_path, &output_path)
        .map_err(to_py_err)?;
    Ok((report.modified, report.stats.total_corrections(), report.bytes_read))
}

/// Clean many (input, output) pairs; unreadable inputs are skipped
/// Returns: the batch report as JSON
#[pyfunction]
fn clean_files_batch(pairs: Vec<(String, String)>) -> PyResult<String> {
    let pairs: Vec<(PathBuf, PathBuf)> = pairs
        .into_iter()
        .map(|(input, output)| (PathBuf::from(input), PathBuf::from(output)))
        .collect();
    let report = cleaner()?.clean_files_batch(&pairs);
    serde_json::to_string(&report).map_err(|e| to_py_err(e.into()))
}

/// Analyze OCR error patterns without changing the text
/// Returns: the analysis report as pretty JSON
#[pyfunction]
fn analyze_text(text: String) -> PyResult<String> {
    cleaner()?.analyze(&text).to_json_pretty().map_err(to_py_err)
}

#[pymodule]
fn odia_ocr_clean(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(clean_text, m)?)?;
    m.add_function(wrap_pyfunction!(clean_file_to_file, m)?)?;
    m.add_function(wrap_pyfunction!(clean_files_batch, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_text, m)?)?;
    Ok(())
}
