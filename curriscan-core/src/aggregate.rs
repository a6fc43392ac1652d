//! Per-file extraction and report assembly.
//!
//! Each file goes through the same pipeline:
//!
//! ```text
//! read once ─▶ header pre-filter ─▶ parse once ─▶ config + levels ─▶ FileRecord
//!                    │                                  │
//!                    └─ no `*Config` header: skipped    └─ malformed: both sections null
//! ```
//!
//! Files are independent, so the pipeline runs on Rayon's pool. Only an
//! unreadable file is reported as a failure, and it never stops the batch.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExtractOptions;
use crate::error::{CurriscanError, CurriscanResult, IoResultExt};
use crate::levels::levels_from_parsed;
use crate::locate::has_class_header;
use crate::params::config_from_parsed;
use crate::parse::{anchor_relative_path, normalize_path_string, ParsedSource};
use crate::report::{AggregateReport, FileRecord};

/// Maximum file size to read (10MB). Task modules are far smaller.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Settings for one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSettings {
    /// Directory name report paths are made relative to.
    pub anchor: String,
    pub options: ExtractOptions,
}

/// A file that could not be read.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: CurriscanError,
}

/// Report plus everything that did not make it in.
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    pub report: AggregateReport,
    pub failures: Vec<FileFailure>,
    /// Files read but skipped for lacking a configuration class header.
    pub skipped: usize,
}

impl AggregateOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What happened to one file.
pub(crate) enum FileOutcome {
    Record(FileRecord),
    Ineligible,
    Failed(FileFailure),
}

/// Extract both sections of one file.
///
/// A malformed class yields a record with both sections `None`.
pub fn extract_file_record(path_id: &str, source: &str, options: &ExtractOptions) -> FileRecord {
    match try_extract(source, options) {
        Ok((config, levels)) => FileRecord {
            path: path_id.to_string(),
            config,
            levels,
        },
        Err(e) => {
            let e = e.in_file(Path::new(path_id));
            tracing::warn!(
                path = %path_id,
                error = %e,
                "unparseable class; recording empty sections"
            );
            FileRecord::empty(path_id)
        }
    }
}

type Sections = (
    Option<crate::params::ConfigSection>,
    Option<crate::levels::LevelSection>,
);

fn try_extract(source: &str, options: &ExtractOptions) -> CurriscanResult<Sections> {
    let parsed = ParsedSource::parse(source)?;
    let config = config_from_parsed(&parsed, options)?;
    let levels = levels_from_parsed(&parsed, options)?;
    Ok((config, levels))
}

/// Read a file as UTF-8 text, refusing anything over [`MAX_FILE_SIZE`].
pub(crate) fn read_source(file: &Path) -> CurriscanResult<String> {
    let metadata = fs::metadata(file).with_path(file)?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(CurriscanError::io(
            file,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("file size {} exceeds {} byte limit", metadata.len(), MAX_FILE_SIZE),
            ),
        ));
    }
    fs::read_to_string(file).with_path(file)
}

/// Report key for `file`: anchored path, or the path relative to the scan
/// root's parent when the anchor does not occur.
pub fn report_key(file: &Path, root: &Path, anchor: &str) -> String {
    if let Some(key) = anchor_relative_path(file, anchor) {
        return key;
    }

    let base = root.parent().unwrap_or(root);
    let relative = file.strip_prefix(base).unwrap_or(file);
    let key = normalize_path_string(&relative.display().to_string());
    tracing::warn!(
        path = %file.display(),
        anchor = %anchor,
        key = %key,
        "anchor directory not found in path; using path relative to scan root"
    );
    key
}

/// Turn already-read text into an outcome.
pub(crate) fn outcome_for_source(
    file: &Path,
    root: &Path,
    source: &str,
    settings: &AggregateSettings,
) -> FileOutcome {
    if !has_class_header(source, &settings.options.config_suffix) {
        return FileOutcome::Ineligible;
    }
    let key = report_key(file, root, &settings.anchor);
    FileOutcome::Record(extract_file_record(&key, source, &settings.options))
}

fn process_file(file: &Path, root: &Path, settings: &AggregateSettings) -> FileOutcome {
    match read_source(file) {
        Ok(source) => outcome_for_source(file, root, &source, settings),
        Err(error) => FileOutcome::Failed(FileFailure {
            path: file.to_path_buf(),
            error,
        }),
    }
}

/// Collect per-file outcomes, in input order, into the final report.
pub(crate) fn assemble(outcomes: Vec<FileOutcome>) -> AggregateOutcome {
    let mut records = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    let mut skipped = 0;

    for outcome in outcomes {
        match outcome {
            FileOutcome::Record(record) => records.push(record),
            FileOutcome::Ineligible => skipped += 1,
            FileOutcome::Failed(failure) => {
                tracing::warn!(
                    path = %failure.path.display(),
                    error = %failure.error,
                    "skipping unreadable file"
                );
                failures.push(failure);
            }
        }
    }

    let (report, duplicates) = AggregateReport::from_records(records);
    for dup in duplicates {
        tracing::warn!(path = %dup.path, "duplicate report path; keeping the first file");
    }

    AggregateOutcome {
        report,
        failures,
        skipped,
    }
}

/// Extract every file in parallel and assemble the report.
///
/// `files` should be sorted; on duplicate report keys the earlier file wins.
pub fn aggregate_files(
    root: &Path,
    files: &[PathBuf],
    settings: &AggregateSettings,
) -> AggregateOutcome {
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| process_file(file, root, settings))
        .collect();
    assemble(outcomes)
}
