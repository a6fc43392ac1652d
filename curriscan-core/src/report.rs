//! Report model and output formatting - JSON and plaintext.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::levels::LevelSection;
use crate::params::ConfigSection;

/// Extraction result for one file.
///
/// `path` is the report key; it is not repeated inside the serialized value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(skip)]
    pub path: String,
    /// `None` when the file has no configuration class.
    pub config: Option<ConfigSection>,
    /// `None` when the file has no curriculum class.
    pub levels: Option<LevelSection>,
}

impl FileRecord {
    /// Record with both sections absent.
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            config: None,
            levels: None,
        }
    }

    pub fn param_count(&self) -> usize {
        self.config.as_ref().map_or(0, |c| c.len())
    }

    pub fn attribute_count(&self) -> usize {
        self.levels.as_ref().map_or(0, |l| l.len())
    }
}

/// All file records keyed by normalized path, in ascending key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateReport {
    records: BTreeMap<String, FileRecord>,
}

impl AggregateReport {
    /// Build a report from records. When two records share a path the
    /// first one is kept and the rest are returned.
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> (Self, Vec<FileRecord>) {
        let mut map = BTreeMap::new();
        let mut duplicates = Vec::new();
        for record in records {
            if map.contains_key(&record.path) {
                duplicates.push(record);
            } else {
                map.insert(record.path.clone(), record);
            }
        }
        (Self { records: map }, duplicates)
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

/// Serialize the report as pretty JSON with 4-space indentation.
pub fn to_json_string(report: &AggregateReport) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    report
        .serialize(&mut ser)
        .context("Failed to serialize report")?;
    String::from_utf8(buf).context("Report serialization produced invalid UTF-8")
}

/// Write the JSON report to `path` atomically (temp file + rename).
pub fn write_report(path: &Path, report: &AggregateReport) -> Result<()> {
    let json = to_json_string(report)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "report.json".to_string());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{}.{}.{}.tmp", file_name, std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp report file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename report file to: {}", path.display())
    })?;

    Ok(())
}

/// Prints the JSON report to stdout.
pub fn print_json(report: &AggregateReport) -> Result<()> {
    println!("{}", to_json_string(report)?);
    Ok(())
}

/// Prints a short per-file summary.
pub fn print_plain(report: &AggregateReport) {
    if report.is_empty() {
        println!("No task files found.");
        return;
    }

    println!("TASK FILES ({}):", report.len());
    for record in report.iter() {
        let config = match &record.config {
            Some(c) => format!("{} params", c.len()),
            None => "no config".to_string(),
        };
        let levels = match &record.levels {
            Some(l) => {
                let unresolved = l.values().filter(|a| a.levels.is_none()).count();
                if unresolved > 0 {
                    format!("{} attributes ({} unresolved)", l.len(), unresolved)
                } else {
                    format!("{} attributes", l.len())
                }
            }
            None => "no curriculum".to_string(),
        };
        println!("- {}: {}, {}", record.path, config, levels);
    }
}
