//! Incremental extraction cache using SHA-256 for robust change detection.
//!
//! Performance characteristics:
//! - Parallel file hashing and extraction via Rayon
//! - Read-once pattern: file content read once, then hashed and extracted
//! - O(changed_files) parsing work, O(1) cache lookups
//!
//! # Cache Versioning
//!
//! The cache records the curriscan version and the extraction options it was
//! built with. It is discarded when:
//! - The cache format changes
//! - The major curriscan version changes
//! - Class suffixes or attribute-call names differ from the current run

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::aggregate::{
    assemble, outcome_for_source, read_source, report_key, AggregateOutcome, AggregateSettings,
    FileFailure, FileOutcome,
};
use crate::config::ExtractOptions;
use crate::error::{CurriscanError, CurriscanResult, IoResultExt};
use crate::parse::path_to_normalized_string;
use crate::report::FileRecord;

/// Cache directory, relative to the scan root.
pub const CACHE_DIR: &str = ".curriscan";

const CACHE_FILE: &str = "cache.json";

/// Maximum cache file size (50MB) - prevents unbounded cache growth
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when cache format changes.
const CACHE_VERSION: u32 = 1;

const CURRISCAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cached extraction result of one file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedRecord {
    pub hash: String,
    /// `None` when the file had no configuration class header.
    pub record: Option<FileRecord>,
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    pub cache_version: u32,
    pub curriscan_version: String,
    /// Options the cached records were extracted with.
    #[serde(default)]
    pub options: Option<ExtractOptions>,
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Create metadata for the current build and options.
    pub fn current(options: &ExtractOptions) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            curriscan_version: CURRISCAN_VERSION.to_string(),
            options: Some(options.clone()),
            created_at,
        }
    }

    /// Whether records in this cache are valid for `options`.
    pub fn is_compatible(&self, options: &ExtractOptions) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = CURRISCAN_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.curriscan_version.split('.').next().unwrap_or("0");
        if current_major != cached_major {
            return false;
        }

        self.options.as_ref() == Some(options)
    }
}

/// The full cache model, stored in `.curriscan/cache.json`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CurriscanCache {
    #[serde(default)]
    pub metadata: CacheMetadata,
    /// Maps normalized file path to its cached record.
    pub files: HashMap<String, CachedRecord>,
}

impl CurriscanCache {
    /// Cached record for `key` if its content hash still matches.
    fn lookup(&self, key: &str, hash: &str) -> Option<&CachedRecord> {
        self.files.get(key).filter(|cached| cached.hash == hash)
    }
}

/// Compute SHA-256 hash from bytes (in-memory, no I/O).
#[inline]
fn hash_bytes(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

/// Load the cache from `.curriscan/cache.json`.
///
/// Returns `None` if the file is missing, corrupted, or was built by an
/// incompatible version or with different extraction options.
pub fn load_cache(root: &Path, options: &ExtractOptions) -> Option<CurriscanCache> {
    let path = root.join(CACHE_DIR).join(CACHE_FILE);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let cache: CurriscanCache = match serde_json::from_str(&text) {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupted cache, rebuilding");
            return None;
        }
    };

    if !cache.metadata.is_compatible(options) {
        tracing::info!(
            cached_version = %cache.metadata.curriscan_version,
            cached_format = cache.metadata.cache_version,
            current_version = CURRISCAN_VERSION,
            current_format = CACHE_VERSION,
            "cache incompatible with this run, rebuilding"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(cache)
}

/// Save the cache atomically (temp file + rename).
///
/// A cache over the size limit is deleted instead of written, and reported
/// as [`CurriscanError::Cache`].
pub fn save_cache(root: &Path, cache: &CurriscanCache) -> CurriscanResult<()> {
    let dir = root.join(CACHE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_path(&dir)?;
    }

    let path = dir.join(CACHE_FILE);
    let json = serde_json::to_string(cache)
        .map_err(|e| CurriscanError::cache(format!("serialization failed: {e}")))?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        let _ = fs::remove_file(&path);
        return Err(CurriscanError::cache(format!(
            "cache exceeds {}MB limit, cleared",
            MAX_CACHE_SIZE_BYTES / 1_000_000
        )));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{}.{}.{}.tmp", CACHE_FILE, std::process::id(), nanos));

    fs::write(&temp_path, &json).with_path(&temp_path)?;
    fs::rename(&temp_path, &path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CurriscanError::io(&path, e)
    })?;

    Ok(())
}

/// Outcome of one file plus the cache entry to keep for it.
struct CachedOutcome {
    outcome: FileOutcome,
    entry: Option<(String, CachedRecord)>,
}

/// Read, hash, and either reuse the cached record or extract afresh.
fn process_file(
    file: &Path,
    root: &Path,
    settings: &AggregateSettings,
    old_cache: Option<&CurriscanCache>,
) -> CachedOutcome {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(error) => {
            return CachedOutcome {
                outcome: FileOutcome::Failed(FileFailure {
                    path: file.to_path_buf(),
                    error,
                }),
                entry: None,
            }
        }
    };

    let key = path_to_normalized_string(file);
    let hash = hash_bytes(source.as_bytes());

    if let Some(cached) = old_cache.and_then(|c| c.lookup(&key, &hash)) {
        let outcome = match &cached.record {
            // Paths are never cached; the anchor may differ between runs.
            Some(record) => FileOutcome::Record(FileRecord {
                path: report_key(file, root, &settings.anchor),
                ..record.clone()
            }),
            None => FileOutcome::Ineligible,
        };
        return CachedOutcome {
            outcome,
            entry: Some((key, cached.clone())),
        };
    }

    let outcome = outcome_for_source(file, root, &source, settings);
    let record = match &outcome {
        FileOutcome::Record(record) => Some(record.clone()),
        _ => None,
    };
    CachedOutcome {
        outcome,
        entry: Some((key, CachedRecord { hash, record })),
    }
}

/// Incremental aggregation.
///
/// - Unchanged file hash: reuse the cached record
/// - Changed or new file: extract and refresh the cache entry
/// - Unreadable file: reported in `failures`, dropped from the cache
///
/// The cache is saved best-effort; a failed save only logs a warning.
pub fn incremental_aggregate(
    root: &Path,
    files: &[PathBuf],
    settings: &AggregateSettings,
    old_cache: Option<CurriscanCache>,
) -> AggregateOutcome {
    let results: Vec<CachedOutcome> = files
        .par_iter()
        .map(|file| process_file(file, root, settings, old_cache.as_ref()))
        .collect();

    let mut new_cache = CurriscanCache {
        metadata: CacheMetadata::current(&settings.options),
        files: HashMap::with_capacity(results.len()),
    };
    let mut outcomes = Vec::with_capacity(results.len());
    let mut hits = 0usize;

    for result in results {
        if let Some((key, entry)) = result.entry {
            if old_cache
                .as_ref()
                .and_then(|c| c.files.get(&key))
                .is_some_and(|old| old.hash == entry.hash)
            {
                hits += 1;
            }
            new_cache.files.insert(key, entry);
        }
        outcomes.push(result.outcome);
    }
    tracing::debug!(files = files.len(), cache_hits = hits, "incremental extraction done");

    if let Err(e) = save_cache(root, &new_cache) {
        tracing::warn!(error = %e, "cache save failed");
    }

    assemble(outcomes)
}
