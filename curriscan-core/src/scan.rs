//! Parallel, deterministic discovery of Python task files.
//!
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel entry filtering via Rayon's `par_bridge`
//! - Sorted output, so every later stage sees the same order

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::aggregate::FileFailure;
use crate::error::CurriscanError;

/// Directories never descended into.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    ".tox",
    ".mypy_cache",
    ".curriscan",
];

/// Package markers carry no task definitions.
const PACKAGE_MARKER: &str = "__init__.py";

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Discovered files plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// `.py` files, sorted.
    pub files: Vec<PathBuf>,
    /// Unreadable directories or entries below the root, sorted by path.
    pub failures: Vec<FileFailure>,
}

/// Gathers all `.py` files under `root`, skipping default and extra
/// directory names.
///
/// Only an unreadable root is an error. Anything below it that cannot be
/// read is logged and returned in [`Discovery::failures`].
pub fn gather_py_files(root: &Path, exclude_dirs: &[&str]) -> Result<Discovery> {
    let excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(exclude_dirs.iter().copied())
        .collect();

    let entries: Vec<Result<PathBuf, walkdir::Error>> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e)),
        })
        .collect();

    let mut discovery = Discovery::default();
    for entry in entries {
        match entry {
            Ok(path) => discovery.files.push(path),
            Err(e) if e.depth() == 0 => {
                return Err(e)
                    .with_context(|| format!("Failed to gather .py files from {}", root.display()));
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping unreadable directory entry"
                );
                discovery.failures.push(FileFailure {
                    error: CurriscanError::io(&path, std::io::Error::from(e)),
                    path,
                });
            }
        }
    }

    discovery.files.sort();
    discovery.failures.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(discovery)
}

/// Whether a discovered file should be analyzed at all.
///
/// `__init__.py` is always skipped; `exclude_files` are exact file names.
pub fn is_candidate(path: &Path, exclude_files: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name != PACKAGE_MARKER && !exclude_files.iter().any(|excluded| excluded == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn create_test_tree() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "curriscan_scan_test_{}_{}",
            std::process::id(),
            id
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }

        // tasks/
        //   __init__.py
        //   composite.py
        //   arithmetic/sum.py
        //   games/maze.py
        //   games/notes.txt
        //   __pycache__/sum.py
        //   fixtures/fake.py
        let tasks = dir.join("tasks");
        fs::create_dir_all(tasks.join("arithmetic")).unwrap();
        fs::create_dir_all(tasks.join("games")).unwrap();
        fs::create_dir_all(tasks.join("__pycache__")).unwrap();
        fs::create_dir_all(tasks.join("fixtures")).unwrap();

        fs::write(tasks.join("__init__.py"), "").unwrap();
        fs::write(tasks.join("composite.py"), "").unwrap();
        fs::write(tasks.join("arithmetic/sum.py"), "x = 1\n").unwrap();
        fs::write(tasks.join("games/maze.py"), "x = 2\n").unwrap();
        fs::write(tasks.join("games/notes.txt"), "notes").unwrap();
        fs::write(tasks.join("__pycache__/sum.py"), "").unwrap();
        fs::write(tasks.join("fixtures/fake.py"), "").unwrap();

        dir
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_gather_prunes_default_dirs_and_sorts() {
        let dir = create_test_tree();
        let files = gather_py_files(&dir, &[]).unwrap().files;
        assert_eq!(
            names(&files, &dir),
            vec![
                "tasks/__init__.py",
                "tasks/arithmetic/sum.py",
                "tasks/composite.py",
                "tasks/fixtures/fake.py",
                "tasks/games/maze.py",
            ]
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_gather_with_custom_excludes() {
        let dir = create_test_tree();
        let files = gather_py_files(&dir, &["fixtures"]).unwrap().files;
        assert!(!names(&files, &dir).iter().any(|f| f.contains("fixtures")));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_excluded_name_as_root_is_still_scanned() {
        let dir = create_test_tree();
        let fixtures = dir.join("tasks/fixtures");
        let files = gather_py_files(&fixtures, &["fixtures"]).unwrap().files;
        assert_eq!(files.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_gather_missing_root_is_error() {
        let missing = std::env::temp_dir().join("curriscan_scan_missing_dir_xyz");
        assert!(gather_py_files(&missing, &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_does_not_stop_discovery() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_tree();
        let locked = dir.join("tasks/locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.py"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            fs::remove_dir_all(&dir).ok();
            return;
        }

        let discovery = gather_py_files(&dir, &[]).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let found = names(&discovery.files, &dir);
        assert!(found.contains(&"tasks/arithmetic/sum.py".to_string()));
        assert!(found.contains(&"tasks/games/maze.py".to_string()));
        assert!(!found.iter().any(|f| f.contains("locked")));
        assert_eq!(discovery.failures.len(), 1);
        assert_eq!(discovery.failures[0].path, locked);
        assert!(matches!(discovery.failures[0].error, CurriscanError::Io { .. }));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_is_candidate() {
        let excludes = vec!["composite.py".to_string()];
        assert!(is_candidate(Path::new("tasks/sum.py"), &excludes));
        assert!(!is_candidate(Path::new("tasks/__init__.py"), &excludes));
        assert!(!is_candidate(Path::new("tasks/composite.py"), &excludes));
        assert!(is_candidate(Path::new("tasks/composite_sum.py"), &excludes));
        assert!(is_candidate(Path::new("tasks/composite.py"), &[]));
    }
}
