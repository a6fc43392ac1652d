//! curriscan CLI - aggregate task configuration and curriculum levels.
//!
//! Features:
//! - Parallel discovery and extraction of Python task modules
//! - Static evaluation of curriculum `levels` (nothing is imported or run)
//! - Sorted, reproducible JSON report
//! - Optional incremental cache for faster re-runs

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Component, Path, PathBuf};

use curriscan_core::{
    extract_file_record, init_structured_logging, load_config, log_error, log_event, log_info,
    log_warn, path_to_normalized_string, print_json, print_plain, write_report, AggregateReport,
    ClassesConfig, Curriscan, CurriscanError, CurriscanRun, ExtractOptions, OutputConfig,
};

/// Report file written when neither `-o` nor `[output] path` is given.
const DEFAULT_OUTPUT: &str = "data.json";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Extract task configuration parameters and curriculum levels from Python sources"
)]
pub struct Cli {
    /// Directory of task modules to scan
    #[arg(default_value = ".")]
    path: String,

    /// Write the JSON report to this file (relative path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Print the JSON report to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Print a plain-text summary instead of JSON
    #[arg(long)]
    plain: bool,

    /// Extract a single file and print its record
    #[arg(long, value_name = "FILE")]
    file: Option<String>,

    /// Directory name report paths are made relative to (default: scan root name)
    #[arg(long, value_name = "NAME")]
    anchor: Option<String>,

    /// File names to skip (replaces the default `composite.py`)
    #[arg(long = "exclude-file", value_name = "NAME")]
    exclude_files: Vec<String>,

    /// Directory names to skip during discovery
    #[arg(long = "exclude-dir", value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// Class-name suffix of configuration classes
    #[arg(long, value_name = "SUFFIX")]
    config_suffix: Option<String>,

    /// Class-name suffix of curriculum classes
    #[arg(long, value_name = "SUFFIX")]
    curriculum_suffix: Option<String>,

    /// Reuse unchanged results from .curriscan/cache.json
    #[arg(long)]
    cache: bool,
}

/// Where the report goes.
#[derive(Debug, PartialEq, Eq)]
enum OutputMode {
    Plain,
    Stdout,
    File(PathBuf),
}

/// Security: Validates output file paths to prevent path traversal attacks.
///
/// Rejects:
/// - Paths with null bytes
/// - Absolute paths (must be relative to current directory)
/// - Paths containing `..`
fn validate_output_path(path: &str) -> Result<PathBuf, CurriscanError> {
    if path.contains('\0') {
        return Err(CurriscanError::security("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(CurriscanError::security(format!(
            "Output path must be relative, not absolute: {}",
            path
        )));
    }

    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(CurriscanError::security(format!(
            "Path traversal (..) not allowed in output paths: {}",
            path
        )));
    }

    // Backslash-separated traversal on platforms that don't split on `\`.
    let normalized = path.replace('\\', "/");
    if normalized.split('/').any(|part| part == "..") {
        return Err(CurriscanError::security(format!(
            "Path traversal attempt detected: {}",
            path
        )));
    }

    Ok(p)
}

/// Flags win over the `[output]` table, which wins over the default file.
fn resolve_output_mode(cli: &Cli, config: Option<&OutputConfig>) -> Result<OutputMode> {
    if cli.plain {
        return Ok(OutputMode::Plain);
    }
    if cli.stdout {
        return Ok(OutputMode::Stdout);
    }
    if let Some(path) = &cli.output {
        return Ok(OutputMode::File(validate_output_path(path)?));
    }

    let config = config.cloned().unwrap_or_default();
    if config.format.as_deref() == Some("plain") {
        return Ok(OutputMode::Plain);
    }
    let path = config.path.as_deref().unwrap_or(DEFAULT_OUTPUT);
    Ok(OutputMode::File(validate_output_path(path)?))
}

/// Flags win over the `[classes]` table, which wins over the defaults.
fn extract_options(cli: &Cli, classes: Option<&ClassesConfig>) -> ExtractOptions {
    let mut options = match classes {
        Some(classes) => ExtractOptions::default().merged_with(classes),
        None => ExtractOptions::default(),
    };
    if let Some(suffix) = &cli.config_suffix {
        options.config_suffix = suffix.clone();
    }
    if let Some(suffix) = &cli.curriculum_suffix {
        options.curriculum_suffix = suffix.clone();
    }
    options
}

fn builder_from_cli(cli: &Cli) -> Curriscan {
    let mut builder = Curriscan::new(&cli.path)
        .exclude_dirs(cli.exclude_dirs.iter().cloned())
        .with_cache(cli.cache);
    if let Some(anchor) = &cli.anchor {
        builder = builder.anchor(anchor.clone());
    }
    if !cli.exclude_files.is_empty() {
        builder = builder.exclude_files(cli.exclude_files.iter().cloned());
    }
    if let Some(suffix) = &cli.config_suffix {
        builder = builder.config_suffix(suffix.clone());
    }
    if let Some(suffix) = &cli.curriculum_suffix {
        builder = builder.curriculum_suffix(suffix.clone());
    }
    builder
}

/// Single-file mode: one record keyed by the path as given. Class settings
/// come from `curriscan.toml` in PATH, as in directory mode.
fn run_single_file(cli: &Cli, file: &str) -> Result<()> {
    let file_config = load_config(Path::new(&cli.path))
        .with_context(|| format!("Failed to load config from {}", cli.path))?
        .unwrap_or_default();
    let options = extract_options(cli, file_config.classes.as_ref());

    let path = Path::new(file);
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let record = extract_file_record(&path_to_normalized_string(path), &source, &options);

    if cli.plain {
        let (report, _) = AggregateReport::from_records([record]);
        print_plain(&report);
        return Ok(());
    }

    let json_output = serde_json::json!({
        "path": record.path,
        "config": record.config,
        "levels": record.levels,
    });
    println!("{}", serde_json::to_string_pretty(&json_output)?);
    Ok(())
}

fn emit(cli: &Cli, run: &CurriscanRun) -> Result<()> {
    let report = &run.outcome.report;
    match resolve_output_mode(cli, run.output.as_ref())? {
        OutputMode::Plain => print_plain(report),
        OutputMode::Stdout => print_json(report)?,
        OutputMode::File(path) => {
            write_report(&path, report)?;
            log_event(
                "REPORT_WRITTEN",
                &format!("{} records -> {}", report.len(), path.display()),
            );
            eprintln!("Wrote {} records to {}", report.len(), path.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] curriscan internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    init_structured_logging();

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");

    if let Some(file) = &cli.file {
        return run_single_file(&cli, file);
    }

    // Fail on a bad output path before doing any work.
    if let Some(path) = &cli.output {
        validate_output_path(path)?;
    }

    let run = builder_from_cli(&cli)
        .run()
        .with_context(|| format!("Failed to scan {}", cli.path))?;

    if run.outcome.report.is_empty() {
        log_warn(&format!(
            "no files with a `{}` class under {}",
            run.settings.options.config_suffix,
            run.root.display()
        ));
    } else {
        log_info(&format!(
            "{} records from {} candidate files",
            run.outcome.report.len(),
            run.candidates
        ));
    }

    emit(&cli, &run)?;

    for failure in &run.outcome.failures {
        log_error(&format!("{}: {}", failure.path.display(), failure.error));
        eprintln!("ERROR: could not read {}: {}", failure.path.display(), failure.error);
    }
    std::process::exit(if run.has_failures() { 1 } else { 0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("curriscan_cli_test")
            .join(format!("{}_{}_{}", std::process::id(), id, name));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["curriscan"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    // --- validate_output_path TESTS ---

    #[test]
    fn test_validate_output_path_accepts_relative() {
        assert_eq!(
            validate_output_path("reports/data.json").unwrap(),
            PathBuf::from("reports/data.json")
        );
        assert!(validate_output_path("data.json").is_ok());
    }

    #[test]
    fn test_validate_output_path_rejects_absolute() {
        let err = validate_output_path("/tmp/data.json").unwrap_err();
        assert!(matches!(err, CurriscanError::Security { .. }));
    }

    #[test]
    fn test_validate_output_path_rejects_traversal() {
        assert!(validate_output_path("../data.json").is_err());
        assert!(validate_output_path("reports/../../data.json").is_err());
        assert!(validate_output_path("reports\\..\\data.json").is_err());
    }

    #[test]
    fn test_validate_output_path_rejects_null_bytes() {
        assert!(validate_output_path("data\0.json").is_err());
    }

    // --- argument parsing TESTS ---

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.path, ".");
        assert!(cli.output.is_none());
        assert!(!cli.cache);
        assert_eq!(
            resolve_output_mode(&cli, None).unwrap(),
            OutputMode::File(PathBuf::from(DEFAULT_OUTPUT))
        );
    }

    #[test]
    fn test_repeated_excludes() {
        let cli = parse(&[
            "tasks",
            "--exclude-file",
            "composite.py",
            "--exclude-file",
            "registry.py",
            "--exclude-dir",
            "fixtures",
        ]);
        assert_eq!(cli.path, "tasks");
        assert_eq!(cli.exclude_files, vec!["composite.py", "registry.py"]);
        assert_eq!(cli.exclude_dirs, vec!["fixtures"]);
    }

    #[test]
    fn test_output_mode_precedence() {
        let config = OutputConfig {
            path: Some("from_config.json".to_string()),
            format: None,
        };

        let cli = parse(&["-o", "flag.json"]);
        assert_eq!(
            resolve_output_mode(&cli, Some(&config)).unwrap(),
            OutputMode::File(PathBuf::from("flag.json"))
        );

        let cli = parse(&[]);
        assert_eq!(
            resolve_output_mode(&cli, Some(&config)).unwrap(),
            OutputMode::File(PathBuf::from("from_config.json"))
        );

        let cli = parse(&["--stdout", "-o", "flag.json"]);
        assert_eq!(resolve_output_mode(&cli, Some(&config)).unwrap(), OutputMode::Stdout);

        let cli = parse(&["--plain"]);
        assert_eq!(resolve_output_mode(&cli, None).unwrap(), OutputMode::Plain);

        let plain_config = OutputConfig {
            path: None,
            format: Some("plain".to_string()),
        };
        let cli = parse(&[]);
        assert_eq!(
            resolve_output_mode(&cli, Some(&plain_config)).unwrap(),
            OutputMode::Plain
        );
    }

    #[test]
    fn test_config_output_path_is_validated() {
        let config = OutputConfig {
            path: Some("/etc/data.json".to_string()),
            format: None,
        };
        assert!(resolve_output_mode(&parse(&[]), Some(&config)).is_err());
    }

    #[test]
    fn test_suffix_flags_reach_options() {
        let cli = parse(&["--config-suffix", "Settings", "--curriculum-suffix", "Levels"]);
        let options = extract_options(&cli, None);
        assert_eq!(options.config_suffix, "Settings");
        assert_eq!(options.curriculum_suffix, "Levels");
        assert_eq!(
            options.attribute_calls,
            ExtractOptions::default().attribute_calls
        );
    }

    #[test]
    fn test_single_file_options_follow_config_file() {
        let root = create_temp_dir("single_file_config");
        create_file(
            &root,
            "curriscan.toml",
            "[classes]\nconfig_suffix = \"Settings\"\nattribute_calls = [\"Level\"]\n",
        );
        let config = load_config(&root).unwrap().unwrap();

        let root_arg = root.to_string_lossy().to_string();
        let cli = parse(&[root_arg.as_str(), "--file", "task.py"]);
        let options = extract_options(&cli, config.classes.as_ref());
        assert_eq!(options.config_suffix, "Settings");
        assert_eq!(options.curriculum_suffix, "Curriculum");
        assert_eq!(options.attribute_calls, vec!["Level".to_string()]);

        let cli = parse(&[root_arg.as_str(), "--config-suffix", "Params"]);
        let options = extract_options(&cli, config.classes.as_ref());
        assert_eq!(options.config_suffix, "Params");

        fs::remove_dir_all(&root).ok();
    }

    // --- end-to-end TESTS ---

    #[test]
    fn test_cli_run_over_task_tree() {
        let root = create_temp_dir("reasoning_gym");
        create_file(
            &root,
            "games/maze.py",
            r#"from dataclasses import dataclass

@dataclass
class MazeConfig:
    size: int = 5  # grid size
    seed: Optional[int] = None

class MazeCurriculum(BaseCurriculum):
    def __init__(self):
        self._define_attributes(
            RangeAttributeDefinition(name="size", levels=[5, 10, 20]),
        )
"#,
        );
        create_file(&root, "games/composite.py", "class CompositeConfig:\n    x: int = 1\n");
        create_file(&root, "games/helpers.py", "def helper():\n    return 1\n");

        let root_arg = root.to_string_lossy().to_string();
        let cli = parse(&[root_arg.as_str(), "--stdout"]);
        let run = builder_from_cli(&cli).run().unwrap();

        assert!(!run.has_failures());
        assert_eq!(run.outcome.report.len(), 1);

        let key = format!(
            "{}/games/maze.py",
            root.file_name().unwrap().to_string_lossy()
        );
        let record = run.outcome.report.get(&key).unwrap();
        let config = record.config.as_ref().unwrap();
        assert_eq!(config["size"].value_expr.as_deref(), Some("5"));
        assert_eq!(config["seed"].type_expr.as_deref(), Some("Optional[int]"));
        assert_eq!(record.attribute_count(), 1);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_cli_exclude_file_replaces_default() {
        let root = create_temp_dir("tasks");
        create_file(&root, "composite.py", "class CompositeConfig:\n    x: int = 1\n");
        create_file(&root, "registry.py", "class RegistryConfig:\n    y: int = 2\n");

        let root_arg = root.to_string_lossy().to_string();
        let cli = parse(&[root_arg.as_str(), "--exclude-file", "registry.py"]);
        let run = builder_from_cli(&cli).run().unwrap();

        let paths: Vec<&str> = run.outcome.report.paths().collect();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("composite.py"));

        fs::remove_dir_all(&root).ok();
    }
}
