//! Command-line interface module for orgafold.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and resolution into an immutable [`RunOptions`]
//! - The per-root process loop (analysis, dry run, real run)
//! - Presentation of outcomes and the final summary

use crate::analysis::{AnalysisReport, analyse};
use crate::classifier::TargetSpec;
use crate::config::{CompiledFilters, FilterRules, OrgafoldConfig};
use crate::error::{OrganizeError, OrganizeResult};
use crate::merger::{MergeOutcome, Merger};
use crate::output::OutputFormatter;
use crate::report::{FailureRecord, RunReport};
use crate::rules::{Dimension, RuleConfig, TransferMode};
use crate::traversal::{self, Candidate};
use clap::Parser;
use indicatif::ProgressBar;
use log::{error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Quickly navigate through a high number of files, perhaps obtained after a
/// disk recovery.
///
/// Every input directory is expanded and merged into a target directory,
/// classified by the requested rules. Existing files are never overwritten:
/// a clashing name gets a counter, `file (2).ext`.
///
///   /src/blah1/file1     -> /target/2019/file1
///   /src/blah1/file2     -> /target/2019/file2
///   /src/blah2/file1     -> /target/2019/file1 (2)
///   /src/blah2/foo/file3 -> /target/2019/foo/file3
///
/// Symlinks are never transferred.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "orgafold", version, verbatim_doc_comment)]
pub struct Cli {
    /// Directories to merge. Read from stdin, one per line, when omitted.
    pub inputs: Vec<PathBuf>,

    /// Directory to merge into. Defaults to each input directory itself.
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Classify by lowercase file suffix, falling back to MIME type.
    /// Ignored when a MIME rule is given.
    #[arg(long)]
    pub suffix: bool,

    /// Classify by modification year.
    #[arg(long)]
    pub year: bool,

    /// Classify by modification month, nested under the year.
    #[arg(long)]
    pub month: bool,

    /// Classify by MIME type part (`image`).
    #[arg(long)]
    pub mime: bool,

    /// Classify by MIME subtype part (`gif`).
    #[arg(long)]
    pub subtype: bool,

    /// Classify by whole MIME type (`image_gif`).
    #[arg(long = "mime-type")]
    pub mime_type: bool,

    /// Descend into subdirectories, keeping their nesting below the bucket.
    #[arg(long, short = 'r')]
    pub recursive: bool,

    /// Perform the operation.
    #[arg(long)]
    pub run: bool,

    /// Dry run only: print what would happen. Wins over --run.
    #[arg(long)]
    pub dry: bool,

    /// Move files instead of copying them.
    #[arg(long = "move")]
    pub move_files: bool,

    /// Copy files (the default).
    #[arg(long)]
    pub copy: bool,

    /// Print an analysis of the inputs. On by default unless --run or --dry.
    #[arg(long)]
    pub analyse: bool,

    /// Configuration file. Defaults to .orgafoldrc.toml or ~/.config/orgafold/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a JSON report of every outcome to this file.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Rule flags given on the command line.
    pub fn rules(&self) -> RuleConfig {
        RuleConfig {
            by_suffix: self.suffix,
            by_year: self.year,
            by_month: self.month,
            by_mime_type: self.mime,
            by_mime_subtype: self.subtype,
            by_full_mime_type: self.mime_type,
        }
    }

    /// Loads the configuration file and resolves the final options.
    pub fn load_options(&self) -> OrganizeResult<RunOptions> {
        let config = OrgafoldConfig::load(self.config.as_deref())?;
        self.resolve(&config)
    }

    /// Combines command-line flags with configuration defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigConflict` when both `--move` and `--copy` are given, and
    /// a configuration error when the filters do not compile.
    pub fn resolve(&self, config: &OrgafoldConfig) -> OrganizeResult<RunOptions> {
        if self.move_files && self.copy {
            return Err(OrganizeError::ConfigConflict {
                reason: "Cannot move and copy together.".to_string(),
            });
        }
        config.filters.compile()?;

        let mut rules = self.rules();
        if rules.is_empty() {
            rules = RuleConfig::from_dimensions(&config.defaults.classify);
        }

        let transfer = if self.move_files {
            TransferMode::Move
        } else if self.copy {
            TransferMode::Copy
        } else {
            config.defaults.transfer.unwrap_or_default()
        };

        let mode = if self.dry {
            ExecutionMode::DryRun
        } else if self.run {
            ExecutionMode::Run
        } else {
            ExecutionMode::Analyse
        };

        Ok(RunOptions {
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            rules,
            recursive: self.recursive || config.defaults.recursive,
            analyse: self.analyse || mode == ExecutionMode::Analyse,
            mode,
            transfer,
            filters: config.filters.clone(),
            report: self.report.clone(),
        })
    }
}

/// Reads input paths, one per line, skipping blank lines.
pub fn read_inputs(reader: impl BufRead) -> io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            inputs.push(PathBuf::from(line));
        }
    }
    Ok(inputs)
}

/// What a run does with the classified files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Only report statistics.
    Analyse,
    /// Report the intended placements without touching anything.
    DryRun,
    /// Copy or move the files.
    Run,
}

impl ExecutionMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionMode::Analyse => "analyse",
            ExecutionMode::DryRun => "dry-run",
            ExecutionMode::Run => "run",
        }
    }

    /// Returns true if files are classified and placed (or previewed).
    pub fn merges(&self) -> bool {
        !matches!(self, ExecutionMode::Analyse)
    }
}

/// Fully resolved, immutable options for one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub rules: RuleConfig,
    pub recursive: bool,
    pub analyse: bool,
    pub mode: ExecutionMode,
    pub transfer: TransferMode,
    pub filters: FilterRules,
    pub report: Option<PathBuf>,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub mode: ExecutionMode,
    pub transfer: TransferMode,
    pub rules: RuleConfig,
    pub analyses: Vec<AnalysisReport>,
    pub outcomes: Vec<MergeOutcome>,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn new(mode: ExecutionMode, transfer: TransferMode, rules: RuleConfig) -> Self {
        Self {
            mode,
            transfer,
            rules,
            analyses: Vec::new(),
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn placed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_placed()).count()
    }

    pub fn preview_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_preview()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status: 0 when every file went through, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    fn record_failure(&mut self, path: &Path, error: &impl fmt::Display) {
        error!("{}: {}", path.display(), error);
        self.failures.push(FailureRecord {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn action_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for outcome in &self.outcomes {
            let action = match outcome {
                MergeOutcome::Copied { .. } => "copied",
                MergeOutcome::Moved { .. } => "moved",
                MergeOutcome::WouldCopy { .. } => "would copy",
                MergeOutcome::WouldMove { .. } => "would move",
                MergeOutcome::Skipped { .. } => "skipped",
            };
            *counts.entry(action.to_string()).or_insert(0) += 1;
        }
        if !self.failures.is_empty() {
            counts.insert("failed".to_string(), self.failures.len());
        }
        counts
    }
}

/// Runs analysis and/or merging for every input.
///
/// Per-file problems are collected into the returned summary and never stop
/// the run; only configuration errors are returned as `Err`.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use orgafold::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["orgafold", "/recovered", "--suffix", "--dry"]);
/// let options = cli.load_options().expect("invalid options");
/// let summary = run(&options).expect("run failed");
/// println!("{} files would be placed", summary.preview_count());
/// ```
pub fn run(options: &RunOptions) -> OrganizeResult<RunSummary> {
    let filters = options.filters.compile()?;
    let mut summary = RunSummary::new(options.mode, options.transfer, options.rules);
    let mut merger = Merger::new(options.transfer, options.mode == ExecutionMode::Run);

    if options.mode.merges() {
        print_banner(options);
    }

    for input in &options.inputs {
        process_input(input, options, &filters, &mut merger, &mut summary);
    }

    if let Some(path) = &options.report {
        let saved = RunReport::new(&summary).save(path);
        if let Err(e) = saved {
            summary.record_failure(path, &e);
        }
    }

    if options.mode.merges() {
        print_summary(&summary);
    }
    Ok(summary)
}

fn process_input(
    input: &Path,
    options: &RunOptions,
    filters: &CompiledFilters,
    merger: &mut Merger,
    summary: &mut RunSummary,
) {
    match fs::metadata(input) {
        Ok(metadata) if metadata.is_dir() => {
            process_root(input, options, filters, merger, summary);
        }
        Ok(metadata) if metadata.is_file() => {
            warn!("Not implemented handling with {}", input.display());
            OutputFormatter::warning(&format!(
                "Single files are not supported yet, skipping {}",
                input.display()
            ));
        }
        Ok(_) => {
            let error = OrganizeError::InvalidInput {
                path: input.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "neither a file nor a directory",
                ),
            };
            OutputFormatter::error(&error.to_string());
            summary.record_failure(input, &error);
        }
        Err(e) => {
            let error = OrganizeError::InvalidInput {
                path: input.to_path_buf(),
                source: e,
            };
            OutputFormatter::error(&error.to_string());
            summary.record_failure(input, &error);
        }
    }
}

/// Analyses and/or merges the files below one input directory.
pub fn process_root(
    root: &Path,
    options: &RunOptions,
    filters: &CompiledFilters,
    merger: &mut Merger,
    summary: &mut RunSummary,
) {
    info!("Processing {}", root.display());
    let mut candidates = traversal::collect(root, options.recursive, filters);

    if options.analyse {
        let dimensions: Vec<Dimension> = options.rules.active();
        let reports = analyse(
            candidates.iter_mut().filter_map(Candidate::entry_mut),
            &dimensions,
        );
        for report in reports {
            OutputFormatter::plain(&report.render());
            summary.analyses.push(report);
        }
    }

    if !options.mode.merges() {
        for candidate in &candidates {
            if let Candidate::Unreadable { path, error } = candidate {
                summary.record_failure(path, error);
            }
        }
        return;
    }

    let target_root = options.output.as_deref().unwrap_or(root);
    let progress = (options.mode == ExecutionMode::Run)
        .then(|| OutputFormatter::create_progress_bar(candidates.len() as u64));

    for candidate in &mut candidates {
        let result = match candidate {
            Candidate::File { entry, nested } => {
                let target_dir =
                    TargetSpec::resolve(target_root, entry, &options.rules, nested).target_dir();
                merger.place(entry.path(), &target_dir)
            }
            Candidate::Unsupported { path } => merger.place(path, target_root),
            Candidate::Unreadable { path, error } => {
                with_progress(&progress, || {
                    OutputFormatter::error(&format!("{}: {}", path.display(), error))
                });
                summary.record_failure(path, &error.as_str());
                tick(&progress);
                continue;
            }
        };

        match result {
            Ok(outcome) => {
                report_outcome(&outcome, &progress);
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                with_progress(&progress, || OutputFormatter::error(&e.to_string()));
                summary.record_failure(candidate.path(), &e);
            }
        }
        tick(&progress);
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
}

fn report_outcome(outcome: &MergeOutcome, progress: &Option<ProgressBar>) {
    match outcome {
        MergeOutcome::WouldCopy { .. } | MergeOutcome::WouldMove { .. } => {
            OutputFormatter::plain(&outcome.to_string());
        }
        MergeOutcome::Skipped { .. } => {
            with_progress(progress, || OutputFormatter::warning(&outcome.to_string()));
        }
        MergeOutcome::Copied { .. } | MergeOutcome::Moved { .. } => {}
    }
}

fn with_progress(progress: &Option<ProgressBar>, print: impl FnOnce()) {
    match progress {
        Some(pb) => pb.suspend(print),
        None => print(),
    }
}

fn tick(progress: &Option<ProgressBar>) {
    if let Some(pb) = progress {
        pb.inc(1);
    }
}

fn print_banner(options: &RunOptions) {
    let mut shown: Vec<String> = options
        .inputs
        .iter()
        .take(3)
        .map(|p| p.display().to_string())
        .collect();
    if options.inputs.len() > 3 {
        shown.push("...".to_string());
    }
    OutputFormatter::info(&format!(
        "Organising {}, {} inodes (rules: {})",
        shown.join(" "),
        options.transfer.verb(),
        options.rules
    ));
    if options.mode == ExecutionMode::DryRun {
        OutputFormatter::dry_run_notice("Dry run only");
    }
}

fn print_summary(summary: &RunSummary) {
    let total = summary.outcomes.len() + summary.failures.len();
    OutputFormatter::summary_table(&summary.action_counts(), total);

    match summary.mode {
        ExecutionMode::DryRun => {
            OutputFormatter::success("Dry run complete. No files were modified.");
        }
        _ if summary.is_success() => {
            OutputFormatter::success(&format!(
                "Done: {} {}",
                summary.placed_count(),
                if summary.placed_count() == 1 { "file" } else { "files" }
            ));
        }
        _ => OutputFormatter::error(&format!(
            "{} {} could not be organized. Please review errors above.",
            summary.failures.len(),
            if summary.failures.len() == 1 { "file" } else { "files" }
        )),
    }
}
