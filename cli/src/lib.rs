//! `xcpatch`: add source files to an Xcode project from the command line.
//!
//! ## Exit Codes
//!
//! - 0: Files added (or diff printed with `--dry-run`)
//! - 1: Patch failure (unreadable or malformed descriptor, unresolved region)
//! - 2: Configuration or usage error

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;
use xcpatch_patcher::{
    AppConfig, ConfigError, ConfigLoader, Entry, PatchError, PatchReport, Patcher,
    resolve_descriptor,
};

/// Printed on stdout after a successful write.
pub const CONFIRMATION: &str = "Files added to Xcode project successfully";

/// Exit codes for the `xcpatch` binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const PATCH_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

/// Add source files to an Xcode project descriptor
#[derive(Debug, Parser)]
#[command(name = "xcpatch", version)]
pub struct Cli {
    /// Files to add, as NAME or NAME=PATH (PATH defaults to NAME).
    /// Replaces the `files` list from the config file.
    #[arg(value_name = "FILES")]
    pub files: Vec<Entry>,

    /// `.xcodeproj` bundle or `project.pbxproj` file (default: the one
    /// bundle in the current directory)
    #[arg(short = 'p', long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Config file (default: ./xcpatch.toml, then ~/.config/xcpatch/config.toml)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Group id, group name, or `main`
    #[arg(short = 'g', long, value_name = "SEL")]
    pub group: Option<String>,

    /// Native target whose Sources phase receives the build files
    #[arg(short = 't', long, value_name = "NAME", conflicts_with = "build_phase")]
    pub target: Option<String>,

    /// Explicit PBXSourcesBuildPhase identifier
    #[arg(long, value_name = "ID")]
    pub build_phase: Option<String>,

    /// lastKnownFileType for every file given on the command line
    #[arg(long, value_name = "TYPE")]
    pub file_type: Option<String>,

    /// Skip a group or build phase that cannot be found instead of failing
    #[arg(long)]
    pub allow_missing: bool,

    /// Print a unified diff instead of writing the descriptor
    #[arg(long)]
    pub dry_run: bool,

    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What a successful run did.
#[derive(Debug)]
pub struct RunOutcome {
    pub descriptor: PathBuf,
    pub report: PatchReport,
    pub dry_run: bool,
}

impl RunOutcome {
    /// Diff labelled with the descriptor path relative to `cwd`.
    pub fn diff(&self, cwd: &Path) -> String {
        let label = self
            .descriptor
            .strip_prefix(cwd)
            .unwrap_or(&self.descriptor);
        self.report.unified_diff(&label.display().to_string())
    }
}

impl Cli {
    /// Layered config with this invocation's flags applied on top. The
    /// result is validated by [`AppConfig::patch_options`], after the flags.
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::new().with_file(path),
            None => ConfigLoader::from_default_location(),
        };
        let mut config = loader.load_unvalidated()?;

        if let Some(project) = &self.project {
            config.project = Some(project.clone());
        }
        if let Some(group) = &self.group {
            config.group = Some(group.clone());
        }
        // A phase chosen on the command line replaces the configured one.
        if let Some(target) = &self.target {
            config.target = Some(target.clone());
            config.build_phase = None;
        }
        if let Some(build_phase) = &self.build_phase {
            config.build_phase = Some(build_phase.clone());
            config.target = None;
        }
        if self.allow_missing {
            config.strict = false;
        }
        if !self.files.is_empty() {
            config.files = self
                .files
                .iter()
                .cloned()
                .map(|entry| match &self.file_type {
                    Some(file_type) => entry.with_file_type(file_type.clone()),
                    None => entry,
                })
                .collect();
        }
        Ok(config)
    }
}

/// Run one invocation relative to `cwd`.
pub fn run(cli: &Cli, cwd: &Path) -> anyhow::Result<RunOutcome> {
    let config = cli
        .resolve_config()
        .map_err(PatchError::from)
        .context("failed to load configuration")?;
    let options = config.patch_options().map_err(PatchError::from)?;
    let descriptor = resolve_descriptor(config.project.as_deref(), cwd)?;

    tracing::info!(
        descriptor = %descriptor.display(),
        files = options.entries.len(),
        strict = options.strict,
        dry_run = cli.dry_run,
        "patching project"
    );
    let report = Patcher::new(options)
        .patch_file(&descriptor, cli.dry_run)
        .with_context(|| format!("failed to patch {}", descriptor.display()))?;

    for region in &report.skipped {
        tracing::warn!(%region, "region skipped, descriptor only partially patched");
    }
    Ok(RunOutcome {
        descriptor,
        report,
        dry_run: cli.dry_run,
    })
}

/// Map a failed run to its exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PatchError>() {
        Some(patch_err) if patch_err.is_config() => exit_codes::CONFIG_ERROR,
        _ => exit_codes::PATCH_FAILED,
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
