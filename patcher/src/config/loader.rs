use crate::config::error::{ConfigError, Result};
use crate::config::validator::validate;
use crate::entry::Entry;
use crate::patch::PatchOptions;
use crate::region::{GroupSelector, PhaseSelector};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xcpatch_pbxproj::ObjectId;

/// File name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "xcpatch.toml";

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `.xcodeproj` bundle, its directory, or the descriptor itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<PathBuf>,

    /// Group id, group name, or `main`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Native target whose Sources phase receives the build files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Explicit `PBXSourcesBuildPhase` id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_phase: Option<String>,

    /// Fail when a group or build phase cannot be located
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Files to add
    #[serde(default)]
    pub files: Vec<Entry>,
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: None,
            group: None,
            target: None,
            build_phase: None,
            strict: default_true(),
            files: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn group_selector(&self) -> Option<GroupSelector> {
        self.group.as_deref().map(GroupSelector::parse)
    }

    pub fn phase_selector(&self) -> Result<PhaseSelector> {
        match (&self.build_phase, &self.target) {
            (Some(id), _) => ObjectId::parse(id)
                .map(PhaseSelector::Id)
                .map_err(|err| ConfigError::ValidationError(err.to_string())),
            (None, Some(target)) => Ok(PhaseSelector::Target(target.clone())),
            (None, None) => Ok(PhaseSelector::FirstTarget),
        }
    }

    /// Validate, then translate into patch options.
    pub fn patch_options(&self) -> Result<PatchOptions> {
        validate(self)?;
        Ok(PatchOptions {
            entries: self.files.clone(),
            group: self.group_selector(),
            phase: self.phase_selector()?,
            strict: self.strict,
        })
    }
}

/// Configuration loader with layered merging support
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new ConfigLoader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration with layered merging, then validate it:
    /// 1. Start with defaults (from Default implementations)
    /// 2. Merge config file if provided
    /// 3. Override with environment variables (XCPATCH_ prefix)
    pub fn load(&self) -> Result<AppConfig> {
        let app_config = self.load_unvalidated()?;
        validate(&app_config)?;
        Ok(app_config)
    }

    /// Merge the layers without validating, for callers that still apply
    /// overrides of their own (command-line flags) before validating.
    pub fn load_unvalidated(&self) -> Result<AppConfig> {
        let mut builder = Config::builder();

        // Layer 1: Defaults (serialize defaults to JSON and load as base)
        let defaults_json = serde_json::to_string(&AppConfig::default())?;
        builder = builder.add_source(File::from_str(&defaults_json, config::FileFormat::Json));

        // Layer 2: Config file (if provided)
        if let Some(ref path) = self.config_path {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_ref()));
            } else {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        }

        // Layer 3: Environment variables, e.g. XCPATCH_TARGET=App.
        // Values stay strings so all-digit object ids survive; `strict`
        // still converts when deserialized as a bool.
        builder = builder.add_source(
            Environment::with_prefix("XCPATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(false),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        tracing::debug!(
            path = ?self.config_path,
            files = app_config.files.len(),
            strict = app_config.strict,
            "loaded configuration"
        );
        Ok(app_config)
    }

    /// Locate the default config file in standard locations:
    /// 1. Current directory: ./xcpatch.toml
    /// 2. XDG config: ~/.config/xcpatch/config.toml
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from(".").join(CONFIG_FILENAME);
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("xcpatch").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Loader reading the config file from default locations, if any
    pub fn from_default_location() -> Self {
        match Self::find_config_file() {
            Some(config_path) => ConfigLoader::new().with_file(config_path),
            None => ConfigLoader::new(),
        }
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<AppConfig> {
        Self::from_default_location().load()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
