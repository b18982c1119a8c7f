/// Configuration for patch runs
///
/// Layered the 12-factor way:
/// 1. Defaults (from code)
/// 2. Config file (xcpatch.toml)
/// 3. Environment variables (XCPATCH_* prefix)
///
/// # Example
///
/// ```no_run
/// use xcpatch_patcher::config::ConfigLoader;
///
/// // Load from default locations
/// let config = ConfigLoader::load_default().expect("Failed to load config");
///
/// // Or load from specific file
/// let config = ConfigLoader::new()
///     .with_file("./xcpatch.toml")
///     .load()
///     .expect("Failed to load config");
/// let options = config.patch_options().expect("invalid config");
/// ```
pub mod error;
pub mod loader;
pub mod validator;

// Re-export main types
pub use error::{ConfigError, Result};
pub use loader::{AppConfig, ConfigLoader};
pub use validator::validate;
