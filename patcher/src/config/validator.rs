use xcpatch_pbxproj::ObjectId;

use crate::config::error::{ConfigError, Result};
use crate::config::loader::AppConfig;
use crate::region::GroupSelector;

/// Check the cross-field rules serde cannot express.
///
/// Every problem is collected before failing so one run reports them all.
pub fn validate(config: &AppConfig) -> Result<()> {
    let mut problems = Vec::new();

    if config.target.is_some() && config.build_phase.is_some() {
        problems.push("`target` and `build_phase` are mutually exclusive".to_string());
    }
    if let Some(phase) = &config.build_phase
        && !ObjectId::is_valid(phase)
    {
        problems.push(format!(
            "`build_phase` must be a 24-character uppercase hex id, got `{phase}`"
        ));
    }
    if let Some(group) = &config.group
        && group.trim().is_empty()
    {
        problems.push("`group` must not be empty".to_string());
    }
    if let Some(group) = &config.group
        && GroupSelector::is_malformed_id(group)
    {
        problems.push(format!(
            "`group` looks like an object id but is not a 24-character uppercase hex id, got `{group}`"
        ));
    }
    if let Some(target) = &config.target
        && target.trim().is_empty()
    {
        problems.push("`target` must not be empty".to_string());
    }
    for (index, entry) in config.files.iter().enumerate() {
        if let Err(err) = entry.validate() {
            problems.push(format!("files[{index}]: {err}"));
        }
    }

    if problems.is_empty() {
        return Ok(());
    }
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed ({} error{}):\n  - {}",
        problems.len(),
        if problems.len() == 1 { "" } else { "s" },
        problems.join("\n  - ")
    )))
}
