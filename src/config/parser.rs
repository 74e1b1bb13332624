use crate::config::policy::Policy;
use crate::config::types::FindOptions;
use crate::ConfigError;
use std::path::Path;

/// Loads find options from a TOML file without validating them
///
/// Every key is optional; missing keys take their defaults. Callers that
/// layer command line flags on top validate afterwards.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(FindOptions)` - Successfully parsed options
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_options(path: &Path) -> Result<FindOptions, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let options: FindOptions = toml::from_str(&content)?;
    Ok(options)
}

/// Loads a TOML file and validates it into a [`Policy`]
pub fn load_config(path: &Path) -> Result<Policy, ConfigError> {
    load_options(path)?.validate()
}
