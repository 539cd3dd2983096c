//! Metro configuration loading.
//!
//! A default metro definition is embedded at compile time; operators
//! point `BLOCKPRESS_METRO` at a TOML file to override it. The loaded
//! [`Metro`] is passed into the importer explicitly so nothing reads
//! ambient global state after startup.

use blockpress_boundary_models::Metro;

use crate::BoundaryError;

/// Embedded default metro definition.
const DEFAULT_METRO_TOML: &str = include_str!("../metro.toml");

/// Environment variable naming an override TOML file.
pub const METRO_ENV_VAR: &str = "BLOCKPRESS_METRO";

/// Loads the metro settings.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the override file cannot be read or
/// either TOML source fails to parse.
pub fn load_metro() -> Result<Metro, BoundaryError> {
    match std::env::var(METRO_ENV_VAR) {
        Ok(path) => {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::de::from_str(&content)?)
        }
        Err(_) => Ok(toml::de::from_str(DEFAULT_METRO_TOML)?),
    }
}
