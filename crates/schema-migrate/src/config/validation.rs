//! Configuration validation.

use super::Config;
use crate::error::{Result, SchemaError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    for (side, source) in [("source", &config.source), ("target", &config.target)] {
        if source.r#type != "json" {
            return Err(SchemaError::Config(format!(
                "{side}.type must be 'json', got '{}'",
                source.r#type
            )));
        }
        if source.path.as_os_str().is_empty() {
            return Err(SchemaError::Config(format!("{side}.path is required")));
        }
    }

    if config.migration.dialect.trim().is_empty() {
        return Err(SchemaError::Config(
            "migration.dialect must not be empty".into(),
        ));
    }

    Ok(())
}
