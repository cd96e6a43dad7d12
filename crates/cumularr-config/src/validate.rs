//! Validation for loaded configuration documents.

use crate::error::{ConfigError, ConfigResult};
use crate::model::Config;

pub(crate) fn validate(config: &Config) -> ConfigResult<()> {
    require_non_empty("api_key", &config.api_key)?;

    if config.download_directory.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "download_directory",
            reason: "empty",
            value: None,
        });
    }

    if config.polling_interval.as_secs() == 0 {
        return Err(ConfigError::InvalidField {
            field: "polling_interval",
            reason: "zero",
            value: Some(config.polling_interval.as_secs().to_string()),
        });
    }

    require_positive("orchestration_workers", config.orchestration_workers)?;
    require_positive("download_workers", config.download_workers)?;

    require_non_empty("instance_name", &config.instance_name)?;
    if !config
        .instance_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::InvalidField {
            field: "instance_name",
            reason: "not_alphanumeric",
            value: Some(config.instance_name.clone()),
        });
    }

    for (_, service) in config.arr_services() {
        if service.url.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "url",
                reason: "empty",
                value: None,
            });
        }
        if service.api_key.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "api_key",
                reason: "empty",
                value: None,
            });
        }
    }

    Ok(())
}

fn require_non_empty(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field,
            reason: "empty",
            value: None,
        });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: usize) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::InvalidField {
            field,
            reason: "zero",
            value: Some(value.to_string()),
        });
    }
    Ok(())
}
