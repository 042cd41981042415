mod settings;

use std::path::Path;

use crate::error::{ConfigError, ParseError};
use crate::validate::validate_config;

pub use settings::{
    CephSettings, PollSettings, RetrySettings, RunConfig, SshSettings, WorkerSettings,
    DEFAULT_MAX_WORKERS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub config: RunConfig,
    pub format: ConfigFormat,
}

pub fn parse_config_str(input: &str, format: ConfigFormat) -> Result<ParsedConfig, ParseError> {
    match format {
        ConfigFormat::Json => Ok(ParsedConfig {
            config: serde_json::from_str::<RunConfig>(input)?,
            format,
        }),
        ConfigFormat::Yaml => Ok(ParsedConfig {
            config: serde_yaml::from_str::<RunConfig>(input)?,
            format,
        }),
        ConfigFormat::Auto => parse_config_auto(input),
    }
}

fn parse_config_auto(input: &str) -> Result<ParsedConfig, ParseError> {
    // JSON always starts with `{` after trimming; YAML is a superset, so try JSON first there.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<RunConfig>(input) {
            Ok(config) => Ok(ParsedConfig {
                config,
                format: ConfigFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<RunConfig>(input) {
                Ok(config) => Ok(ParsedConfig {
                    config,
                    format: ConfigFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    let config = serde_yaml::from_str::<RunConfig>(input)?;
    Ok(ParsedConfig {
        config,
        format: ConfigFormat::Yaml,
    })
}

/// Read, parse and validate a run config file.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = parse_config_str(&content, ConfigFormat::Auto)?;
    validate_config(&parsed.config)?;
    Ok(parsed.config)
}
