//! Parser (verb module)
//!
//! YAML (and JSON, a YAML subset) → configuration, selections and result specs.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::config::EngineConfig;
use crate::error::ParseError;
use crate::query::Selections;
use crate::result_spec::ResultSpec;

fn read<P: AsRef<Path>>(path: P) -> Result<String, ParseError> {
    let path_str = path.as_ref().display().to_string();
    std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })
}

/// Parse any deserializable document from YAML or JSON
pub fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse and validate an engine configuration from a YAML file
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ParseError> {
    parse_config_str(&read(path)?)
}

/// Parse and validate an engine configuration from a YAML string
pub fn parse_config_str(yaml: &str) -> Result<EngineConfig, ParseError> {
    let config: EngineConfig = parse_yaml(yaml)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_selections_file<P: AsRef<Path>>(path: P) -> Result<Selections, ParseError> {
    parse_selections_str(&read(path)?)
}

pub fn parse_selections_str(yaml: &str) -> Result<Selections, ParseError> {
    parse_yaml(yaml)
}

pub fn parse_result_spec_file<P: AsRef<Path>>(path: P) -> Result<ResultSpec, ParseError> {
    parse_result_spec_str(&read(path)?)
}

pub fn parse_result_spec_str(yaml: &str) -> Result<ResultSpec, ParseError> {
    parse_yaml(yaml)
}
