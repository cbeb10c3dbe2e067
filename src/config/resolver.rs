//! Precedence resolution for configuration.
//!
//! Precedence (highest to lowest):
//!
//! 1. CLI flags (passed at runtime)
//! 2. `config.kdl` in the data directory
//! 3. Built-in defaults

use serde::Serialize;

use crate::config::{OutputFormat, PlanstackConfig};
use crate::store::CodeSequence;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    #[serde(rename = "cli")]
    CliFlag,
    /// Value from `config.kdl`
    File,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }

    fn pick(flag: Option<T>, file: Option<T>, default: T) -> Self {
        match (flag, file) {
            (Some(value), _) => Self::new(value, ValueSource::CliFlag),
            (None, Some(value)) => Self::new(value, ValueSource::File),
            (None, None) => Self::new(default, ValueSource::Default),
        }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    pub code_sequence: Resolved<CodeSequence>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve_config(&ConfigOverrides::default(), &PlanstackConfig::default())
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn code_sequence(&self) -> CodeSequence {
        self.code_sequence.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub code_sequence: Option<CodeSequence>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_code_sequence(mut self, sequence: CodeSequence) -> Self {
        self.code_sequence = Some(sequence);
        self
    }
}

/// Resolve configuration from CLI overrides and the parsed config file.
pub fn resolve_config(overrides: &ConfigOverrides, file: &PlanstackConfig) -> ResolvedConfig {
    ResolvedConfig {
        output_format: Resolved::pick(
            overrides.output_format,
            file.output_format,
            OutputFormat::default(),
        ),
        code_sequence: Resolved::pick(
            overrides.code_sequence,
            file.code_sequence,
            CodeSequence::default(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_source_display() {
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::File), "file");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    #[test]
    fn test_resolve_config_defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::Default);
        assert_eq!(config.code_sequence(), CodeSequence::CollectionLength);
        assert_eq!(config.code_sequence.source, ValueSource::Default);
    }

    #[test]
    fn test_resolve_config_from_file() {
        let file = PlanstackConfig {
            output_format: Some(OutputFormat::Human),
            code_sequence: Some(CodeSequence::Monotonic),
        };
        let config = resolve_config(&ConfigOverrides::default(), &file);
        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::File);
        assert_eq!(config.code_sequence(), CodeSequence::Monotonic);
        assert_eq!(config.code_sequence.source, ValueSource::File);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = PlanstackConfig {
            output_format: Some(OutputFormat::Json),
            code_sequence: Some(CodeSequence::Monotonic),
        };
        let overrides = ConfigOverrides::new().with_output_format(OutputFormat::Human);
        let config = resolve_config(&overrides, &file);
        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::CliFlag);
        assert_eq!(config.code_sequence.source, ValueSource::File);

        let overrides = overrides.with_code_sequence(CodeSequence::CollectionLength);
        let config = resolve_config(&overrides, &file);
        assert_eq!(config.code_sequence(), CodeSequence::CollectionLength);
        assert_eq!(config.code_sequence.source, ValueSource::CliFlag);
    }
}
