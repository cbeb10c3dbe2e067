//! KDL schema for `config.kdl`.
//!
//! ```kdl
//! output-format "human"      // or "json"
//! code-sequence "monotonic"  // or "length"
//! ```

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

use crate::store::CodeSequence;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferences read from `config.kdl` in the data directory.
///
/// Unknown nodes are ignored, as are values that do not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanstackConfig {
    pub output_format: Option<OutputFormat>,
    pub code_sequence: Option<CodeSequence>,
}

impl PlanstackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config file's text.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let doc: KdlDocument = text.parse()?;
        Ok(Self::from_kdl(&doc))
    }

    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(value) = string_value(doc, "output-format") {
            config.output_format = OutputFormat::parse(value);
        }

        if let Some(value) = string_value(doc, "code-sequence") {
            config.code_sequence = value.parse().ok();
        }

        config
    }

    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(format) = self.output_format {
            doc.nodes_mut()
                .push(string_node("output-format", format.as_str()));
        }

        if let Some(sequence) = self.code_sequence {
            doc.nodes_mut()
                .push(string_node("code-sequence", sequence.as_str()));
        }

        doc
    }

    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &PlanstackConfig) {
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.code_sequence.is_some() {
            self.code_sequence = other.code_sequence;
        }
    }
}

fn string_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
        assert_eq!(format!("{}", OutputFormat::Human), "human");
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(PlanstackConfig::from_kdl(&doc), PlanstackConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            output-format "human"
            code-sequence "monotonic"
        "#;
        let config = PlanstackConfig::parse(kdl).unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.code_sequence, Some(CodeSequence::Monotonic));
    }

    #[test]
    fn test_unknown_values_are_ignored() {
        let kdl = r#"
            output-format "xml"
            code-sequence 3
            editor "nvim"
        "#;
        let config = PlanstackConfig::parse(kdl).unwrap();
        assert_eq!(config, PlanstackConfig::default());
    }

    #[test]
    fn test_malformed_kdl_is_an_error() {
        assert!(matches!(
            PlanstackConfig::parse("output-format \"human"),
            Err(crate::Error::Kdl(_))
        ));
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = PlanstackConfig {
            output_format: Some(OutputFormat::Json),
            code_sequence: Some(CodeSequence::CollectionLength),
        };
        assert_eq!(PlanstackConfig::from_kdl(&config.to_kdl()), config);
    }

    #[test]
    fn test_config_merge() {
        let mut base = PlanstackConfig {
            output_format: Some(OutputFormat::Json),
            code_sequence: Some(CodeSequence::Monotonic),
        };
        base.merge(&PlanstackConfig {
            output_format: Some(OutputFormat::Human),
            code_sequence: None,
        });
        assert_eq!(base.output_format, Some(OutputFormat::Human));
        assert_eq!(base.code_sequence, Some(CodeSequence::Monotonic));
    }
}
