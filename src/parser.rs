//! Decoding of fetched source documents into raw rule entries.

use serde::Deserialize;

use crate::config::SourceFormat;
use crate::error::RuleforgeError;

/// Wire form of a Clash rule-provider document.
///
/// Deserialized with serde_yaml, which accepts JSON documents as well, so
/// providers that publish JSON need no separate decode path.
#[derive(Debug, Deserialize)]
struct ProviderDocument {
    payload: Vec<String>,
}

/// Decode a fetched document into raw entry strings, in document order.
///
/// Plain lists are split on lines, trimmed, and stripped of blank lines.
/// Provider payload entries are taken verbatim (they may be empty; the
/// aggregation step filters those out at finalization), except that the
/// `+.` wildcard prefix is removed for domain providers.
pub fn parse_document(
    content: &str,
    format: &SourceFormat,
) -> Result<Vec<String>, RuleforgeError> {
    match format {
        SourceFormat::List => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        SourceFormat::RuleProvider => {
            let doc = decode_provider(content)?;
            Ok(doc
                .payload
                .into_iter()
                .map(|entry| match entry.strip_prefix("+.") {
                    Some(rest) => rest.to_string(),
                    None => entry,
                })
                .collect())
        }
        SourceFormat::RuleProviderCidr => {
            let doc = decode_provider(content)?;
            Ok(doc.payload)
        }
    }
}

fn decode_provider(content: &str) -> Result<ProviderDocument, RuleforgeError> {
    serde_yaml::from_str(content)
        .map_err(|e| RuleforgeError::Parse(format!("Invalid rule-provider document: {}", e)))
}
