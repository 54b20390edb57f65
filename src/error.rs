//! Error types for ruleforge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleforgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),
}
