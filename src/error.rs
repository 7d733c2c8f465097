use std::io;

use thiserror::Error;

/// Errors raised while reading a configuration. Parsing stops at the first one.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read data")]
    Read {
        #[from]
        source: io::Error,
    },
    #[error("could not parse line {line}: {content:?}")]
    Syntax { line: usize, content: String },
}

/// Errors raised while retrieving a value from a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetError {
    #[error("option not found: [{section}] {option}")]
    NotFound { section: String, option: String },
    #[error("variable not found: {name}")]
    VariableNotFound { name: String },
    #[error("possible cycle while unfolding variables: max depth of {depth} reached")]
    DepthExceeded { depth: usize },
    #[error("cannot read {value:?} as {expected}")]
    InvalidValue {
        value: String,
        expected: &'static str,
    },
}
