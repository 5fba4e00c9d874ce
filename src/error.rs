//! Error types for prereq

use crate::validate::Issue;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// prereq errors
///
/// Only loading, configuration and I/O produce errors. Engine operations
/// report their outcomes as values.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Curriculum parse error: {0}")]
    CurriculumParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid curriculum: {}", summarize_issues(.0))]
    InvalidCurriculum(Vec<Issue>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

fn summarize_issues(issues: &[Issue]) -> String {
    match issues {
        [] => "no issues reported".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
