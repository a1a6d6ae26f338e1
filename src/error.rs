use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to build worker pool of {size} threads: {source}")]
    Pool {
        size: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Event correlation failed: {0}")]
    Event(#[from] EventError),

    #[error("An unexpected error occurred: {0}")]
    Other(String),
}

/// Errors raised while turning tagged search results into events.
///
/// These indicate that the patterns registered for a tag family do not
/// supply the capture groups the correlator was told to expect.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("{path}:{line}: result tagged '{tag}' has no value for capture group {index} ({field})")]
    MissingField {
        tag: String,
        field: &'static str,
        index: usize,
        path: PathBuf,
        line: usize,
    },

    #[error("{path}:{line}: cannot parse timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        path: PathBuf,
        line: usize,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, SearchError>;
