pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod processor;
pub mod search;
pub mod walker;

pub use crate::config::{Config, SearchConfig};
pub use crate::error::{EventError, Result, SearchError};
pub use clap::Parser;
pub use cli::{Cli, Commands};
pub use events::{
    EventCollection, EventHead, EventStats, EventSummary, LogEventStats, SearchResultIndices,
};
pub use metrics::Metrics;
pub use processor::scan_file;
pub use search::{FileSearcher, PatternTerm, SearchResult, SearchResultsCollection};
pub use walker::resolve_path_spec;
