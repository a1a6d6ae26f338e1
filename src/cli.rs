use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(long, value_parser, default_value_t = false)]
    pub verbose: bool,

    #[clap(long, value_parser)]
    pub log: Option<PathBuf>,

    /// Worker pool size; 0 runs serially, negative uses the default policy.
    #[clap(long, value_parser, allow_negative_numbers = true)]
    pub max_parallel_tasks: Option<i64>,

    /// Skip rotated files (`name.N[.gz]`) deeper than this.
    #[clap(long, value_parser)]
    pub max_logrotate_depth: Option<usize>,

    /// Print prometheus counters after the command finishes.
    #[clap(long, value_parser, default_value_t = false)]
    pub metrics: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match a pattern from the start of every line.
    Search {
        pattern: String,

        /// Files, directories (one level deep) or globs.
        #[clap(required = true)]
        paths: Vec<String>,

        #[clap(long, value_parser)]
        tag: Option<String>,

        /// Capture group to print; repeatable.
        #[clap(short, long = "capture", value_parser)]
        captures: Vec<usize>,
    },
    /// Correlate start/end markers and report the slowest events.
    Events {
        #[clap(long, value_parser)]
        start: String,

        #[clap(long, value_parser)]
        end: String,

        #[clap(required = true)]
        paths: Vec<String>,

        #[clap(long, value_parser, default_value_t = 5)]
        top: usize,

        #[clap(long, value_parser, default_value_t = false)]
        ascending: bool,

        #[clap(long, value_parser, default_value_t = 1)]
        day_index: usize,

        #[clap(long, value_parser, default_value_t = 2)]
        secs_index: usize,

        #[clap(long, value_parser, default_value_t = 3)]
        event_id_index: usize,

        #[clap(long, value_parser, requires = "metadata_key")]
        metadata_index: Option<usize>,

        #[clap(long, value_parser, requires = "metadata_index")]
        metadata_key: Option<String>,
    },
}
