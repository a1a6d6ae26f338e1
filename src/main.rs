use colored::*;
use env_logger::{Builder, Env, Target};
use log::{info, warn};
use logscan::cli::{Cli, Commands};
use logscan::error::{Result, SearchError};
use logscan::{
    Config, FileSearcher, LogEventStats, Metrics, Parser, SearchConfig, SearchResultIndices,
};
use std::fs;
use std::sync::Arc;
use std::time::Instant;

const EVENT_TAG: &str = "event";

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let start_time = Instant::now();
    info!("Application started with command: {:?}", cli.command);

    let config = search_config(&cli);
    let metrics = if cli.metrics {
        Some(Arc::new(Metrics::new()?))
    } else {
        None
    };
    let mut searcher = match &metrics {
        Some(metrics) => FileSearcher::with_metrics(config, metrics.clone()),
        None => FileSearcher::new(config),
    };

    match &cli.command {
        Commands::Search {
            pattern,
            paths,
            tag,
            captures,
        } => run_search(&mut searcher, pattern, paths, tag.as_deref(), captures)?,
        Commands::Events {
            start,
            end,
            paths,
            top,
            ascending,
            day_index,
            secs_index,
            event_id_index,
            metadata_index,
            metadata_key,
        } => {
            let mut indices = SearchResultIndices {
                day: *day_index,
                secs: *secs_index,
                event_id: *event_id_index,
                ..Default::default()
            };
            if let (Some(index), Some(key)) = (metadata_index, metadata_key) {
                indices = indices.with_metadata(*index, key);
            }
            run_events(&mut searcher, start, end, paths, indices, *top, !*ascending)?
        }
    }

    if let Some(metrics) = metrics {
        print!("{}", metrics.gather());
    }
    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}

/// File config, then the environment, then command line flags.
fn search_config(cli: &Cli) -> SearchConfig {
    let mut config = match Config::load() {
        Ok(cfg) => cfg.search,
        Err(e) => {
            warn!("Ignoring config file: {e:#}");
            SearchConfig::default()
        }
    };
    config.apply_env();
    if let Some(value) = cli.max_parallel_tasks {
        config.max_parallel_tasks = SearchConfig::with_override(value).max_parallel_tasks;
    }
    if cli.max_logrotate_depth.is_some() {
        config.max_logrotate_depth = cli.max_logrotate_depth;
    }
    config
}

fn run_search(
    searcher: &mut FileSearcher,
    pattern: &str,
    paths: &[String],
    tag: Option<&str>,
    captures: &[usize],
) -> Result<()> {
    for path in paths {
        searcher.add_search_term(pattern, captures, path, tag)?;
    }

    let results = searcher.search()?;
    for result in results.iter() {
        let fields: Vec<String> = captures
            .iter()
            .map(|&i| result.get(i).unwrap_or("-").to_string())
            .collect();
        println!(
            "{}:{}:{}{}",
            result.source().display().to_string().green(),
            result.line_number().to_string().yellow().bold(),
            result.tag().unwrap_or(""),
            if fields.is_empty() {
                String::new()
            } else {
                format!(":{}", fields.join(" "))
            }
        );
    }
    println!(
        "{} {} match(es) in {} file(s)",
        "Found".green(),
        results.len(),
        results.files().count()
    );
    Ok(())
}

fn run_events(
    searcher: &mut FileSearcher,
    start: &str,
    end: &str,
    paths: &[String],
    indices: SearchResultIndices,
    top: usize,
    descending: bool,
) -> Result<()> {
    let mut wanted = vec![indices.day, indices.secs, indices.event_id];
    wanted.extend(indices.metadata);

    let start_tag = format!("{EVENT_TAG}-start");
    let end_tag = format!("{EVENT_TAG}-end");
    for path in paths {
        searcher.add_search_term(start, &wanted, path, Some(&start_tag))?;
        searcher.add_search_term(end, &wanted, path, Some(&end_tag))?;
    }

    let results = searcher.search()?;
    let mut stats = LogEventStats::new(&results, EVENT_TAG, Some(indices));
    stats.run()?;

    // Pairs rather than an object so the presentation order survives.
    let report = serde_json::json!({
        "top": stats.get_top_n_events_sorted(top, descending),
        "stats": stats.get_event_stats(),
    });
    let rendered =
        serde_json::to_string_pretty(&report).map_err(|e| SearchError::Other(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| SearchError::Other(e.to_string()))?;
    Ok(())
}
