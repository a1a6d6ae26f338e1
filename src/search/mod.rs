//! Multi-pattern, multi-file search engine
pub mod results;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::metrics::Metrics;
use crate::processor::scan_file;
use crate::walker::resolve_path_spec;
use log::{debug, info, warn};
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub use results::{SearchResult, SearchResultsCollection};

/// A compiled pattern plus the capture groups and tag to record on a match.
#[derive(Debug, Clone)]
pub struct PatternTerm {
    pattern: String,
    regex: Regex,
    indices: Vec<usize>,
    tag: Option<String>,
}

impl PatternTerm {
    pub fn new(pattern: &str, indices: &[usize], tag: Option<&str>) -> Result<Self> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|source| SearchError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        // Validate the pattern on its own first so the anchoring group cannot
        // paper over unbalanced parentheses.
        compile(pattern)?;
        let regex = compile(&format!("^(?:{pattern})"))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            indices: indices.to_vec(),
            tag: tag.map(str::to_string),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Matches from the start of `line`, keeping only the wanted groups that
    /// participated.
    pub fn match_line(&self, line: &str, line_number: usize, source: &Path) -> Option<SearchResult> {
        let caps = self.regex.captures(line)?;
        let fields: BTreeMap<usize, String> = self
            .indices
            .iter()
            .filter_map(|&i| caps.get(i).map(|m| (i, m.as_str().to_string())))
            .collect();
        Some(SearchResult::new(
            line_number,
            source.to_path_buf(),
            self.tag.clone(),
            fields,
        ))
    }
}

/// Registry of pattern terms grouped by path spec.
///
/// Terms are registered single-threaded; [`FileSearcher::search`] then
/// borrows the registry read-only while the pool scans one file per task.
pub struct FileSearcher {
    config: SearchConfig,
    paths: Vec<(String, Vec<PatternTerm>)>,
    metrics: Option<Arc<Metrics>>,
}

impl FileSearcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            paths: Vec::new(),
            metrics: None,
        }
    }

    /// Like [`FileSearcher::new`], counting scanned files and matches into
    /// `metrics`.
    pub fn with_metrics(config: SearchConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(config)
        }
    }

    pub fn metrics(&self) -> Option<Arc<Metrics>> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Registers `pattern` against `path_spec`. Fails immediately if the
    /// pattern does not compile.
    pub fn add_search_term(
        &mut self,
        pattern: &str,
        indices: &[usize],
        path_spec: &str,
        tag: Option<&str>,
    ) -> Result<()> {
        let term = PatternTerm::new(pattern, indices, tag)?;
        debug!("Registered pattern '{pattern}' for {path_spec}");
        match self.paths.iter_mut().find(|(spec, _)| spec == path_spec) {
            Some((_, terms)) => terms.push(term),
            None => self.paths.push((path_spec.to_string(), vec![term])),
        }
        Ok(())
    }

    /// Registered path specs in registration order.
    pub fn path_specs(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|(spec, _)| spec.as_str())
    }

    pub fn terms(&self, path_spec: &str) -> &[PatternTerm] {
        self.paths
            .iter()
            .find(|(spec, _)| spec == path_spec)
            .map(|(_, terms)| terms.as_slice())
            .unwrap_or(&[])
    }

    /// Scans every resolved file and blocks until all tasks have finished.
    ///
    /// A file that cannot be read contributes nothing; only failing to build
    /// the worker pool is an error.
    pub fn search(&self) -> Result<SearchResultsCollection> {
        let start = Instant::now();
        let tasks: Vec<(usize, PathBuf)> = self
            .paths
            .iter()
            .enumerate()
            .flat_map(|(idx, (spec, _))| {
                let files = resolve_path_spec(spec, self.config.max_logrotate_depth);
                debug!("Path spec {spec} resolved to {} file(s)", files.len());
                files.into_iter().map(move |f| (idx, f))
            })
            .collect();

        let workers = self.config.worker_count();
        info!(
            "Searching {} file(s) from {} path spec(s) with {workers} worker(s)",
            tasks.len(),
            self.paths.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("logscan-search-{i}"))
            .build()
            .map_err(|source| SearchError::Pool {
                size: workers,
                source,
            })?;

        let outcomes: Vec<(PathBuf, Option<Vec<SearchResult>>)> = pool.install(|| {
            tasks
                .into_par_iter()
                .with_max_len(1)
                .map(|(idx, path)| {
                    let outcome = self.scan_task(&path, &self.paths[idx].1);
                    (path, outcome)
                })
                .collect()
        });

        let mut results = SearchResultsCollection::new();
        for (path, outcome) in outcomes {
            if let Some(matches) = outcome {
                results.add_file(path, matches);
            }
        }

        info!(
            "Search finished: {} match(es) in {:.2?}",
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    fn scan_task(&self, path: &Path, terms: &[PatternTerm]) -> Option<Vec<SearchResult>> {
        match scan_file(path, terms) {
            Ok(matches) => {
                debug!("{}: {} match(es)", path.display(), matches.len());
                if let Some(metrics) = &self.metrics {
                    metrics.files_scanned.inc();
                    metrics.matches_found.inc_by(matches.len() as u64);
                }
                Some(matches)
            }
            Err(e) => {
                warn!("Skipping {}: {e:#}", path.display());
                if let Some(metrics) = &self.metrics {
                    metrics.files_failed.inc();
                }
                None
            }
        }
    }
}

impl Default for FileSearcher {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
