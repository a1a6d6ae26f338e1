//! Path spec resolution.
//!
//! A path spec is an existing file, an existing directory (scanned one level
//! deep) or otherwise a glob expression.
use glob::MatchOptions;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn resolve_path_spec(spec: &str, max_logrotate_depth: Option<usize>) -> Vec<PathBuf> {
    let path = Path::new(spec);
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let files = if path.is_dir() {
        dir_children(path)
    } else {
        glob_expand(spec)
    };

    match max_logrotate_depth {
        Some(depth) => files
            .into_iter()
            .filter(|f| match logrotate_depth(f) {
                Some(n) if n > depth => {
                    debug!("Skipping {} (logrotate depth {n} > {depth})", f.display());
                    false
                }
                _ => true,
            })
            .collect(),
        None => files,
    }
}

fn dir_children(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Expands like a shell `*`: leading-dot names need a literal dot, and only
/// regular files are kept.
fn glob_expand(pattern: &str) -> Vec<PathBuf> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    match glob::glob_with(pattern, options) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            warn!("Ignoring invalid glob '{pattern}': {e}");
            Vec::new()
        }
    }
}

/// Returns `N` for rotated names like `syslog.3` or `syslog.3.gz`.
pub fn logrotate_depth(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let (stem, n) = name.rsplit_once('.')?;
    if stem.is_empty() || n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    n.parse().ok()
}
