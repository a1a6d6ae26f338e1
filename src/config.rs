use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted by [`SearchConfig::from_env`].
pub const MAX_PARALLEL_TASKS_ENV: &str = "LOGSCAN_MAX_PARALLEL_TASKS";

/// Upper bound on the default worker pool size.
pub const DEFAULT_MAX_PARALLEL_TASKS: usize = 8;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
}

/// Settings handed to [`crate::FileSearcher::new`].
///
/// The engine never reads the environment itself; callers build this once
/// and pass it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `None` uses `min(8, cpus)`, `Some(0)` runs serially, `Some(n)` is
    /// clamped to the number of logical CPUs.
    pub max_parallel_tasks: Option<usize>,
    /// Drop rotated files (`name.N`, `name.N.gz`) with `N` above this depth
    /// when they come from a directory or glob path spec.
    pub max_logrotate_depth: Option<usize>,
}

impl SearchConfig {
    /// Builds a config from a signed operator value where anything below
    /// zero means "use the default policy".
    pub fn with_override(value: i64) -> Self {
        Self {
            max_parallel_tasks: usize::try_from(value).ok(),
            ..Default::default()
        }
    }

    /// Reads [`MAX_PARALLEL_TASKS_ENV`]. Unset or unparseable values keep the
    /// default policy.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    pub fn apply_env(&mut self) {
        if let Some(value) = std::env::var(MAX_PARALLEL_TASKS_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
        {
            self.max_parallel_tasks = usize::try_from(value).ok();
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count_for(num_cpus::get())
    }

    pub fn worker_count_for(&self, cpus: usize) -> usize {
        let cpus = cpus.max(1);
        match self.max_parallel_tasks {
            None => DEFAULT_MAX_PARALLEL_TASKS.min(cpus),
            Some(0) => 1,
            Some(n) => n.min(cpus),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("logscan/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".logscan.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".logscan.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_is_capped_at_eight() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.worker_count_for(4), 4);
        assert_eq!(cfg.worker_count_for(32), 8);
    }

    #[test]
    fn test_zero_means_serial() {
        let cfg = SearchConfig::with_override(0);
        assert_eq!(cfg.max_parallel_tasks, Some(0));
        assert_eq!(cfg.worker_count_for(16), 1);
    }

    #[test]
    fn test_override_clamped_to_cpus() {
        assert_eq!(SearchConfig::with_override(64).worker_count_for(12), 12);
        assert_eq!(SearchConfig::with_override(3).worker_count_for(12), 3);
    }

    #[test]
    fn test_negative_override_uses_default() {
        let cfg = SearchConfig::with_override(-1);
        assert_eq!(cfg.max_parallel_tasks, None);
        assert_eq!(cfg.worker_count_for(2), 2);
    }

    #[test]
    fn test_parse_toml() {
        let cfg: Config = toml::from_str(
            "[search]\nmax_parallel_tasks = 2\nmax_logrotate_depth = 7\n",
        )
        .unwrap();
        assert_eq!(cfg.search.max_parallel_tasks, Some(2));
        assert_eq!(cfg.search.max_logrotate_depth, Some(7));

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty.search, SearchConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\nmax_parallel_tasks = 0\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.search.worker_count_for(8), 1);

        assert!(Config::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
