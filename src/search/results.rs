//! Match model returned by [`crate::FileSearcher::search`].
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    line_number: usize,
    source: PathBuf,
    tag: Option<String>,
    fields: BTreeMap<usize, String>,
}

impl SearchResult {
    pub fn new(
        line_number: usize,
        source: PathBuf,
        tag: Option<String>,
        fields: BTreeMap<usize, String>,
    ) -> Self {
        Self {
            line_number,
            source,
            tag,
            fields,
        }
    }

    /// 1-based line number within the (decompressed) source.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Value of capture group `index`, or `None` if the group was not
    /// requested or did not take part in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(&index).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<usize, String> {
        &self.fields
    }
}

/// All results of one search, keyed by source file.
///
/// Files iterate in path order; results within a file keep line order.
#[derive(Debug, Default, Clone)]
pub struct SearchResultsCollection {
    by_file: BTreeMap<PathBuf, Vec<SearchResult>>,
}

impl SearchResultsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `path` was scanned and appends its results. A file
    /// scanned with no matches is still listed by [`Self::files`].
    pub fn add_file(&mut self, path: PathBuf, results: Vec<SearchResult>) {
        self.by_file.entry(path).or_default().extend(results);
    }

    pub fn insert(&mut self, result: SearchResult) {
        self.by_file
            .entry(result.source.clone())
            .or_default()
            .push(result);
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.by_file.keys().map(PathBuf::as_path)
    }

    pub fn find_by_path(&self, path: &Path) -> &[SearchResult] {
        self.by_file.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Results whose tag is exactly `tag`, limited to `path` when given.
    pub fn find_by_tag(&self, tag: &str, path: Option<&Path>) -> Vec<&SearchResult> {
        let matches_tag = |r: &&SearchResult| r.tag() == Some(tag);
        match path {
            Some(path) => self.find_by_path(path).iter().filter(matches_tag).collect(),
            None => self.iter().filter(matches_tag).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.by_file.values().flatten()
    }

    /// Total number of results across all files.
    pub fn len(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
