use flate2::write::GzEncoder;
use flate2::Compression;
use logscan::{FileSearcher, SearchConfig, SearchResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn spec(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn write_gz(path: &Path, content: &str) {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    fs::write(path, enc.finish().unwrap()).unwrap();
}

fn lines(results: &[SearchResult]) -> Vec<(usize, Option<String>)> {
    results
        .iter()
        .map(|r| (r.line_number(), r.get(1).map(str::to_string)))
        .collect()
}

#[test]
fn test_directory_spec_scans_children_only() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.log"), "ERROR one\nINFO two\n").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/b.log"), "ERROR nested\n").unwrap();

    let mut searcher = FileSearcher::default();
    searcher
        .add_search_term(r"ERROR (\w+)", &[1], &spec(dir.path()), Some("err"))
        .unwrap();
    let results = searcher.search().unwrap();

    let files: Vec<_> = results.files().map(Path::to_path_buf).collect();
    assert_eq!(files, vec![dir.path().join("a.log")]);
    let found = results.find_by_tag("err", None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get(1), Some("one"));
}

#[test]
fn test_glob_spec_and_gzip_rotation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("syslog"), "kernel: oops 3\n").unwrap();
    write_gz(&dir.path().join("syslog.1.gz"), "boot\nkernel: oops 1\n");
    fs::write(dir.path().join("messages"), "kernel: oops 9\n").unwrap();

    let mut searcher = FileSearcher::default();
    let pattern = format!("{}/syslog*", dir.path().display());
    searcher
        .add_search_term(r"kernel: oops (\d+)", &[1], &pattern, None)
        .unwrap();
    let results = searcher.search().unwrap();

    assert_eq!(results.files().count(), 2);
    assert_eq!(
        lines(results.find_by_path(&dir.path().join("syslog.1.gz"))),
        vec![(2, Some("1".to_string()))]
    );
    assert_eq!(
        lines(results.find_by_path(&dir.path().join("syslog"))),
        vec![(1, Some("3".to_string()))]
    );
    assert!(results.find_by_path(&dir.path().join("messages")).is_empty());
}

#[test]
fn test_multiple_terms_share_a_path_spec() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.log");
    fs::write(&file, "start job\nend job\nstart other\n").unwrap();

    let mut searcher = FileSearcher::default();
    searcher
        .add_search_term(r"start (\w+)", &[1], &spec(&file), Some("s"))
        .unwrap();
    searcher
        .add_search_term(r"end (\w+)", &[1], &spec(&file), Some("e"))
        .unwrap();
    let results = searcher.search().unwrap();

    let all = results.find_by_path(&file);
    let tags: Vec<_> = all.iter().map(|r| (r.line_number(), r.tag())).collect();
    assert_eq!(tags, vec![(1, Some("s")), (2, Some("e")), (3, Some("s"))]);
    assert_eq!(results.find_by_tag("s", Some(&file)).len(), 2);
}

#[test]
fn test_unreadable_file_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let mut valid = Vec::new();
    for i in 0..4 {
        let path = dir.path().join(format!("host{i}.log"));
        fs::write(&path, format!("noise\nfailed unit {i}\nfailed unit x{i}\n")).unwrap();
        valid.push(path);
    }

    let run = |paths: &[PathBuf]| {
        let mut searcher = FileSearcher::default();
        for p in paths {
            searcher
                .add_search_term(r"failed unit (\S+)", &[1], &spec(p), None)
                .unwrap();
        }
        searcher.search().unwrap()
    };
    let baseline = run(&valid);

    // Valid gzip header, corrupt deflate stream.
    let broken = dir.path().join("host9.log.gz");
    fs::write(
        &broken,
        [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03, 0xff, 0xff, 0xff, 0xff],
    )
    .unwrap();
    let mut with_broken = valid.clone();
    with_broken.insert(2, broken.clone());
    let results = run(&with_broken);

    assert_eq!(
        results.files().collect::<Vec<_>>(),
        baseline.files().collect::<Vec<_>>()
    );
    for path in &valid {
        assert_eq!(results.find_by_path(path), baseline.find_by_path(path));
        assert_eq!(results.find_by_path(path).len(), 2);
    }
    assert!(results.find_by_path(&broken).is_empty());
}

#[test]
fn test_serial_pool_returns_every_file() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        fs::write(dir.path().join(format!("f{i}.log")), format!("id={i}\n")).unwrap();
    }

    let config = SearchConfig::with_override(0);
    assert_eq!(config.worker_count(), 1);
    let mut searcher = FileSearcher::new(config);
    searcher
        .add_search_term(r"id=(\d)", &[1], &spec(dir.path()), Some("id"))
        .unwrap();
    let results = searcher.search().unwrap();

    assert_eq!(results.files().count(), 5);
    let mut ids: Vec<_> = results
        .find_by_tag("id", None)
        .iter()
        .filter_map(|r| r.get(1).map(str::to_string))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_empty_resolution_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let mut searcher = FileSearcher::default();
    searcher
        .add_search_term("x", &[], &spec(&dir.path().join("nothing-*.log")), None)
        .unwrap();
    searcher
        .add_search_term("x", &[], &spec(&dir.path().join("missing.log")), None)
        .unwrap();
    let results = searcher.search().unwrap();
    assert!(results.is_empty());
    assert_eq!(results.files().count(), 0);
}

#[test]
fn test_logrotate_depth_limits_directory_scan() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("syslog"), "hit\n").unwrap();
    fs::write(dir.path().join("syslog.1"), "hit\n").unwrap();
    write_gz(&dir.path().join("syslog.2.gz"), "hit\n");

    let config = SearchConfig {
        max_logrotate_depth: Some(1),
        ..Default::default()
    };
    let mut searcher = FileSearcher::new(config);
    searcher
        .add_search_term("hit", &[], &spec(dir.path()), None)
        .unwrap();
    let results = searcher.search().unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.find_by_path(&dir.path().join("syslog.2.gz")).is_empty());
}
