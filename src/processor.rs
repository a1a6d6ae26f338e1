use crate::search::results::SearchResult;
use crate::search::PatternTerm;
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens `path` for line reading, decompressing on the fly when the file
/// carries a gzip header.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let compressed = reader
        .fill_buf()
        .with_context(|| format!("Failed to read {}", path.display()))?
        .starts_with(&GZIP_MAGIC);

    if compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Runs every term against every line of `path`.
///
/// Undecodable bytes are replaced rather than failing the line. Any stream
/// level error aborts the whole file so callers never see a partial scan.
pub fn scan_file(path: &Path, terms: &[PatternTerm]) -> Result<Vec<SearchResult>> {
    let mut reader = open_reader(path)?;
    let mut results = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read {} after line {line_number}", path.display()))?;
        if n == 0 {
            break;
        }
        line_number += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&buf);

        for term in terms {
            if let Some(result) = term.match_line(&line, line_number, path) {
                results.push(result);
            }
        }
    }

    Ok(results)
}
