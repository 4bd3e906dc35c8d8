// src/extract/extractor.rs

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::errors::ExtractionError;
use crate::extract::grammar::{RecordShape, ToolGrammar};
use crate::extract::record::FindingRecord;

/// Remove every whitespace character.
///
/// Scanner reports wrap fields across lines at arbitrary points, so the
/// grammars are written against the stripped text.
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extract all findings from `raw`, in left-to-right order.
///
/// Pure: the same `(raw, grammar)` always yields the same records. No match
/// yields an empty vector.
pub fn extract(raw: &str, grammar: &ToolGrammar) -> Vec<FindingRecord> {
    let stripped = strip_whitespace(raw);

    grammar
        .regex()
        .captures_iter(&stripped)
        .filter_map(|caps| match grammar.shape() {
            RecordShape::SizeAndOffset => {
                let key_size = caps.get(1)?.as_str().parse::<u16>().ok()?;
                let offset = caps.get(2)?.as_str().to_ascii_lowercase();
                Some(FindingRecord::SizedKey { key_size, offset })
            }
            RecordShape::Offset => {
                let offset = caps.get(1)?.as_str().to_ascii_lowercase();
                Some(FindingRecord::Key { offset })
            }
        })
        .collect()
}

/// Read a raw capture file as UTF-8 text.
pub fn read_capture(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path).map_err(|source| ExtractionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    String::from_utf8(bytes).map_err(|_| ExtractionError::NotText {
        path: path.to_path_buf(),
    })
}

/// Read a raw capture file and extract findings from it.
pub fn extract_file(
    path: &Path,
    grammar: &ToolGrammar,
) -> Result<Vec<FindingRecord>, ExtractionError> {
    let raw = read_capture(path)?;
    let records = extract(&raw, grammar);
    debug!(
        tool = %grammar.tool(),
        path = ?path,
        records = records.len(),
        "extracted findings from capture"
    );
    Ok(records)
}

/// One record per line, each line terminated by `\n`.
pub fn render_records(records: &[FindingRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}

/// Write records to `path`.
///
/// The file is written next to its final location and renamed into place,
/// so a reader never sees a half-written values file.
pub fn write_records(path: &Path, records: &[FindingRecord]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".partial");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(render_records(records).as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(tmp_path, path)
}
