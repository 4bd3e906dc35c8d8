// src/extract/mod.rs

//! Result extraction.
//!
//! Turns the free-form text a scanner printed into [`FindingRecord`]s:
//!
//! - [`grammar`] holds the per-tool patterns ([`ToolGrammar`]) and the
//!   read-only [`GrammarTable`].
//! - [`record`] defines the normalized record and its line format.
//! - [`extractor`] strips whitespace, scans, and reads/writes files.

pub mod extractor;
pub mod grammar;
pub mod record;

pub use extractor::{
    extract, extract_file, read_capture, render_records, strip_whitespace, write_records,
};
pub use grammar::{GrammarTable, RecordShape, ToolGrammar};
pub use record::FindingRecord;
