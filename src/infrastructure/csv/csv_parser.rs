// ============================================================
// CSV PARSER
// ============================================================
// Lenient parsing for operator-supplied catalog exports: unknown
// encodings and malformed rows must not kill an import.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;
use tracing::warn;

use crate::domain::error::{AppError, Result};

/// A parsed delimited file: the header row plus every row that could be
/// decoded. Malformed rows are counted, not kept.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct CsvRow {
    /// 1-based data row number, for warnings.
    pub line: usize,
    pub values: Vec<String>,
}

pub struct CsvParser {
    delimiter: u8,
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a file, decoding leniently. A missing or unreadable file is
    /// fatal; a bad row is skipped with a warning.
    pub fn parse_file(&self, path: &Path) -> Result<CsvTable> {
        if !path.exists() {
            return Err(AppError::ConfigError(format!(
                "CSV file not found: '{}'",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| AppError::IoError(format!("Failed to read '{}': {}", path.display(), e)))?;
        let content = decode_lenient(&bytes);
        self.parse_content(&content)
    }

    pub fn parse_content(&self, content: &str) -> Result<CsvTable> {
        // Strict field counts: a row with the wrong number of fields is
        // a bad line, and bad lines are skipped below instead of
        // aborting the whole file.
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        if headers.is_empty() {
            return Err(AppError::ParseError("CSV file has no header row".to_string()));
        }

        let mut rows = Vec::new();
        let mut skipped_rows = 0;
        for (index, result) in reader.records().enumerate() {
            let line = index + 1;
            match result {
                Ok(record) => rows.push(CsvRow {
                    line,
                    values: record.iter().map(|v| v.to_string()).collect(),
                }),
                Err(e) => {
                    warn!(line, error = %e, "skipping malformed CSV row");
                    skipped_rows += 1;
                }
            }
        }

        Ok(CsvTable {
            headers,
            rows,
            skipped_rows,
        })
    }
}

/// UTF-8 when the bytes are valid UTF-8, otherwise Windows-1252 (a
/// superset of Latin-1, which these exports use in practice). Never
/// fails: every byte maps to something.
fn decode_lenient(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = WINDOWS_1252.decode(bytes);
            content.into_owned()
        }
    }
}
