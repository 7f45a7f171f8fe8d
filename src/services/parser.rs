use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::IngestError;
use crate::models::ParsedPreview;
use crate::services::utils::format_size_label;

/// How a line is split into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Split on every comma, trim, strip one layer of surrounding quotes. Commas or
    /// newlines inside quoted values are not supported.
    Naive,
    /// Quote-aware splitting through the `csv` reader.
    Rfc4180,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown parse mode {0:?}, expected \"naive\" or \"rfc4180\"")]
pub struct UnknownParseMode(String);

impl FromStr for ParseMode {
    type Err = UnknownParseMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(ParseMode::Naive),
            "rfc4180" | "rfc" => Ok(ParseMode::Rfc4180),
            other => Err(UnknownParseMode(other.to_string())),
        }
    }
}

pub struct PreviewParser {
    mode: ParseMode,
    preview_rows: usize,
}

impl PreviewParser {
    pub fn new(mode: ParseMode, preview_rows: usize) -> Self {
        Self { mode, preview_rows }
    }

    /// Parses decoded text into headers, the first `preview_rows` data rows and the
    /// total data row count. `byte_size` only feeds the size label.
    ///
    /// Records are streamed: rows past the preview are counted but never split into
    /// cells.
    pub fn parse(&self, text: &str, byte_size: u64) -> Result<ParsedPreview, IngestError> {
        let mut sample = Sample::new(self.preview_rows);
        match self.mode {
            ParseMode::Naive => naive_records(text, &mut sample),
            ParseMode::Rfc4180 => rfc4180_records(text, &mut sample)?,
        }

        let headers = sample
            .headers
            .ok_or_else(|| IngestError::ParseFailure("file contains no header line".to_string()))?;

        Ok(ParsedPreview {
            headers,
            rows: sample.rows,
            row_count: sample.row_count,
            size_label: format_size_label(byte_size),
        })
    }
}

/// Header, bounded preview rows and a running data row count.
struct Sample {
    limit: usize,
    headers: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    row_count: usize,
}

impl Sample {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            headers: None,
            rows: Vec::with_capacity(limit),
            row_count: 0,
        }
    }

    /// `cells` only runs for the header and for rows that make it into the preview.
    fn push(&mut self, cells: impl FnOnce() -> Vec<String>) {
        if self.headers.is_none() {
            self.headers = Some(cells());
            return;
        }
        if self.rows.len() < self.limit {
            self.rows.push(cells());
        }
        self.row_count += 1;
    }
}

fn naive_records(text: &str, sample: &mut Sample) {
    for line in text.split('\n').filter(|line| !line.trim().is_empty()) {
        sample.push(|| split_line(line));
    }
}

fn split_line(line: &str) -> Vec<String> {
    line.split(',').map(clean_cell).collect()
}

fn clean_cell(cell: &str) -> String {
    let trimmed = cell.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

fn rfc4180_records(text: &str, sample: &mut Sample) -> Result<(), IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut record = StringRecord::new();
    let mut index = 0;
    loop {
        index += 1;
        let more = reader.read_record(&mut record).map_err(|e| {
            IngestError::ParseFailure(format!("failed to read record {}: {}", index, e))
        })?;
        if !more {
            return Ok(());
        }

        // A line of only whitespace comes back as a single empty field.
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        sample.push(|| record.iter().map(str::to_string).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive() -> PreviewParser {
        PreviewParser::new(ParseMode::Naive, 10)
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_header_and_rows() {
        let preview = naive().parse("id,target,age\n1,yes,30\n2,no,40\n", 35).unwrap();
        assert_eq!(preview.headers, strings(&["id", "target", "age"]));
        assert_eq!(preview.row_count, 2);
        assert_eq!(
            preview.rows,
            vec![strings(&["1", "yes", "30"]), strings(&["2", "no", "40"])]
        );
        assert_eq!(preview.size_label, "35 Bytes");
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let preview = naive().parse("id,age\n", 7).unwrap();
        assert_eq!(preview.headers, strings(&["id", "age"]));
        assert_eq!(preview.row_count, 0);
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn strips_one_layer_of_quotes() {
        let preview = naive().parse("\"full name\",age\n\"John Doe\",30\n", 30).unwrap();
        assert_eq!(preview.headers, strings(&["full name", "age"]));
        assert_eq!(preview.rows, vec![strings(&["John Doe", "30"])]);

        let preview = naive().parse("\"\"quoted\"\"\n x \n", 10).unwrap();
        assert_eq!(preview.headers, strings(&["\"quoted\""]));
        assert_eq!(preview.rows, vec![strings(&["x"])]);
    }

    #[test]
    fn empty_or_blank_input_is_a_parse_failure() {
        assert!(matches!(naive().parse("", 0), Err(IngestError::ParseFailure(_))));
        assert!(matches!(naive().parse(" \n\r\n\t\n", 6), Err(IngestError::ParseFailure(_))));
    }

    #[test]
    fn blank_lines_are_not_counted_and_crlf_is_trimmed() {
        let preview = naive().parse("a,b\r\n\r\n1,2\r\n   \n3,4\r\n", 20).unwrap();
        assert_eq!(preview.headers, strings(&["a", "b"]));
        assert_eq!(preview.row_count, 2);
        assert_eq!(preview.rows, vec![strings(&["1", "2"]), strings(&["3", "4"])]);
    }

    #[test]
    fn preview_is_bounded_but_count_is_not() {
        let mut text = String::from("n\n");
        for i in 0..25 {
            text.push_str(&format!("{}\n", i));
        }
        let preview = naive().parse(&text, text.len() as u64).unwrap();
        assert_eq!(preview.row_count, 25);
        assert_eq!(preview.rows.len(), 10);
        assert_eq!(preview.rows[9], strings(&["9"]));

        let small = PreviewParser::new(ParseMode::Naive, 3).parse(&text, 0).unwrap();
        assert_eq!(small.rows.len(), 3);
        assert_eq!(small.row_count, 25);
    }

    #[test]
    fn large_input_keeps_only_the_preview() {
        let mut text = String::from("id,\"note\"\n");
        for i in 0..100_000 {
            text.push_str(&format!("{},\"row {}\"\n", i, i));
        }

        for mode in [ParseMode::Naive, ParseMode::Rfc4180] {
            let preview = PreviewParser::new(mode, 10).parse(&text, text.len() as u64).unwrap();
            assert_eq!(preview.headers, strings(&["id", "note"]));
            assert_eq!(preview.row_count, 100_000);
            assert_eq!(preview.rows.len(), 10);
            assert_eq!(preview.rows[9], strings(&["9", "row 9"]));
        }
    }

    #[test]
    fn ragged_rows_and_duplicate_headers_are_kept() {
        let preview = naive().parse("a,a,b\n1,2\n1,2,3,4\n", 20).unwrap();
        assert_eq!(preview.headers, strings(&["a", "a", "b"]));
        assert_eq!(preview.rows[0], strings(&["1", "2"]));
        assert_eq!(preview.rows[1], strings(&["1", "2", "3", "4"]));
    }

    #[test]
    fn naive_mode_splits_inside_quotes() {
        let preview = naive().parse("name,city\n\"Doe, John\",Paris\n", 30).unwrap();
        assert_eq!(preview.rows[0], strings(&["\"Doe", "John\"", "Paris"]));
    }

    #[test]
    fn rfc4180_mode_honours_quoted_delimiters_and_newlines() {
        let parser = PreviewParser::new(ParseMode::Rfc4180, 10);
        let text = "name,notes\n\"Doe, John\",\"line one\nline two\"\n\n  \nJane,ok\n";
        let preview = parser.parse(text, text.len() as u64).unwrap();
        assert_eq!(preview.headers, strings(&["name", "notes"]));
        assert_eq!(preview.row_count, 2);
        assert_eq!(preview.rows[0], strings(&["Doe, John", "line one\nline two"]));
        assert_eq!(preview.rows[1], strings(&["Jane", "ok"]));

        assert!(matches!(parser.parse("", 0), Err(IngestError::ParseFailure(_))));
    }

    #[test]
    fn parse_mode_from_str() {
        assert_eq!("naive".parse::<ParseMode>().unwrap(), ParseMode::Naive);
        assert_eq!(" RFC4180 ".parse::<ParseMode>().unwrap(), ParseMode::Rfc4180);
        assert!("tsv".parse::<ParseMode>().is_err());
    }
}
