use std::path::Path;
use crate::error::IngestError;

/// Media types browsers are known to report for `.csv` files.
const CSV_CONTENT_TYPES: [&str; 8] = [
    "text/csv",
    "application/csv",
    "text/x-csv",
    "application/x-csv",
    "text/comma-separated-values",
    "application/vnd.ms-excel",
    "text/plain",
    "application/octet-stream",
];

/// What the validator gets to see: the client's declared metadata, not the content.
#[derive(Debug, Clone, Copy)]
pub struct FileCandidate<'a> {
    pub name: &'a str,
    pub size: u64,
    pub content_type: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_file_size: u64,
}

impl Validator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size: max_file_size as u64 }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn validate(&self, candidate: &FileCandidate<'_>) -> Result<(), IngestError> {
        if candidate.size > self.max_file_size {
            return Err(IngestError::TooLarge {
                size: candidate.size,
                limit: self.max_file_size,
            });
        }

        if !has_csv_extension(candidate.name) || !is_csv_content_type(candidate.content_type) {
            return Err(IngestError::WrongType {
                name: candidate.name.to_string(),
                content_type: candidate.content_type.map(str::to_string),
            });
        }

        Ok(())
    }
}

fn has_csv_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_csv_content_type(content_type: Option<&str>) -> bool {
    let media_type = match content_type {
        Some(value) => value.split(';').next().unwrap_or("").trim(),
        None => return true,
    };

    // Missing type: the extension is the only signal we have.
    if media_type.is_empty() {
        return true;
    }

    CSV_CONTENT_TYPES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(media_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 50 * 1024 * 1024;

    fn candidate<'a>(name: &'a str, size: u64, content_type: Option<&'a str>) -> FileCandidate<'a> {
        FileCandidate { name, size, content_type }
    }

    #[test]
    fn accepts_csv_at_the_limit() {
        let validator = Validator::new(LIMIT);
        assert!(validator.validate(&candidate("data.csv", 52_428_800, Some("text/csv"))).is_ok());
        assert!(validator.validate(&candidate("DATA.CSV", 10, None)).is_ok());
        assert!(validator
            .validate(&candidate("data.csv", 10, Some("text/csv; charset=utf-8")))
            .is_ok());
        assert!(validator
            .validate(&candidate("data.csv", 10, Some("application/vnd.ms-excel")))
            .is_ok());
    }

    #[test]
    fn size_is_checked_before_type() {
        let validator = Validator::new(LIMIT);
        let err = validator
            .validate(&candidate("photo.png", 60_000_000, Some("image/png")))
            .unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { size: 60_000_000, limit: 52_428_800 }));

        let err = validator
            .validate(&candidate("data.csv", 52_428_801, Some("text/csv")))
            .unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { .. }));
    }

    #[test]
    fn rejects_non_csv_files() {
        let validator = Validator::new(LIMIT);
        for (name, content_type) in [
            ("data.xlsx", Some("text/csv")),
            ("data", None),
            ("data.csv.txt", Some("text/plain")),
            ("data.csv", Some("image/png")),
            ("data.csv", Some("application/json")),
        ] {
            let err = validator.validate(&candidate(name, 10, content_type)).unwrap_err();
            assert!(matches!(err, IngestError::WrongType { .. }), "{} should be rejected", name);
        }
    }
}
