use smallvec::SmallVec;

use crate::models::{ColumnSummary, ParsedPreview, SAMPLE_SIZE};

/// Produces per-column summaries for the dashboard from a preview.
pub trait ColumnAnalyzer: Send + Sync {
    fn analyze(&self, preview: &ParsedPreview, target: Option<&str>) -> Vec<ColumnSummary>;
}

/// Placeholder analyzer: reports what the preview itself shows and leaves column
/// types unclassified.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewColumnAnalyzer;

impl ColumnAnalyzer for PreviewColumnAnalyzer {
    fn analyze(&self, preview: &ParsedPreview, target: Option<&str>) -> Vec<ColumnSummary> {
        preview
            .headers
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells = preview.rows.iter().filter_map(|row| row.get(col_idx));

                let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
                let mut non_empty_count = 0;
                for cell in cells {
                    if sample_values.len() < SAMPLE_SIZE {
                        sample_values.push(cell.clone());
                    }
                    if !cell.is_empty() {
                        non_empty_count += 1;
                    }
                }

                ColumnSummary {
                    name: name.clone(),
                    data_type: "unclassified".to_string(),
                    sample_values,
                    non_empty_count,
                    is_target: target == Some(name.as_str()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> ParsedPreview {
        let rows = [
            vec!["1", "yes", "30"],
            vec!["2", "", "40"],
            vec!["3", "no"],
            vec!["4", "yes", "50"],
        ];
        ParsedPreview {
            headers: vec!["id".into(), "target".into(), "age".into()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            row_count: 4,
            size_label: "40 Bytes".into(),
        }
    }

    #[test]
    fn one_summary_per_header() {
        let summaries = PreviewColumnAnalyzer.analyze(&preview(), Some("target"));
        assert_eq!(summaries.len(), 3);

        let target = &summaries[1];
        assert!(target.is_target);
        assert_eq!(target.data_type, "unclassified");
        assert_eq!(target.sample_values.as_slice(), ["yes", "", "no"]);
        assert_eq!(target.non_empty_count, 3);

        // Short rows simply contribute nothing for the missing cell.
        let age = &summaries[2];
        assert!(!age.is_target);
        assert_eq!(age.sample_values.as_slice(), ["30", "40", "50"]);
        assert_eq!(age.non_empty_count, 3);
    }

    #[test]
    fn header_only_preview_has_empty_samples() {
        let mut p = preview();
        p.rows.clear();
        let summaries = PreviewColumnAnalyzer.analyze(&p, None);
        assert!(summaries.iter().all(|s| s.sample_values.is_empty() && !s.is_target));
    }
}
