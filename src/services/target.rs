/// Header fragments that usually mark the column a dataset is meant to predict.
const TARGET_HINTS: [&str; 4] = ["target", "label", "class", "outcome"];

/// Suggests a target column: the first header, in file order, whose lowercased
/// name contains one of the hint words.
pub fn infer_target(headers: &[String]) -> Option<String> {
    headers
        .iter()
        .find(|header| {
            let lowered = header.to_lowercase();
            TARGET_HINTS.iter().any(|hint| lowered.contains(hint))
        })
        .cloned()
}
