// Input validation: runs before any scorer call.

use std::collections::HashSet;

use super::error::ValidationError;
use super::models::ValidatedInput;

/// Check text and labels, returning the trimmed text and the label set.
///
/// Text is trimmed before the emptiness check, and the trimmed text is what
/// gets scored. Labels are kept as given (order matters for tie-breaking),
/// but blank or repeated labels are rejected.
pub fn validate(text: Option<&str>, labels: &[String]) -> Result<ValidatedInput, ValidationError> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }

    if labels.is_empty() {
        return Err(ValidationError::EmptyLabelSet);
    }

    let mut seen = HashSet::with_capacity(labels.len());
    for (index, label) in labels.iter().enumerate() {
        if label.trim().is_empty() {
            return Err(ValidationError::BlankLabel { index });
        }
        if !seen.insert(label.as_str()) {
            return Err(ValidationError::DuplicateLabel(label.clone()));
        }
    }

    Ok(ValidatedInput {
        text: text.to_string(),
        labels: labels.to_vec(),
    })
}
