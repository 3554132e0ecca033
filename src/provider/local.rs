//! Local Heuristic Fallback
//!
//! Matches the OCR text against a small curated table of known-good
//! marking patterns. Never fails and needs no network, which makes it the
//! terminal entry of every non-exclusive chain. Absence of a known pattern
//! is not proof of inauthenticity, so a miss is a WARNING, never a FAIL.

use async_trait::async_trait;
use tracing::debug;

use super::MarkingValidator;
use crate::types::{
    summary_line, ProviderError, ProviderKind, ValidationRequest, ValidationResult,
    ValidationStatus,
};

/// Known part markings: part number -> valid marking substrings.
/// Shared with the search heuristic as a pattern source.
pub(crate) const KNOWN_MARKINGS: [(&str, &[&str]); 4] = [
    ("ATMEGA328P", &["MEGA328", "MEGA 328P", "ATMEGA328P"]),
    ("LM7805", &["7805", "LM7805"]),
    ("NE555", &["NE555", "LM555"]),
    (
        "TDA1060A",
        &["TDA1060A", "TDA 1060 A", "HSH92184 Y", "HSH92184", "4728"],
    ),
];

/// Offline known-marking validator
#[derive(Debug, Default)]
pub struct LocalHeuristicValidator;

impl LocalHeuristicValidator {
    pub fn new() -> Self {
        Self
    }

    /// Part numbers whose marking patterns occur in the given text
    fn matched_parts(text: &str) -> Vec<&'static str> {
        let upper = text.to_uppercase();
        KNOWN_MARKINGS
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| upper.contains(p)))
            .map(|(part, _)| *part)
            .collect()
    }
}

#[async_trait]
impl MarkingValidator for LocalHeuristicValidator {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError> {
        let matched = Self::matched_parts(&request.detected_text);
        debug!(matches = matched.len(), "Local heuristic lookup");

        let result = if matched.is_empty() {
            ValidationResult::new(
                ValidationStatus::Warning,
                summary_line(
                    ValidationStatus::Warning,
                    "no known marking pattern matched",
                ),
                "No local match for this marking; validate via web search or a webhook workflow.",
                ProviderKind::LocalHeuristic,
            )
        } else {
            let parts = matched.join(", ");
            ValidationResult::new(
                ValidationStatus::Pass,
                summary_line(ValidationStatus::Pass, "marking matches a known part"),
                format!("Matched known parts: {}", parts),
                ProviderKind::LocalHeuristic,
            )
        };

        Ok(result.with_reference("Local known-marking table"))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalHeuristic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_marking_passes() {
        let validator = LocalHeuristicValidator::new();
        let request = ValidationRequest::new("ATMEGA328P-PU 1923");
        let result = validator.validate(&request).await.expect("never fails");
        assert_eq!(result.status, ValidationStatus::Pass);
        assert!(result.analysis_text.contains("ATMEGA328P"));
        assert_eq!(result.source_provider, ProviderKind::LocalHeuristic);
    }

    #[tokio::test]
    async fn test_lowercase_marking_still_matches() {
        let validator = LocalHeuristicValidator::new();
        let request = ValidationRequest::new("ne555p texas");
        let result = validator.validate(&request).await.expect("never fails");
        assert_eq!(result.status, ValidationStatus::Pass);
    }

    #[tokio::test]
    async fn test_unknown_marking_warns_not_fails() {
        let validator = LocalHeuristicValidator::new();
        let request = ValidationRequest::new("ATML32U4");
        let result = validator.validate(&request).await.expect("never fails");
        assert_eq!(result.status, ValidationStatus::Warning);
        assert!(!result.analysis_text.is_empty());
    }
}
