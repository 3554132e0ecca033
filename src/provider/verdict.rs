//! LLM Verdict Parsing
//!
//! Both LLM providers ask for a compact JSON answer
//! (`{"status": "PASS|FAIL|WARNING", "reason": "..."}`) but models do not
//! always comply. Parsing falls back to a keyword heuristic over the raw
//! text, keeping a truncated excerpt as the reason.

use serde_json::Value;

use crate::constants::llm;
use crate::types::ValidationStatus;

pub const NO_REASON: &str = "No reason provided.";

/// A parsed authenticity verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: ValidationStatus,
    pub reason: String,
}

/// Parse an LLM answer into a verdict: structured JSON first, keyword
/// inference second.
pub fn parse_verdict(text: &str) -> Verdict {
    let trimmed = text.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let status = map
            .get("status")
            .and_then(Value::as_str)
            .map(ValidationStatus::parse_lenient)
            .unwrap_or(ValidationStatus::Warning);
        let reason = map
            .get("reason")
            .and_then(Value::as_str)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(NO_REASON)
            .to_string();
        return Verdict { status, reason };
    }

    let low = trimmed.to_lowercase();
    let status = if ["pass", "real", "genuine"].iter().any(|k| low.contains(k)) {
        ValidationStatus::Pass
    } else if ["fail", "fake", "counterfeit"].iter().any(|k| low.contains(k)) {
        ValidationStatus::Fail
    } else {
        ValidationStatus::Warning
    };

    let reason: String = trimmed.chars().take(llm::REASON_MAX_CHARS).collect();
    let reason = if reason.is_empty() {
        NO_REASON.to_string()
    } else {
        reason
    };

    Verdict { status, reason }
}

/// The conventional "LLM Analysis" section body for a parsed verdict
pub fn analysis_block(verdict: &Verdict) -> String {
    format!(
        "LLM Analysis:\nStatus: {}\nReason: {}",
        verdict.status, verdict.reason
    )
}
