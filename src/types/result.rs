//! Validation Domain Types
//!
//! The request/result shapes shared by every provider. A
//! [`ValidationResult`] is constructed once by the provider that produced
//! it and never mutated afterwards; the orchestrator either returns it or
//! replaces it wholesale when moving to the next provider.

use serde::{Deserialize, Serialize};

/// External validation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Gemini LLM (highest-trust, exclusive when configured)
    Gemini,
    /// DeepSeek LLM (optionally corroborated by web search context)
    DeepSeek,
    /// SerpAPI Google Search heuristic
    Search,
    /// Custom webhook workflow (e.g. n8n)
    Webhook,
    /// Local known-marking table, never fails
    LocalHeuristic,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::DeepSeek => write!(f, "deepseek"),
            Self::Search => write!(f, "search"),
            Self::Webhook => write!(f, "webhook"),
            Self::LocalHeuristic => write!(f, "local-heuristic"),
        }
    }
}

/// Authenticity verdict for one validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Fail,
    Warning,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

impl ValidationStatus {
    /// Lenient parse for status strings coming back from LLMs and
    /// webhooks. Anything unrecognized degrades to `Warning`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Self::Pass,
            "FAIL" => Self::Fail,
            _ => Self::Warning,
        }
    }
}

/// One rank-ordered web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Immutable input for one validation run
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// OCR-detected marking text, possibly empty
    pub detected_text: String,
    /// Opaque handle to the preprocessed ROI image; never inspected here
    pub preprocessed_image_ref: Option<String>,
}

impl ValidationRequest {
    pub fn new(detected_text: impl Into<String>) -> Self {
        Self {
            detected_text: detected_text.into(),
            preprocessed_image_ref: None,
        }
    }
}

/// Normalized outcome of one provider's validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Authenticity verdict
    pub status: ValidationStatus,
    /// One-line REAL/FAKE/UNCERTAIN summary
    pub summary: String,
    /// Full diagnostic text; never empty (a generic message is substituted
    /// when the provider gives none)
    pub analysis_text: String,
    /// Provider that produced this result
    pub source_provider: ProviderKind,
    /// Source attribution shown to the user
    pub reference_text: Option<String>,
    /// Web search evidence, when the provider consulted any
    pub search_results: Option<Vec<SearchHit>>,
}

const GENERIC_ANALYSIS: &str = "No analysis text supplied by the provider.";

impl ValidationResult {
    /// Construct a result, enforcing the non-empty `analysis_text`
    /// invariant.
    pub fn new(
        status: ValidationStatus,
        summary: impl Into<String>,
        analysis_text: impl Into<String>,
        source_provider: ProviderKind,
    ) -> Self {
        let analysis_text = {
            let text: String = analysis_text.into();
            if text.trim().is_empty() {
                GENERIC_ANALYSIS.to_string()
            } else {
                text
            }
        };
        Self {
            status,
            summary: summary.into(),
            analysis_text,
            source_provider,
            reference_text: None,
            search_results: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_text = Some(reference.into());
        self
    }

    pub fn with_search_results(mut self, results: Vec<SearchHit>) -> Self {
        self.search_results = Some(results);
        self
    }
}

/// Build the conventional summary line for a verdict and its reason
pub fn summary_line(status: ValidationStatus, reason: &str) -> String {
    match status {
        ValidationStatus::Pass => format!("REAL — {}", reason),
        ValidationStatus::Fail => format!("FAKE — {}", reason),
        ValidationStatus::Warning => format!("UNCERTAIN — {}", reason),
    }
}
