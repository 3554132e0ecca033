//! Unified Error Type System
//!
//! Centralized error types for the whole crate.
//!
//! ## Error layers
//!
//! - [`ProviderError`]: a classified failure of one external validation
//!   provider. Every provider failure is mapped to exactly one
//!   [`ErrorKind`] and carries a literal remediation hint before the
//!   orchestrator ever sees it.
//! - [`MarkError`]: the application error for everything outside the
//!   provider chain (configuration, IO, serialization).
//!
//! The orchestrator itself never surfaces an error to the caller: an
//! exhausted chain is reported as a synthetic FAIL `ValidationResult`
//! carrying the collected hints.

use thiserror::Error;

use super::result::ProviderKind;

// =============================================================================
// Provider Error Taxonomy
// =============================================================================

/// Classification of a provider malfunction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing credential (HTTP 401/403)
    Auth,
    /// Quota exhausted or throttled (HTTP 429)
    RateLimit,
    /// Payment required (HTTP 402)
    Billing,
    /// Endpoint or model not found, after retries (HTTP 404)
    NotFound,
    /// Malformed request, model name, or unsupported region (HTTP 400)
    BadRequest,
    /// Network or connection failure, no HTTP status available
    Transport,
    /// Unclassified failure
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "AUTH"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Billing => write!(f, "BILLING"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorKind {
    /// Map an HTTP status code to a kind. Providers refine the hint text;
    /// the kind mapping itself is uniform across providers.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::Auth,
            402 => Self::Billing,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            _ => Self::Unknown,
        }
    }
}

/// A classified provider failure with remediation hint and diagnostics
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Failure classification
    pub kind: ErrorKind,
    /// HTTP status if the failure came from a completed HTTP exchange
    pub http_status: Option<u16>,
    /// Raw response body, preserved for diagnosis
    pub raw_body: Option<String>,
    /// Human-readable remediation hint
    pub hint: String,
    /// Provider that produced the failure, filled in by the orchestrator
    /// when missing
    pub provider: Option<ProviderKind>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.provider, self.http_status) {
            (Some(p), Some(s)) => write!(f, "[{}:{}] HTTP {}: {}", p, self.kind, s, self.hint),
            (Some(p), None) => write!(f, "[{}:{}] {}", p, self.kind, self.hint),
            (None, Some(s)) => write!(f, "[{}] HTTP {}: {}", self.kind, s, self.hint),
            (None, None) => write!(f, "[{}] {}", self.kind, self.hint),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Create a new provider error
    pub fn new(kind: ErrorKind, hint: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            raw_body: None,
            hint: hint.into(),
            provider: None,
        }
    }

    /// Create from an HTTP status, keeping the response body for diagnosis
    pub fn from_http(status: u16, hint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            http_status: Some(status),
            raw_body: Some(body.into()),
            hint: hint.into(),
            provider: None,
        }
    }

    /// Create a transport-level error (no HTTP status available)
    pub fn transport(hint: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, hint)
    }

    /// Override the classification (e.g. a 404 that stands for a missing
    /// model rather than a missing endpoint)
    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach the originating provider
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, MarkError>;

// =============================================================================
// Tests
// =============================================================================
