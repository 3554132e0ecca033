//! MarkCheck - IC Marking Validation Orchestrator
//!
//! Validates OCR-detected integrated-circuit marking text against
//! external knowledge sources and reports an authenticity verdict
//! (PASS, FAIL, or WARNING) with supporting analysis.
//!
//! ## Core Features
//!
//! - **Provider Chain**: credential-driven fallback across Gemini,
//!   DeepSeek, web search, webhook workflows, and a local marking table
//! - **Never Errors Out**: an exhausted chain yields a synthetic FAIL
//!   result carrying every provider's remediation hint
//! - **Retry Plans**: model and endpoint fallback inside the LLM
//!   providers before the chain ever advances
//! - **Query Cache**: TTL-bounded cache for repeated search lookups
//!
//! ## Quick Start
//!
//! ```ignore
//! use markcheck::{ConfigLoader, Orchestrator, ValidationRequest};
//!
//! let config = ConfigLoader::load()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let result = orchestrator.validate(&ValidationRequest::new("NE555P")).await;
//! println!("{}: {}", result.status, result.summary);
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: validator implementations and the fallback chain
//! - [`config`]: layered configuration (files, environment)
//! - [`report`]: terminal rendering of results and chain traces
//! - [`types`]: shared domain types and the error taxonomy

pub mod config;
pub mod constants;
pub mod provider;
pub mod report;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{ErrorKind, MarkError, ProviderError, Result};

// Domain
pub use types::{
    ProviderKind, SearchHit, ValidationRequest, ValidationResult, ValidationStatus,
};

// Chain
pub use provider::{
    build_chain, ChainReport, MarkingValidator, Orchestrator, SharedValidator,
};
