//! Validation Provider Abstraction
//!
//! Defines the [`MarkingValidator`] trait implemented by every external
//! validation source. Each provider normalizes its own wire payload into a
//! [`ValidationResult`] and classifies its own failures into a
//! [`crate::types::ProviderError`] before the orchestrator sees either.
//!
//! ## Modules
//!
//! - `chain`: credential-driven chain building and the orchestrator
//! - `gemini` / `deepseek`: LLM providers with model/endpoint retry plans
//! - `serpapi`: web search provider with query cache
//! - `webhook`: custom workflow passthrough
//! - `local`: known-marking table, the never-failing terminal fallback

mod cache;
mod chain;
mod deepseek;
mod gemini;
mod local;
mod serpapi;
mod transport;
mod verdict;
mod webhook;

pub use chain::{build_chain, AttemptRecord, AttemptOutcome, ChainReport, Orchestrator};
pub use deepseek::DeepSeekValidator;
pub use gemini::GeminiValidator;
pub use local::LocalHeuristicValidator;
pub use serpapi::SearchValidator;
pub use transport::{HttpTransport, SharedTransport, Transport, WireMethod, WireReply, WireRequest};
pub use webhook::WebhookValidator;

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{ProviderError, ProviderKind, ValidationRequest, ValidationResult};

/// Contract shared by every validation provider.
///
/// `Ok` carries a terminal verdict (PASS, FAIL, and WARNING are all valid
/// answers about authenticity); `Err` signals a provider malfunction that
/// the orchestrator may recover from by advancing the chain.
#[async_trait]
pub trait MarkingValidator: Send + Sync {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError>;

    /// Which provider this is, for chain routing and diagnostics
    fn kind(&self) -> ProviderKind;
}

/// Shared validator handle used by the orchestrator
pub type SharedValidator = Arc<dyn MarkingValidator>;
