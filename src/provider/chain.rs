//! Fallback Provider Chain
//!
//! Builds the provider order from the credentials at hand and drives the
//! attempts sequentially. Later providers are fallbacks contingent on
//! earlier malfunction, so nothing runs in parallel: speculative calls
//! would burn quota for answers that are usually discarded.
//!
//! ## Strategy
//!
//! 1. Derive the chain from available credentials (`build_chain`)
//! 2. Attempt providers in order
//! 3. Any verdict (PASS, FAIL, WARNING) is terminal; FAIL is an answer
//!    about authenticity, not a malfunction
//! 4. A `ProviderError` advances the chain, its hint is retained
//! 5. When every provider has failed, synthesize a FAIL result carrying
//!    every collected hint so the caller still gets actionable diagnostics

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::transport::HttpTransport;
use super::{
    DeepSeekValidator, GeminiValidator, LocalHeuristicValidator, SearchValidator, SharedValidator,
    WebhookValidator,
};
use crate::config::Config;
use crate::constants;
use crate::types::{
    summary_line, ProviderError, ProviderKind, Result, ValidationRequest, ValidationResult,
    ValidationStatus,
};

/// Compute the provider order for the given configuration.
///
/// Pure function of which credentials are present. A Gemini key makes the
/// chain exclusive: Gemini is the highest-trust provider per product
/// policy, and mixing verdicts from different reasoning engines in one
/// run is deliberately avoided.
pub fn build_chain(config: &Config) -> Vec<ProviderKind> {
    if config.gemini.api_key.is_some() {
        return vec![ProviderKind::Gemini];
    }
    if config.deepseek.api_key.is_some() {
        let mut chain = vec![ProviderKind::DeepSeek];
        if config.search.api_key.is_some() {
            chain.push(ProviderKind::Search);
        }
        chain.push(ProviderKind::LocalHeuristic);
        return chain;
    }
    if config.search.api_key.is_some() {
        return vec![ProviderKind::Search, ProviderKind::LocalHeuristic];
    }
    if config.webhook.url.is_some() {
        return vec![ProviderKind::Webhook, ProviderKind::LocalHeuristic];
    }
    vec![ProviderKind::LocalHeuristic]
}

/// Outcome of one chain attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Provider returned a terminal verdict
    Verdict(ValidationStatus),
    /// Provider malfunctioned; the chain advanced
    Failed(ProviderError),
}

/// One attempted provider with timing
#[derive(Debug)]
pub struct AttemptRecord {
    pub provider: ProviderKind,
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
}

/// Execution trace for one validation run
#[derive(Debug, Default)]
pub struct ChainReport {
    pub attempts: Vec<AttemptRecord>,
    pub total_duration_ms: u64,
}

/// Drives the provider chain for one request at a time
pub struct Orchestrator {
    validators: Vec<SharedValidator>,
}

impl Orchestrator {
    pub fn new(validators: Vec<SharedValidator>) -> Self {
        Self { validators }
    }

    /// Wire up validators for the chain the configuration yields
    pub fn from_config(config: &Config) -> Result<Self> {
        let search_client = match &config.search.api_key {
            Some(key) => Some(Arc::new(SearchValidator::new(
                key.clone(),
                HttpTransport::shared(constants::search::TIMEOUT_SECS)?,
            ))),
            None => None,
        };

        let mut validators: Vec<SharedValidator> = Vec::new();
        for kind in build_chain(config) {
            match kind {
                ProviderKind::Gemini => {
                    if let Some(key) = &config.gemini.api_key {
                        validators.push(Arc::new(GeminiValidator::new(
                            key.clone(),
                            config.gemini.model.as_deref(),
                            HttpTransport::shared(constants::gemini::TIMEOUT_SECS)?,
                        )));
                    }
                }
                ProviderKind::DeepSeek => {
                    if let Some(key) = &config.deepseek.api_key {
                        let mut validator = DeepSeekValidator::new(
                            key.clone(),
                            config.deepseek.model.as_deref(),
                            HttpTransport::shared(constants::deepseek::TIMEOUT_SECS)?,
                        );
                        if let Some(search) = &search_client {
                            validator = validator.with_search(Arc::clone(search));
                        }
                        validators.push(Arc::new(validator));
                    }
                }
                ProviderKind::Search => {
                    if let Some(search) = &search_client {
                        validators.push(Arc::clone(search) as SharedValidator);
                    }
                }
                ProviderKind::Webhook => {
                    if let Some(url) = &config.webhook.url {
                        validators.push(Arc::new(WebhookValidator::new(
                            url.clone(),
                            HttpTransport::shared(constants::webhook::TIMEOUT_SECS)?,
                        )));
                    }
                }
                ProviderKind::LocalHeuristic => {
                    validators.push(Arc::new(LocalHeuristicValidator::new()));
                }
            }
        }

        Ok(Self::new(validators))
    }

    /// Provider order this orchestrator will attempt
    pub fn chain(&self) -> Vec<ProviderKind> {
        self.validators.iter().map(|v| v.kind()).collect()
    }

    /// Validate a marking; never fails, the worst case is a synthetic
    /// FAIL result aggregating every provider's hint.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let (result, _report) = self.validate_with_report(request).await;
        result
    }

    /// Validate and return the attempt trace alongside the result
    pub async fn validate_with_report(
        &self,
        request: &ValidationRequest,
    ) -> (ValidationResult, ChainReport) {
        let start = Instant::now();
        let mut report = ChainReport::default();

        // Empty OCR output cannot be validated; fail before spending any
        // provider quota.
        if request.detected_text.trim().is_empty() {
            let result = ValidationResult::new(
                ValidationStatus::Fail,
                summary_line(ValidationStatus::Fail, "no OCR text to validate"),
                "OCR produced no text; adjust the crop or preprocessing and retry.",
                ProviderKind::LocalHeuristic,
            );
            report.total_duration_ms = start.elapsed().as_millis() as u64;
            return (result, report);
        }

        let mut errors: Vec<ProviderError> = Vec::new();

        for validator in &self.validators {
            let kind = validator.kind();
            debug!(provider = %kind, "Chain attempt");
            let attempt_start = Instant::now();

            match validator.validate(request).await {
                Ok(result) => {
                    let duration_ms = attempt_start.elapsed().as_millis() as u64;
                    report.attempts.push(AttemptRecord {
                        provider: kind,
                        outcome: AttemptOutcome::Verdict(result.status),
                        duration_ms,
                    });
                    report.total_duration_ms = start.elapsed().as_millis() as u64;

                    if !errors.is_empty() {
                        info!(
                            provider = %kind,
                            prior_failures = errors.len(),
                            "Chain succeeded after fallback"
                        );
                    } else {
                        info!(provider = %kind, status = %result.status, "Chain succeeded");
                    }
                    return (result, report);
                }
                Err(mut error) => {
                    if error.provider.is_none() {
                        error = error.provider(kind);
                    }
                    warn!(provider = %kind, error = %error, "Provider failed, advancing chain");
                    report.attempts.push(AttemptRecord {
                        provider: kind,
                        outcome: AttemptOutcome::Failed(error.clone()),
                        duration_ms: attempt_start.elapsed().as_millis() as u64,
                    });
                    errors.push(error);
                }
            }
        }

        report.total_duration_ms = start.elapsed().as_millis() as u64;
        (exhausted_result(&errors), report)
    }
}

/// Synthesize the terminal FAIL result for an exhausted chain. Every
/// hint is retained; the last attempt's raw body is appended for
/// diagnosis.
fn exhausted_result(errors: &[ProviderError]) -> ValidationResult {
    let source = errors
        .last()
        .and_then(|e| e.provider)
        .unwrap_or(ProviderKind::LocalHeuristic);

    let mut analysis = String::from("All validation providers failed.\n\nAttempts:\n");
    for error in errors {
        analysis.push_str(&format!("- {}\n", error));
    }
    if let Some(body) = errors.last().and_then(|e| e.raw_body.as_deref()) {
        if !body.is_empty() {
            analysis.push_str(&format!("\nLast response body:\n{}\n", body));
        }
    }

    ValidationResult::new(
        ValidationStatus::Fail,
        summary_line(ValidationStatus::Fail, "every validation provider failed"),
        analysis,
        source,
    )
}
