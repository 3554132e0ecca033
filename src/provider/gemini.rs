//! Gemini Validation Provider
//!
//! Classifies a marking with the Generative Language API. Product policy
//! treats Gemini as the highest-trust provider: when a key is configured
//! the chain contains Gemini alone, so this client does its own recovery
//! from model-selection mistakes. A model-related 400/404 walks an
//! explicit attempt plan (configured model, then the fixed flash-tier and
//! pro-tier fallbacks) with one full HTTP call per attempt; no backoff,
//! since the failure is model selection, not a transient fault.
//!
//! The original tool preferred a vendor SDK transport and fell back to
//! REST. There is no Gemini SDK in this stack, so both collapse into the
//! same REST call behind the [`Transport`] seam.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::transport::{SharedTransport, WireReply, WireRequest};
use super::verdict::{analysis_block, parse_verdict};
use super::MarkingValidator;
use crate::constants::{gemini, llm};
use crate::types::{
    summary_line, ErrorKind, ProviderError, ProviderKind, ValidationRequest, ValidationResult,
    ValidationStatus,
};

const SYSTEM_INSTRUCTION: &str = "You are an expert IC authenticity auditor. Given ONLY the OCR \
     text from an IC marking, classify the chip as REAL (genuine), FAKE (counterfeit/clone), or \
     UNCERTAIN. Return a compact JSON with keys: status in [PASS, FAIL, WARNING] and reason (one \
     short sentence).";

/// Gemini-backed marking validator
pub struct GeminiValidator {
    api_key: SecretString,
    model: String,
    transport: SharedTransport,
}

impl GeminiValidator {
    pub fn new(api_key: String, model_override: Option<&str>, transport: SharedTransport) -> Self {
        let model = normalize_model(model_override.unwrap_or(gemini::DEFAULT_MODEL));
        Self {
            api_key: SecretString::from(api_key),
            model,
            transport,
        }
    }

    /// Model identifiers to attempt, in order: the configured model, then
    /// the fixed fallbacks it does not already cover.
    fn model_plan(&self) -> Vec<&str> {
        let mut plan = vec![self.model.as_str()];
        plan.extend(
            gemini::FALLBACK_MODELS
                .iter()
                .copied()
                .filter(|m| *m != self.model),
        );
        plan
    }

    fn build_request(&self, model: &str, text: &str) -> WireRequest {
        let payload = json!({
            "systemInstruction": {
                "role": "system",
                "parts": [{"text": SYSTEM_INSTRUCTION}],
            },
            "contents": [{
                "role": "user",
                "parts": [{"text": format!("OCR text:\n{}\n", text.trim())}],
            }],
            "generationConfig": {"temperature": llm::TEMPERATURE},
        });

        let url = format!("{}/models/{}:generateContent", gemini::API_BASE, model);
        let mut request = WireRequest::post_json(url, payload);
        request.query.push((
            "key".to_string(),
            self.api_key.expose_secret().to_string(),
        ));
        request
    }
}

#[async_trait]
impl MarkingValidator for GeminiValidator {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError> {
        info!(model = %self.model, "Validating via Gemini");

        let plan = self.model_plan();
        let mut last_error: Option<ProviderError> = None;

        for (attempt, model) in plan.iter().enumerate() {
            debug!(attempt, model, "Gemini attempt");
            let reply = self
                .transport
                .execute(self.build_request(model, &request.detected_text))
                .await
                .map_err(|e| e.provider(ProviderKind::Gemini))?;

            if reply.is_success() {
                return parse_reply(&reply.body);
            }

            let error = classify_reply(&reply);
            // Model-related errors get the next model in the plan; anything
            // else is final.
            if !matches!(reply.status, 400 | 404) {
                return Err(error);
            }
            warn!(model, status = reply.status, "Gemini model attempt failed");
            last_error = Some(error);
        }

        let mut error = last_error.unwrap_or_else(|| {
            ProviderError::new(ErrorKind::Unknown, "No Gemini attempt was made")
                .provider(ProviderKind::Gemini)
        });
        error.hint.push_str(" (model fallback attempted)");
        Err(error)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }
}

/// Strip a leading `models/` namespace prefix; callers commonly paste a
/// fully-qualified name.
pub fn normalize_model(model: &str) -> String {
    let trimmed = model.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("models/") => trimmed[7..].to_string(),
        _ => trimmed.to_string(),
    }
}

fn classify_reply(reply: &WireReply) -> ProviderError {
    let body_low = reply.body.to_lowercase();
    let hint = match reply.status {
        401 | 403 => "Unauthorized: check GEMINI_API_KEY".to_string(),
        404 => "Model not found: set the Gemini model (e.g. gemini-1.5-flash or gemini-1.5-pro)"
            .to_string(),
        429 => "Rate limited: slow down or check quota".to_string(),
        400 => {
            if body_low.contains("api key not valid") || body_low.contains("not valid for this api")
            {
                "API key not valid for the Generative Language API: create a new key in Google AI Studio"
                    .to_string()
            } else if body_low.contains("unsupported location") {
                "Model unsupported in region: try gemini-1.5-flash or enable billing/region"
                    .to_string()
            } else if body_low.contains("model") {
                "Bad request: verify the Gemini model (e.g. gemini-1.5-flash or gemini-1.5-pro)"
                    .to_string()
            } else {
                "Bad request: verify payload and model name".to_string()
            }
        }
        status => format!("Unexpected HTTP {} from Gemini", status),
    };
    ProviderError::from_http(reply.status, hint, reply.body.clone()).provider(ProviderKind::Gemini)
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn parse_reply(body: &str) -> Result<ValidationResult, ProviderError> {
    let reply: GenerateReply = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(
            ErrorKind::Unknown,
            format!("Unexpected Gemini response shape: {}", e),
        )
        .provider(ProviderKind::Gemini)
    })?;

    let candidate = reply.candidates.first();

    let safety_blocked = candidate
        .and_then(|c| c.finish_reason.as_deref())
        .map(|r| r.eq_ignore_ascii_case("SAFETY"))
        .unwrap_or(false);
    if safety_blocked {
        let reason = "Content blocked by safety filters";
        return Ok(ValidationResult::new(
            ValidationStatus::Warning,
            summary_line(ValidationStatus::Warning, reason),
            format!("LLM Analysis:\n{}", reason),
            ProviderKind::Gemini,
        )
        .with_reference("Gemini"));
    }

    let text: String = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(
            ProviderError::new(ErrorKind::Unknown, "Empty response from Gemini")
                .provider(ProviderKind::Gemini),
        );
    }

    let verdict = parse_verdict(&text);
    Ok(ValidationResult::new(
        verdict.status,
        summary_line(verdict.status, &verdict.reason),
        analysis_block(&verdict),
        ProviderKind::Gemini,
    )
    .with_reference("Gemini"))
}
