//! DeepSeek Validation Provider
//!
//! Chat-completion classification with two retry quirks inherited from
//! the service's history: a legacy endpoint path that some deployments
//! still answer on, and two interchangeable model identifiers (the
//! reasoner and chat variants differ in reasoning depth but both are
//! acceptable verdict sources). A 404 walks an explicit attempt plan:
//! primary endpoint, then the legacy endpoint, then a model swap on the
//! legacy endpoint.
//!
//! When a search validator is attached, its top results are embedded in
//! the prompt as corroborating evidence; losing the search call degrades
//! gracefully to text-only validation.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::serpapi::SearchValidator;
use super::transport::{SharedTransport, WireReply, WireRequest};
use super::verdict::{analysis_block, parse_verdict};
use super::MarkingValidator;
use crate::constants::{deepseek, llm, search};
use crate::types::{
    summary_line, ErrorKind, ProviderError, ProviderKind, SearchHit, ValidationRequest,
    ValidationResult,
};

const SYSTEM_PROMPT: &str = "You are an expert IC authenticity auditor. Classify OCR-marked ICs \
     as REAL (genuine), FAKE (counterfeit/clone), or UNCERTAIN. Use provided web search snippets \
     when available.";

/// DeepSeek-backed marking validator
pub struct DeepSeekValidator {
    api_key: SecretString,
    model: String,
    transport: SharedTransport,
    /// Evidence source; `None` means text-only validation
    search: Option<Arc<SearchValidator>>,
}

impl DeepSeekValidator {
    pub fn new(api_key: String, model_override: Option<&str>, transport: SharedTransport) -> Self {
        Self {
            api_key: SecretString::from(api_key),
            model: model_override.unwrap_or(deepseek::DEFAULT_MODEL).to_string(),
            transport,
            search: None,
        }
    }

    /// Attach a search validator as corroborating-evidence source
    pub fn with_search(mut self, search: Arc<SearchValidator>) -> Self {
        self.search = Some(search);
        self
    }

    /// The model swapped in when the selected one 404s
    fn alternate_model(&self) -> &'static str {
        if self.model == deepseek::ALT_MODEL {
            deepseek::DEFAULT_MODEL
        } else {
            deepseek::ALT_MODEL
        }
    }

    /// (endpoint, model) pairs attempted on successive 404s: one endpoint
    /// retry, then one model swap.
    fn attempt_plan(&self) -> [(&str, &str); 3] {
        [
            (deepseek::PRIMARY_URL, self.model.as_str()),
            (deepseek::LEGACY_URL, self.model.as_str()),
            (deepseek::LEGACY_URL, self.alternate_model()),
        ]
    }

    fn build_request(&self, url: &str, model: &str, text: &str, context: &[SearchHit]) -> WireRequest {
        let context_block = if context.is_empty() {
            "(no web context available)".to_string()
        } else {
            context
                .iter()
                .take(search::TOP_N)
                .map(|hit| format!("- {} | {}\n{}", hit.title, hit.url, hit.snippet))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let user_prompt = format!(
            "OCR text:\n{}\n\nWeb search context (top results):\n{}\n\nReturn a compact JSON \
             with keys: status in [PASS, FAIL, WARNING] and reason (one short sentence).",
            text.trim(),
            context_block
        );

        let payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": llm::TEMPERATURE,
        });

        WireRequest::post_json(url, payload).with_bearer(self.api_key.expose_secret())
    }

    /// Best-effort search context; a failed search never fails validation
    async fn gather_context(&self, text: &str) -> Option<Vec<SearchHit>> {
        let search = self.search.as_ref()?;
        let query = SearchValidator::marking_query(text);
        match search.fetch(&query).await {
            Ok(hits) => Some(hits),
            Err(e) => {
                warn!(error = %e, "Search context unavailable, validating text-only");
                None
            }
        }
    }
}

#[async_trait]
impl MarkingValidator for DeepSeekValidator {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError> {
        info!(model = %self.model, "Validating via DeepSeek");

        let context = self.gather_context(&request.detected_text).await;
        let has_context = context.is_some();
        let context_hits = context.unwrap_or_default();

        let mut last_error: Option<ProviderError> = None;

        for (attempt, (url, model)) in self.attempt_plan().into_iter().enumerate() {
            debug!(attempt, url, model, "DeepSeek attempt");
            let reply = self
                .transport
                .execute(self.build_request(url, model, &request.detected_text, &context_hits))
                .await
                .map_err(|e| e.provider(ProviderKind::DeepSeek))?;

            if reply.is_success() {
                let mut result = parse_reply(&reply.body)?;
                if has_context {
                    result = result
                        .with_reference("DeepSeek + SerpAPI Google Search")
                        .with_search_results(context_hits.clone());
                }
                return Ok(result);
            }

            let error = classify_reply(&reply);
            if reply.status != 404 {
                return Err(error);
            }
            warn!(url, model, "DeepSeek attempt returned 404");
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::new(ErrorKind::Unknown, "No DeepSeek attempt was made")
                .provider(ProviderKind::DeepSeek)
        }))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }
}

fn classify_reply(reply: &WireReply) -> ProviderError {
    let hint = match reply.status {
        401 | 403 => "Unauthorized: check DEEPSEEK_API_KEY",
        402 => "Payment required: check credits/billing status",
        404 => "Not found: verify API endpoint/model (try deepseek-reasoner or deepseek-chat)",
        429 => "Rate limited: slow down requests or check quota",
        400 => "Bad request: verify payload and model name",
        _ => "Unexpected response from DeepSeek",
    };
    ProviderError::from_http(reply.status, hint, reply.body.clone())
        .provider(ProviderKind::DeepSeek)
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

fn parse_reply(body: &str) -> Result<ValidationResult, ProviderError> {
    let reply: ChatReply = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(
            ErrorKind::Unknown,
            format!("Unexpected DeepSeek response shape: {}", e),
        )
        .provider(ProviderKind::DeepSeek)
    })?;

    let content = reply
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(
            ProviderError::new(ErrorKind::Unknown, "Empty response from DeepSeek")
                .provider(ProviderKind::DeepSeek),
        );
    }

    let verdict = parse_verdict(content);
    Ok(ValidationResult::new(
        verdict.status,
        summary_line(verdict.status, &verdict.reason),
        analysis_block(&verdict),
        ProviderKind::DeepSeek,
    )
    .with_reference("DeepSeek"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::testing::ScriptedTransport;
    use crate::types::ValidationStatus;

    fn chat_body(content: &str) -> String {
        serde_json::to_string(&json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
        .expect("serialize")
    }

    fn payload_model(request: &WireRequest) -> String {
        request
            .json
            .as_ref()
            .and_then(|j| j.get("model"))
            .and_then(|m| m.as_str())
            .expect("model field")
            .to_string()
    }

    #[tokio::test]
    async fn test_404_walks_endpoint_then_model_swap() {
        let transport = ScriptedTransport::new()
            .reply(404, "nope")
            .reply(404, "nope")
            .reply(404, "nope")
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport.clone());

        let err = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect_err("exhausted");

        assert_eq!(transport.calls(), 3);
        let requests = transport.requests();
        assert_eq!(requests[0].url, deepseek::PRIMARY_URL);
        assert_eq!(requests[1].url, deepseek::LEGACY_URL);
        assert_eq!(requests[2].url, deepseek::LEGACY_URL);
        assert_eq!(payload_model(&requests[0]), "deepseek-reasoner");
        assert_eq!(payload_model(&requests[1]), "deepseek-reasoner");
        assert_eq!(payload_model(&requests[2]), "deepseek-chat");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_model_swap_recovers() {
        let transport = ScriptedTransport::new()
            .reply(404, "nope")
            .reply(404, "nope")
            .reply(200, &chat_body(r#"{"status": "PASS", "reason": "plausible marking"}"#))
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport.clone());

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("recovered");
        assert_eq!(result.status, ValidationStatus::Pass);
        assert_eq!(result.reference_text.as_deref(), Some("DeepSeek"));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_chat_override_swaps_to_reasoner() {
        let transport = ScriptedTransport::new()
            .reply(404, "nope")
            .reply(404, "nope")
            .reply(404, "nope")
            .into_shared();
        let validator =
            DeepSeekValidator::new("k".into(), Some("deepseek-chat"), transport.clone());

        let _ = validator.validate(&ValidationRequest::new("NE555")).await;
        let requests = transport.requests();
        assert_eq!(payload_model(&requests[0]), "deepseek-chat");
        assert_eq!(payload_model(&requests[2]), "deepseek-reasoner");
    }

    #[tokio::test]
    async fn test_402_maps_to_billing_without_retry() {
        let transport = ScriptedTransport::new()
            .reply(402, "insufficient credits")
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport.clone());

        let err = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect_err("billing");
        assert_eq!(err.kind, ErrorKind::Billing);
        assert!(err.hint.contains("credits"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_without_search_prompt_notes_missing_context() {
        let transport = ScriptedTransport::new()
            .reply(200, &chat_body(r#"{"status": "WARNING", "reason": "text only"}"#))
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport.clone());

        validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("result");

        let requests = transport.requests();
        let user_prompt = requests[0]
            .json
            .as_ref()
            .and_then(|j| j.pointer("/messages/1/content"))
            .and_then(|c| c.as_str())
            .expect("user prompt")
            .to_string();
        assert!(user_prompt.contains("(no web context available)"));
    }

    #[tokio::test]
    async fn test_search_context_is_embedded_and_attributed() {
        let serp_body = r#"{"organic_results": [
            {"title": "NE555 datasheet", "link": "https://www.ti.com/ds", "snippet": "timer IC"}
        ]}"#;
        let search_transport = ScriptedTransport::new().reply(200, serp_body).into_shared();
        let search = Arc::new(SearchValidator::new("sk".into(), search_transport));

        let transport = ScriptedTransport::new()
            .reply(200, &chat_body(r#"{"status": "PASS", "reason": "web confirms"}"#))
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport.clone())
            .with_search(search);

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("result");

        assert_eq!(
            result.reference_text.as_deref(),
            Some("DeepSeek + SerpAPI Google Search")
        );
        assert_eq!(result.search_results.as_ref().map(Vec::len), Some(1));

        let requests = transport.requests();
        let user_prompt = requests[0]
            .json
            .as_ref()
            .and_then(|j| j.pointer("/messages/1/content"))
            .and_then(|c| c.as_str())
            .expect("user prompt")
            .to_string();
        assert!(user_prompt.contains("NE555 datasheet"));
    }

    #[tokio::test]
    async fn test_failed_search_context_degrades_to_text_only() {
        let search_transport = ScriptedTransport::new().reply(500, "boom").into_shared();
        let search = Arc::new(SearchValidator::new("sk".into(), search_transport));

        let transport = ScriptedTransport::new()
            .reply(200, &chat_body(r#"{"status": "WARNING", "reason": "text only"}"#))
            .into_shared();
        let validator = DeepSeekValidator::new("k".into(), None, transport).with_search(search);

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("still validates");
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(result.reference_text.as_deref(), Some("DeepSeek"));
        assert!(result.search_results.is_none());
    }
}
