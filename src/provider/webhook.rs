//! Webhook Validation Provider
//!
//! POSTs the detected text to a user-configured workflow endpoint (e.g.
//! an n8n flow) and passes the provider-defined response through. A JSON
//! body with `status`/`details`/`reference` keys is normalized; anything
//! else lands verbatim in the analysis text with a WARNING verdict.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::transport::{SharedTransport, WireRequest};
use super::MarkingValidator;
use crate::types::{
    summary_line, ProviderError, ProviderKind, ValidationRequest, ValidationResult,
    ValidationStatus,
};

/// Workflow webhook validator
pub struct WebhookValidator {
    url: String,
    transport: SharedTransport,
}

impl WebhookValidator {
    pub fn new(url: String, transport: SharedTransport) -> Self {
        Self { url, transport }
    }
}

#[derive(Deserialize)]
struct WebhookReply {
    status: Option<String>,
    details: Option<String>,
    reference: Option<String>,
}

#[async_trait]
impl MarkingValidator for WebhookValidator {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError> {
        info!(url = %self.url, "Validating via webhook workflow");

        let wire = WireRequest::post_json(
            &self.url,
            json!({"ocr_text": request.detected_text}),
        );
        let reply = self
            .transport
            .execute(wire)
            .await
            .map_err(|e| e.provider(ProviderKind::Webhook))?;

        if !reply.is_success() {
            return Err(ProviderError::from_http(
                reply.status,
                "Webhook workflow failed: check the endpoint and workflow logs",
                reply.body,
            )
            .provider(ProviderKind::Webhook));
        }

        let result = match serde_json::from_str::<WebhookReply>(&reply.body) {
            Ok(parsed) => {
                let status = parsed
                    .status
                    .as_deref()
                    .map(ValidationStatus::parse_lenient)
                    .unwrap_or(ValidationStatus::Warning);
                let details = parsed
                    .details
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| "Validated via webhook workflow.".to_string());
                let mut result = ValidationResult::new(
                    status,
                    summary_line(status, "webhook workflow verdict"),
                    details,
                    ProviderKind::Webhook,
                );
                if let Some(reference) = parsed.reference {
                    result = result.with_reference(reference);
                }
                result
            }
            // Provider-defined non-JSON body passes through as-is
            Err(_) => ValidationResult::new(
                ValidationStatus::Warning,
                summary_line(ValidationStatus::Warning, "unstructured webhook response"),
                reply.body,
                ProviderKind::Webhook,
            ),
        };

        Ok(result)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Webhook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::testing::ScriptedTransport;
    use crate::types::ErrorKind;

    #[tokio::test]
    async fn test_json_reply_is_normalized() {
        let body = r#"{"status": "pass", "details": "found in ERP", "reference": "internal KB"}"#;
        let transport = ScriptedTransport::new().reply(200, body).into_shared();
        let validator = WebhookValidator::new("https://hooks.example/ic".into(), transport.clone());

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("result");
        assert_eq!(result.status, ValidationStatus::Pass);
        assert_eq!(result.analysis_text, "found in ERP");
        assert_eq!(result.reference_text.as_deref(), Some("internal KB"));

        let requests = transport.requests();
        assert_eq!(
            requests[0].json.as_ref().and_then(|j| j.get("ocr_text")),
            Some(&serde_json::Value::String("NE555".to_string()))
        );
    }

    #[tokio::test]
    async fn test_non_json_body_passes_through() {
        let transport = ScriptedTransport::new()
            .reply(200, "looks fine to us")
            .into_shared();
        let validator = WebhookValidator::new("https://hooks.example/ic".into(), transport);

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("result");
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(result.analysis_text, "looks fine to us");
    }

    #[tokio::test]
    async fn test_http_error_becomes_provider_error() {
        let transport = ScriptedTransport::new().reply(500, "workflow crashed").into_shared();
        let validator = WebhookValidator::new("https://hooks.example/ic".into(), transport);

        let err = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect_err("provider error");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.http_status, Some(500));
        assert_eq!(err.raw_body.as_deref(), Some("workflow crashed"));
    }

    #[tokio::test]
    async fn test_unknown_status_degrades_to_warning() {
        let body = r#"{"status": "MAYBE", "details": "inconclusive"}"#;
        let transport = ScriptedTransport::new().reply(200, body).into_shared();
        let validator = WebhookValidator::new("https://hooks.example/ic".into(), transport);

        let result = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect("result");
        assert_eq!(result.status, ValidationStatus::Warning);
    }
}
