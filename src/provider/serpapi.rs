//! SerpAPI Google Search Provider
//!
//! Issues one Google search per marking through SerpAPI, memoized by the
//! [`QueryCache`]. Used in two roles: standalone heuristic validator
//! (verdict derived from the top results) and evidence source for the
//! DeepSeek provider.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::cache::QueryCache;
use super::local::KNOWN_MARKINGS;
use super::transport::{SharedTransport, WireReply, WireRequest};
use super::MarkingValidator;
use crate::constants::search;
use crate::types::{
    summary_line, ErrorKind, ProviderError, ProviderKind, SearchHit, ValidationRequest,
    ValidationResult, ValidationStatus,
};

/// SerpAPI-backed search validator with per-process query cache
pub struct SearchValidator {
    api_key: SecretString,
    transport: SharedTransport,
    cache: QueryCache,
}

impl SearchValidator {
    pub fn new(api_key: String, transport: SharedTransport) -> Self {
        Self {
            api_key: SecretString::from(api_key),
            transport,
            cache: QueryCache::new(),
        }
    }

    /// The query template used for marking lookups
    pub fn marking_query(text: &str) -> String {
        format!("{} IC marking genuine datasheet", text.trim())
    }

    /// Cache key normalization: trim, collapse whitespace, case-fold
    pub fn normalize_query(query: &str) -> String {
        query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Fetch top results for a query, consulting the cache first.
    /// Failures are never cached.
    pub async fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let key = Self::normalize_query(query);
        if let Some(hits) = self.cache.get(&key) {
            debug!(query = %key, "Search cache hit");
            return Ok(hits);
        }

        let request = WireRequest::get(
            search::API_URL,
            vec![
                ("engine".to_string(), "google".to_string()),
                ("q".to_string(), query.trim().to_string()),
                ("num".to_string(), search::TOP_N.to_string()),
                (
                    "api_key".to_string(),
                    self.api_key.expose_secret().to_string(),
                ),
            ],
        );

        let reply = self.transport.execute(request).await?;
        if !reply.is_success() {
            return Err(classify_reply(&reply));
        }

        let hits = parse_hits(&reply.body)?;
        self.cache.insert(key, hits.clone());
        Ok(hits)
    }
}

#[async_trait]
impl MarkingValidator for SearchValidator {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ProviderError> {
        let query = Self::marking_query(&request.detected_text);
        info!(query = %query, "Validating via web search");

        let hits = self.fetch(&query).await?;
        let assessment = assess_hits(&request.detected_text, &hits);

        let mut analysis = String::new();
        if !hits.is_empty() {
            analysis.push_str("Search results:\n");
            for hit in &hits {
                analysis.push_str(&format!("- {} | {}\n", hit.title, hit.url));
            }
            analysis.push('\n');
        }
        analysis.push_str("Explainer:\n");
        analysis.push_str(&assessment.explainer);

        Ok(
            ValidationResult::new(
                assessment.status,
                summary_line(assessment.status, &assessment.reason),
                analysis,
                ProviderKind::Search,
            )
            .with_reference("SerpAPI Google Search")
            .with_search_results(hits),
        )
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Search
    }
}

fn classify_reply(reply: &WireReply) -> ProviderError {
    let hint = match reply.status {
        401 | 403 => "Unauthorized: check SERPAPI_KEY",
        429 => "Rate limited: slow down or check your SerpAPI plan",
        _ => "Search request failed: check SerpAPI service status",
    };
    ProviderError::from_http(reply.status, hint, reply.body.clone()).provider(ProviderKind::Search)
}

#[derive(Deserialize)]
struct SearchReply {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    link: Option<String>,
    url: Option<String>,
    #[serde(default)]
    snippet: String,
}

fn parse_hits(body: &str) -> Result<Vec<SearchHit>, ProviderError> {
    let reply: SearchReply = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(
            ErrorKind::Unknown,
            format!("Unexpected search response shape: {}", e),
        )
        .provider(ProviderKind::Search)
    })?;

    Ok(reply
        .organic_results
        .into_iter()
        .take(search::TOP_N)
        .map(|r| SearchHit {
            title: r.title,
            url: r.link.or(r.url).unwrap_or_default(),
            snippet: r.snippet,
        })
        .collect())
}

/// Outcome of the standalone result-scanning heuristic
#[derive(Debug)]
struct Assessment {
    status: ValidationStatus,
    reason: String,
    explainer: String,
}

/// Derive a verdict from the top results.
///
/// PASS when the literal OCR text, a known marking pattern, or a vendor
/// datasheet hit appears; FAIL when counterfeit keywords appear or no
/// result shares a single token with the OCR text; WARNING otherwise.
fn assess_hits(text: &str, hits: &[SearchHit]) -> Assessment {
    if hits.is_empty() {
        return Assessment {
            status: ValidationStatus::Warning,
            reason: "no search results found".to_string(),
            explainer: "No search results found.".to_string(),
        };
    }

    let literal = text.trim().to_uppercase();
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_uppercase)
        .collect();

    let mut pass_evidence: Option<String> = None;
    let mut counterfeit_evidence: Option<String> = None;
    let mut any_overlap = false;

    for hit in hits {
        let hay = format!("{} {}", hit.title, hit.snippet);
        let upper = hay.to_uppercase();
        let lower = hay.to_lowercase();

        if pass_evidence.is_none() {
            if !literal.is_empty() && upper.contains(&literal) {
                pass_evidence = Some(format!(
                    "marking text appears verbatim in: {} | {}",
                    hit.title, hit.url
                ));
            } else if KNOWN_MARKINGS
                .iter()
                .flat_map(|(_, patterns)| patterns.iter())
                .any(|p| upper.contains(p))
            {
                pass_evidence = Some(format!(
                    "known marking pattern found in: {} | {}",
                    hit.title, hit.url
                ));
            } else if lower.contains("datasheet") && is_vendor_domain(&hit.url) {
                pass_evidence = Some(format!(
                    "vendor datasheet found: {} | {}",
                    hit.title, hit.url
                ));
            }
        }

        if counterfeit_evidence.is_none()
            && search::COUNTERFEIT_KEYWORDS.iter().any(|k| lower.contains(k))
        {
            counterfeit_evidence = Some(format!(
                "suspicious keywords in: {} | {}",
                hit.title, hit.url
            ));
        }

        if tokens.iter().any(|t| upper.contains(t)) {
            any_overlap = true;
        }
    }

    // Positive corroboration wins over counterfeit keywords elsewhere in
    // the results: a vendor datasheet hit outweighs an unrelated result
    // warning about fakes.
    if let Some(evidence) = pass_evidence {
        return Assessment {
            status: ValidationStatus::Pass,
            reason: "marking corroborated by top search results".to_string(),
            explainer: format!("PASS triggered by {}", evidence),
        };
    }
    if let Some(evidence) = counterfeit_evidence {
        return Assessment {
            status: ValidationStatus::Fail,
            reason: "counterfeit keywords present in top results".to_string(),
            explainer: format!("FAIL triggered by {}", evidence),
        };
    }
    if !tokens.is_empty() && !any_overlap {
        return Assessment {
            status: ValidationStatus::Fail,
            reason: "no result shares any token with the marking".to_string(),
            explainer: "FAIL: none of the top results overlap the OCR text.".to_string(),
        };
    }

    Assessment {
        status: ValidationStatus::Warning,
        reason: "no decisive signal in top results".to_string(),
        explainer: "No decisive signal found in top results.".to_string(),
    }
}

fn is_vendor_domain(link: &str) -> bool {
    let host = match url::Url::parse(link) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => return false,
        },
        Err(_) => return false,
    };
    search::VENDOR_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::testing::ScriptedTransport;
    use proptest::prelude::*;

    fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    const SERP_BODY: &str = r#"{
        "organic_results": [
            {"title": "ATML32U4 datasheet", "link": "https://www.microchip.com/ds", "snippet": "Datasheet for the part"},
            {"title": "Forum post", "url": "https://forum.example.com/t/1", "snippet": "marking question"}
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_parses_top_results() {
        let transport = ScriptedTransport::new().reply(200, SERP_BODY).into_shared();
        let validator = SearchValidator::new("key".to_string(), transport.clone());

        let hits = validator.fetch("ATML32U4 datasheet").await.expect("fetch");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.microchip.com/ds");
        assert_eq!(hits[1].url, "https://forum.example.com/t/1");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_identical_query_is_served_from_cache() {
        let transport = ScriptedTransport::new().reply(200, SERP_BODY).into_shared();
        let validator = SearchValidator::new("key".to_string(), transport.clone());

        let first = validator.fetch("ATML32U4 datasheet").await.expect("fetch");
        let second = validator.fetch("  atml32u4   DATASHEET ").await.expect("fetch");
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let transport = ScriptedTransport::new()
            .reply(429, "slow down")
            .reply(200, SERP_BODY)
            .into_shared();
        let validator = SearchValidator::new("key".to_string(), transport.clone());

        let err = validator.fetch("q").await.expect_err("rate limited");
        assert_eq!(err.kind, ErrorKind::RateLimit);

        let hits = validator.fetch("q").await.expect("second attempt");
        assert_eq!(hits.len(), 2);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_classification() {
        let transport = ScriptedTransport::new().reply(401, "bad key").into_shared();
        let validator = SearchValidator::new("key".to_string(), transport);

        let err = validator
            .validate(&ValidationRequest::new("NE555"))
            .await
            .expect_err("auth error");
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(err.hint.contains("SERPAPI_KEY"));
    }

    #[test]
    fn test_assess_literal_match_passes() {
        let hits = vec![hit("ATML32U4 overview", "https://example.com", "specs")];
        let assessment = assess_hits("ATML32U4", &hits);
        assert_eq!(assessment.status, ValidationStatus::Pass);
    }

    #[test]
    fn test_assess_vendor_datasheet_passes() {
        let hits = vec![hit(
            "Part datasheet",
            "https://www.ti.com/lit/ds",
            "official datasheet",
        )];
        let assessment = assess_hits("XJ900", &hits);
        assert_eq!(assessment.status, ValidationStatus::Pass);
    }

    #[test]
    fn test_assess_counterfeit_keywords_fail() {
        let hits = vec![hit(
            "Beware of fake timer chips",
            "https://blog.example.com",
            "counterfeit parts flood the market",
        )];
        let assessment = assess_hits("XK7214", &hits);
        assert_eq!(assessment.status, ValidationStatus::Fail);
    }

    #[test]
    fn test_assess_pass_evidence_beats_counterfeit_keyword_elsewhere() {
        // A vendor datasheet hit plus an unrelated fake-parts warning
        // still counts as corroboration
        let hits = vec![
            hit(
                "NE555 datasheet",
                "https://www.ti.com/lit/ds/ne555.pdf",
                "official datasheet for the NE555 timer",
            ),
            hit(
                "Fake chips discussion",
                "https://blog.example.com/fakes",
                "fake parts are everywhere",
            ),
        ];
        let assessment = assess_hits("NE555", &hits);
        assert_eq!(assessment.status, ValidationStatus::Pass);
    }

    #[test]
    fn test_assess_zero_overlap_fails() {
        let hits = vec![hit("Gardening tips", "https://example.com", "roses and soil")];
        let assessment = assess_hits("XYZ999", &hits);
        assert_eq!(assessment.status, ValidationStatus::Fail);
    }

    #[test]
    fn test_assess_partial_overlap_warns() {
        // One token overlaps but the full marking never appears
        let hits = vec![hit(
            "XYZ chip lineup",
            "https://example.com",
            "general overview of the series",
        )];
        assert_eq!(
            assess_hits("XYZ 999PLUS", &hits).status,
            ValidationStatus::Warning
        );
    }

    #[test]
    fn test_assess_empty_results_warn() {
        let assessment = assess_hits("NE555", &[]);
        assert_eq!(assessment.status, ValidationStatus::Warning);
        assert!(assessment.explainer.contains("No search results"));
    }

    #[test]
    fn test_is_vendor_domain() {
        assert!(is_vendor_domain("https://www.ti.com/lit/ds/ne555.pdf"));
        assert!(is_vendor_domain("https://microchip.com/doc"));
        assert!(!is_vendor_domain("https://ti.com.evil.example/doc"));
        assert!(!is_vendor_domain("not-a-url"));
    }

    proptest! {
        #[test]
        fn prop_normalize_query_is_idempotent(query in "\\PC{0,64}") {
            let once = SearchValidator::normalize_query(&query);
            let twice = SearchValidator::normalize_query(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalize_query_ignores_surrounding_whitespace(query in "[a-zA-Z0-9 ]{0,32}") {
            let padded = format!("  {}\t", query);
            prop_assert_eq!(
                SearchValidator::normalize_query(&padded),
                SearchValidator::normalize_query(&query)
            );
        }
    }
}
