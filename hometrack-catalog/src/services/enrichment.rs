//! AI-assisted company enrichment client
//!
//! Asks an OpenAI-compatible chat-completions endpoint for structured facts
//! about a home-building company (description, website, headquarters,
//! founding year). The service is an opaque collaborator; any transport or
//! parse failure surfaces as a generic enrichment error.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "gpt-4-turbo-preview";
const REQUEST_TIMEOUT_SECS: u64 = 30;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that provides information about \
home building companies. Provide accurate, factual information in JSON format. \
Return ONLY valid JSON, no additional text.";

/// Enrichment client errors
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Structured company facts returned by the text-generation service
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    /// The model sometimes returns the year as a number
    #[serde(default)]
    founded: Option<serde_json::Value>,
}

impl CompanyProfile {
    pub fn founded_year(&self) -> Option<String> {
        match &self.founded {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions client for company enrichment
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EnrichmentClient {
    pub fn new(api_key: String) -> Result<Self, EnrichmentError> {
        Self::with_base_url(api_key, OPENAI_BASE_URL.to_string())
    }

    /// Base URL override, used by tests against a stub server
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }

    /// Fetch structured facts about the named company
    pub async fn company_profile(
        &self,
        company_name: &str,
    ) -> Result<CompanyProfile, EnrichmentError> {
        let url = format!("{}/chat/completions", self.base_url);
        let user_prompt = format!(
            "Provide information about the home building company \"{company_name}\". \
             Return a JSON object with the following fields: name (exact company name), \
             description (brief overview of the company), website (official website URL \
             if known, otherwise null), headquarters (city and state, e.g., \"Dallas, \
             Texas\"), and founded (year founded if known, otherwise null). Only return \
             the JSON object, no additional text."
        );

        tracing::debug!(company = %company_name, "Querying enrichment service");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": MODEL,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt },
                ],
                "response_format": { "type": "json_object" },
                "temperature": 0.3,
            }))
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| EnrichmentError::Parse("empty completion".to_string()))?;

        let profile: CompanyProfile = serde_json::from_str(content)
            .map_err(|e| EnrichmentError::Parse(format!("invalid profile JSON: {e}")))?;

        tracing::info!(company = %company_name, "Retrieved company profile from enrichment service");

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_succeeds() {
        let client = EnrichmentClient::new("test-key".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn founded_year_accepts_string_and_number() {
        let from_string: CompanyProfile =
            serde_json::from_str(r#"{"founded": "1978"}"#).expect("parse");
        assert_eq!(from_string.founded_year().as_deref(), Some("1978"));

        let from_number: CompanyProfile =
            serde_json::from_str(r#"{"founded": 1978}"#).expect("parse");
        assert_eq!(from_number.founded_year().as_deref(), Some("1978"));

        let absent: CompanyProfile = serde_json::from_str(r#"{}"#).expect("parse");
        assert!(absent.founded_year().is_none());

        let null: CompanyProfile = serde_json::from_str(r#"{"founded": null}"#).expect("parse");
        assert!(null.founded_year().is_none());
    }

    #[test]
    fn profile_tolerates_extra_fields() {
        let profile: CompanyProfile = serde_json::from_str(
            r#"{"name": "Acme Homes", "description": "Builder", "rating": 4.5}"#,
        )
        .expect("parse");
        assert_eq!(profile.description.as_deref(), Some("Builder"));
        assert!(profile.website.is_none());
    }
}
