use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::balance::total_liters;
use crate::models::{Customer, DeliveryLog};
use crate::settings::Settings;

pub const INSIGHT_FALLBACK: &str =
    "Unable to generate insights at this time. Please check your data or try again later.";
pub const EMPTY_INSIGHT: &str = "No insights available.";

/// The figures handed to the model. Kept small on purpose: counts and a liters total.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DairySummary {
    pub total_customers: usize,
    pub active_customers: usize,
    pub logs_count: usize,
    pub total_milk_this_month: f64,
}

pub fn summarize(customers: &[Customer], logs: &[DeliveryLog]) -> DairySummary {
    DairySummary {
        total_customers: customers.len(),
        active_customers: customers.iter().filter(|c| c.is_active()).count(),
        logs_count: logs.len(),
        total_milk_this_month: total_liters(logs),
    }
}

pub fn build_prompt(summary: &DairySummary) -> String {
    let data = serde_json::to_string(summary).unwrap_or_default();
    format!(
        "Act as a professional dairy farm consultant.
Based on the following data summary: {},
and detailed logs for the past few entries, provide:
1. A brief business health check.
2. Recommendations for increasing efficiency.
3. Any anomalies detected in milk consumption.
Keep the tone professional, encouraging, and concise. Format with bullet points.",
        data
    )
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct InsightClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl InsightClient {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            api_key: settings.gemini_api_key.clone(),
            model: settings.gemini_model.clone(),
            base_url: settings.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::new(client, settings))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn request_insights(&self, summary: &DairySummary) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Gemini API key is not configured"))?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(summary) }]
            }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "insight request failed with {}: {}",
                status,
                error_text
            ));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        Ok(text)
    }

    /// Never fails: transport or API errors become the fixed apology text.
    pub async fn generate_insights(&self, summary: &DairySummary) -> String {
        match self.request_insights(summary).await {
            Ok(text) if text.trim().is_empty() => EMPTY_INSIGHT.to_string(),
            Ok(text) => {
                info!("Generated insights ({} chars)", text.len());
                text
            }
            Err(err) => {
                error!("AI insights error: {:#}", err);
                INSIGHT_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use chrono::NaiveDate;

    const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

    fn summary() -> DairySummary {
        let ledger = Ledger::seeded(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        summarize(&ledger.customers, &ledger.logs)
    }

    fn client_for(base_url: &str, api_key: Option<&str>) -> InsightClient {
        let settings = Settings {
            gemini_api_key: api_key.map(str::to_string),
            gemini_model: "gemini-test".to_string(),
            gemini_base_url: base_url.to_string(),
            ..Settings::default()
        };
        InsightClient::from_settings(&settings).expect("client")
    }

    #[test]
    fn summary_counts_customers_and_liters() {
        let mut ledger = Ledger::seeded(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        ledger.customers[3].status = crate::models::CustomerStatus::Inactive;
        let summary = summarize(&ledger.customers, &ledger.logs);
        assert_eq!(summary.total_customers, 4);
        assert_eq!(summary.active_customers, 3);
        assert_eq!(summary.logs_count, 2);
        assert_eq!(summary.total_milk_this_month, 5.5);
    }

    #[test]
    fn prompt_embeds_summary_json() {
        let prompt = build_prompt(&summary());
        assert!(prompt.contains("\"totalCustomers\":4"));
        assert!(prompt.contains("\"totalMilkThisMonth\":5.5"));
        assert!(prompt.contains("dairy farm consultant"));
    }

    #[tokio::test]
    async fn returns_model_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ENDPOINT)
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"- Healthy "},{"text":"round"}]}}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("test-key"));
        assert_eq!(client.generate_insights(&summary()).await, "- Healthy round");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_becomes_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ENDPOINT)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("test-key"));
        assert_eq!(client.generate_insights(&summary()).await, INSIGHT_FALLBACK);
    }

    #[tokio::test]
    async fn empty_candidates_become_no_insights() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ENDPOINT)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("test-key"));
        assert_eq!(client.generate_insights(&summary()).await, EMPTY_INSIGHT);
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", ENDPOINT)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        assert_eq!(client.generate_insights(&summary()).await, INSIGHT_FALLBACK);
        mock.assert_async().await;
    }
}
