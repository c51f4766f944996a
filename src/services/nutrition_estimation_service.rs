use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::AppConfig;

const SYSTEM_PROMPT: &str = "You are a nutrition assistant. Given a meal description, respond \
    with a single JSON object and nothing else, using exactly these keys: food_name (string), \
    calories (number), protein_g (number), carbs_g (number), fat_g (number), serving (string \
    describing the estimated portion). All macro values are for the described portion.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub food_name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub serving: String,
}

/// Thin wrapper over an OpenAI-compatible chat completion endpoint. One
/// attempt per request; failures surface to the handler, never retried.
#[derive(Clone)]
pub struct NutritionEstimationService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl NutritionEstimationService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.ai_api_key.clone(),
            base_url: config.ai_api_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn estimate(&self, description: &str) -> Result<NutritionEstimate> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => bail!("Nutrition estimation is not configured"),
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": description },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach nutrition estimation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Nutrition estimation API error: {} - {}", status, error_text);
            bail!("Nutrition estimation API returned status: {}", status);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse nutrition estimation API response")?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| anyhow::anyhow!("Nutrition estimation API returned no choices"))?;

        parse_estimate(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// The model is told to answer with bare JSON; fenced code blocks are
/// tolerated anyway.
fn parse_estimate(content: &str) -> Result<NutritionEstimate> {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    let estimate: NutritionEstimate =
        serde_json::from_str(trimmed).context("Model output was not the expected JSON shape")?;

    if estimate.calories < 0.0
        || estimate.protein_g < 0.0
        || estimate.carbs_g < 0.0
        || estimate.fat_g < 0.0
    {
        bail!("Model output contained negative macro values");
    }

    Ok(estimate)
}
