//! Caption suggestions via the Gemini generateContent endpoint.
//!
//! The feed never depends on this call succeeding: any failure (missing
//! key, transport error, non-2xx status, malformed or blank body) is
//! logged and resolved to a deterministic fallback string derived from
//! the activity name. Callers never see an error type.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::config::CaptionConfig;

/// Trait for caption backends to allow mocking and abstraction.
#[async_trait]
pub trait CaptionClient: Send + Sync {
    async fn generate(&self, activity: &str) -> Result<String>;
}

/// Deterministic caption used whenever the generative call cannot
/// produce one.
pub fn fallback_caption(activity: &str) -> String {
    format!("{} time! Who's down?", activity)
}

/// Ask the client for a caption, substituting the fallback on any
/// failure or blank response. Never returns an empty string.
pub async fn suggest_caption(client: &dyn CaptionClient, activity: &str) -> String {
    match client.generate(activity).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                eprintln!("[caption] blank suggestion, using fallback");
                fallback_caption(activity)
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            eprintln!("[caption] generation failed, using fallback: {}", e);
            fallback_caption(activity)
        }
    }
}

// ============ Gemini backend ============

fn caption_prompt(activity: &str) -> String {
    format!(
        "Write a short, catchy, high-energy \"Gen Z\" style invite caption for the activity: \"{}\".\n\
         Max 12 words. Use 1-2 relevant emojis.\n\
         Examples:\n\
         \"Coffee\" -> \"Caffeine drip needed ☕️ Who's alive?\"\n\
         \"Gym\" -> \"Iron paradise calling 💪 Let's get it.\"\n\
         \"Tacos\" -> \"Taco time 🌮 Don't be boring.\"\n\n\
         Return ONLY the text of the caption.",
        activity
    )
}

/// Client for `models/{model}:generateContent`.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from config, resolving the API key from the
    /// configured environment variable. A missing key is not an error
    /// here; `generate` fails at call time and the caller falls back.
    pub fn from_config(cfg: &CaptionConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            http,
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CaptionClient for GeminiClient {
    async fn generate(&self, activity: &str) -> Result<String> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("no API key in environment"))?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": caption_prompt(activity) }] }]
        });

        let resp = self
            .http
            .post(&url)
            .query(&[("key", key.expose_secret())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status.as_u16(), body));
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.first_text().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(anyhow!("response contained no caption text"));
        }
        Ok(text.to_string())
    }
}

// ============ Response Translation ============

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .find_map(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|p| p.text.as_str())
    }
}
