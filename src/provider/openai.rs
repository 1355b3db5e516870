use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Provider;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions provider. The prompt goes out as a single user
/// message and the reply is pinned to the schema with strict `json_schema`.
pub struct OpenAIProvider {
    model: String,
    client: Client,
    api_base: String,
}

impl OpenAIProvider {
    pub fn new(client: Client, model: String, api_base: Option<String>) -> Self {
        Self {
            model,
            client,
            api_base: api_base.unwrap_or_else(|| OPENAI_API_BASE.to_string()),
        }
    }

    fn body(&self, prompt: &str, schema: &Value) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.2,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "repair_quote",
                    "strict": true,
                    "schema": schema
                }
            }
        })
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str, schema: &Value, debug: bool) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY env var is not set"))?;

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = self.body(prompt, schema);

        if debug {
            eprintln!(
                "debug[openai]: HTTP POST {} body:\n{}",
                url,
                serde_json::to_string_pretty(&body)?
            );
        }

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("openai read body failed")?;

        if debug {
            eprintln!("debug[openai]: raw status: {}", status);
            eprintln!("debug[openai]: raw response:\n{}", &text);
        }

        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {e}"))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
