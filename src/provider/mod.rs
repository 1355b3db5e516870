use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::cli::ProviderKind;

pub mod gemini;
pub mod ollama;
pub mod openai;

/// A text-generation backend that answers one prompt with one JSON document
/// constrained by `schema`.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the raw model text; parsing is left to the caller.
    async fn generate(&self, prompt: &str, schema: &Value, debug: bool) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "gemini-2.5-flash",
        ProviderKind::OpenAI => "gpt-4.1-mini",
        ProviderKind::Ollama => "llama3.1",
    }
}

/// `timeout_secs == 0` leaves requests unbounded.
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    let mut builder = Client::builder();
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder.build().context("building HTTP client")
}

pub fn make_provider(
    kind: ProviderKind,
    model: Option<String>,
    timeout_secs: u64,
    base_url: Option<String>,
) -> Result<DynProvider> {
    let model = model.unwrap_or_else(|| default_model(kind).to_string());
    let client = http_client(timeout_secs)?;
    match kind {
        ProviderKind::Gemini => Ok(Box::new(gemini::GeminiProvider::new(client, model, base_url))),
        ProviderKind::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(client, model, base_url))),
        ProviderKind::Ollama => Ok(Box::new(ollama::Ollama::new(client, model, base_url))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_provider_defaults() {
        let p = make_provider(ProviderKind::Gemini, None, 0, None).unwrap();
        assert_eq!(p.name(), "gemini");
        let p = make_provider(ProviderKind::Ollama, Some("qwen2.5".into()), 30, None).unwrap();
        assert_eq!(p.name(), "ollama");
        let p = make_provider(ProviderKind::OpenAI, None, 0, None).unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn test_default_models() {
        assert_eq!(default_model(ProviderKind::Gemini), "gemini-2.5-flash");
        assert_eq!(default_model(ProviderKind::OpenAI), "gpt-4.1-mini");
    }
}
