use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Provider;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: Client,
    model: String,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(client: Client, model: String, api_base: Option<String>) -> Self {
        Self {
            client,
            model,
            api_base: api_base.unwrap_or_else(|| GEMINI_API_BASE.to_string()),
        }
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(&self, prompt: &str, schema: &Value) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: to_gemini_schema(schema),
            },
        }
    }
}

fn api_key() -> Result<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .map_err(|_| anyhow!("GEMINI_API_KEY env var is not set"))
}

/// Rewrites a JSON schema into the OpenAPI subset `responseSchema` accepts:
/// upper-case type names, no `additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                match (k.as_str(), v) {
                    ("additionalProperties", _) => {}
                    ("type", Value::String(t)) => {
                        out.insert(k.clone(), Value::String(t.to_uppercase()));
                    }
                    ("properties", Value::Object(props)) => {
                        let props = props
                            .iter()
                            .map(|(name, s)| (name.clone(), to_gemini_schema(s)))
                            .collect();
                        out.insert(k.clone(), Value::Object(props));
                    }
                    ("items", _) => {
                        out.insert(k.clone(), to_gemini_schema(v));
                    }
                    _ => {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

// --- Response types ---

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Concatenates the text parts of the first candidate.
fn response_text(resp: &GeminiResponse) -> String {
    resp.candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.as_ref())
        .map(|parts| parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
        .unwrap_or_default()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, schema: &Value, debug: bool) -> Result<String> {
        let key = api_key()?;
        let body = self.build_request(prompt, schema);
        let url = self.generate_endpoint();

        if debug {
            eprintln!(
                "debug[gemini]: HTTP POST {}\n{}",
                url,
                serde_json::to_string_pretty(&body)?
            );
        }

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("gemini read body failed")?;

        if debug {
            eprintln!("debug[gemini]: raw status: {}", status);
            eprintln!("debug[gemini]: raw response:\n{}", &text);
        }

        if !status.is_success() {
            return Err(anyhow!("Gemini API error ({}): {}", status, text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse Gemini response: {e}"))?;

        Ok(response_text(&parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::diagnosis_schema;

    #[test]
    fn test_schema_conversion() {
        let s = to_gemini_schema(&diagnosis_schema());
        assert_eq!(s["type"], "OBJECT");
        assert_eq!(s["properties"]["estimatedTime"]["type"], "STRING");
        assert_eq!(s["properties"]["requiredParts"]["type"], "ARRAY");
        assert_eq!(s["properties"]["requiredParts"]["items"]["type"], "STRING");
        assert!(s.get("additionalProperties").is_none());
        assert_eq!(s["required"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_request_body_shape() {
        let p = GeminiProvider::new(Client::new(), "gemini-2.5-flash".into(), None);
        let body = serde_json::to_value(p.build_request("hello", &diagnosis_schema())).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(
            p.generate_endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(&resp), r#"{"a":1}"#);
        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(response_text(&empty), "");
    }
}
