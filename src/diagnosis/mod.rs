use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::DiagnosisError;
use crate::log;
use crate::prompt;
use crate::provider::DynProvider;
use crate::wire::{diagnosis_schema, Language, RepairQuote, RepairRequest};

/// Turns a finished intake request into a preliminary diagnosis.
#[async_trait]
pub trait Diagnose: Send + Sync {
    async fn request_diagnosis(
        &self,
        request: &RepairRequest,
        language: Language,
    ) -> Result<RepairQuote, DiagnosisError>;
}

struct Transcript {
    dir: PathBuf,
    run_id: Uuid,
}

pub struct DiagnosisClient {
    provider: DynProvider,
    schema: Value,
    debug: bool,
    transcript: Option<Transcript>,
}

impl DiagnosisClient {
    pub fn new(provider: DynProvider) -> Self {
        Self {
            provider,
            schema: diagnosis_schema(),
            debug: false,
            transcript: None,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Save every exchange under `dir/<run_id>/`.
    pub fn with_transcript(mut self, dir: PathBuf, run_id: Uuid) -> Self {
        self.transcript = Some(Transcript { dir, run_id });
        self
    }

    fn record(&self, request: &RepairRequest, language: Language, prompt: &str, outcome: Value) {
        let req_json = json!({
            "language": language.code(),
            "provider": self.provider.name(),
            "request": request,
            "prompt": prompt,
        });
        if self.debug {
            log::print_json_debug("diagnosis", &req_json, &outcome);
        }
        if let Some(t) = &self.transcript {
            let stage = format!("diagnosis-{}", Utc::now().timestamp_millis());
            match log::save_exchange(&t.dir, t.run_id, &stage, &req_json, &outcome) {
                Ok(saved) if self.debug => log::print_saved_paths(&stage, &saved),
                Ok(_) => {}
                Err(e) => eprintln!("warning: could not save transcript: {e:#}"),
            }
        }
    }
}

#[async_trait]
impl Diagnose for DiagnosisClient {
    async fn request_diagnosis(
        &self,
        request: &RepairRequest,
        language: Language,
    ) -> Result<RepairQuote, DiagnosisError> {
        let prompt = prompt::diagnosis_prompt(request, language);

        let raw = match self.provider.generate(&prompt, &self.schema, self.debug).await {
            Ok(raw) => raw,
            Err(e) => {
                self.record(request, language, &prompt, json!({ "error": format!("{e:#}") }));
                return Err(DiagnosisError::Upstream(format!("{e:#}")));
            }
        };

        let parsed = parse_quote(&raw);
        let outcome = match &parsed {
            Ok(q) => json!({ "raw": raw, "quote": q }),
            Err(e) => json!({ "raw": raw, "error": e.to_string() }),
        };
        self.record(request, language, &prompt, outcome);
        parsed
    }
}

/// Drops a surrounding markdown code fence, if any.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Skip an info string such as "json".
    let body = rest.split_once('\n').map_or("", |(_, b)| b);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses model text into a quote, distinguishing malformed JSON from JSON
/// that misses or mistypes a required field.
pub fn parse_quote(raw: &str) -> Result<RepairQuote, DiagnosisError> {
    let text = strip_code_fence(raw.trim());
    if text.is_empty() {
        return Err(DiagnosisError::Empty);
    }
    let value: Value = serde_json::from_str(text).map_err(DiagnosisError::NotJson)?;
    serde_json::from_value(value).map_err(DiagnosisError::Schema)
}
