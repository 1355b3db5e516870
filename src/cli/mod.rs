use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::wire::{Language, Theme};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(
    name = "repair-intake",
    version,
    about = "Mobile repair intake wizard with an AI preliminary diagnosis"
)]
pub struct Args {
    /// Interface and prompt language
    #[arg(long, value_enum, env = "REPAIR_INTAKE_LANG")]
    pub lang: Option<Language>,

    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout; 0 waits indefinitely
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Preferences file (TOML)
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Save every diagnosis request/response pair as JSON
    #[arg(long, default_value_t = false)]
    pub save_transcript: bool,
}
