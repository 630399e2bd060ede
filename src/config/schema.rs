/// Configuration schema and defaults for the Aura assistant.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[general]`, `[optimizer]`, `[nlp]`, `[chat]`, `[input]`, `[logging]`,
/// and `[web]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

use crate::matching::MatchMode;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level Aura configuration.
///
/// Maps directly to the `~/.aura/config.toml` and `.aura.toml` file schemas.
/// All sections and fields are optional; missing values fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    pub general: GeneralConfig,
    pub optimizer: OptimizerConfig,
    pub nlp: NlpConfig,
    pub chat: ChatConfig,
    pub input: InputConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

/// General assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Master switch. When `false` the assistant answers every message with
    /// the general help reply and never calls the optimizer.
    pub enabled: bool,
    /// Produce a locally simulated schedule when the optimizer is disabled
    /// or fails. When `false`, the plain acknowledgement reply is sent
    /// instead.
    pub simulate_on_failure: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            simulate_on_failure: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [optimizer]
// ---------------------------------------------------------------------------

/// Optimization API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether scheduling requests call the optimization API at all.
    pub enabled: bool,
    /// Base URL of the Aura energy API.
    pub api_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Optional bearer token sent as `Authorization`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "http://localhost:8000".to_string(),
            timeout_ms: 45_000,
            auth_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [nlp]
// ---------------------------------------------------------------------------

/// Keyword matching settings for intent and entity extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    /// `word` (default) or `substring`.
    pub match_mode: MatchMode,
}

// ---------------------------------------------------------------------------
// [chat]
// ---------------------------------------------------------------------------

/// Message store and conversation context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Override for the persisted history file
    /// (default `~/.aura/chat-history.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,
    /// Maximum number of entries kept in the conversation context.
    pub context_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            context_limit: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// [input]
// ---------------------------------------------------------------------------

/// Alternative input sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// External speech-to-text command. Its trimmed stdout is submitted as
    /// the user message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_command: Option<String>,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Structured event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Override for the events file (default `~/.aura/events.jsonl`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            events_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local JSON API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl AuraConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `aura config init` to create a starting config file with all
    /// settings documented.
    pub fn default_toml() -> String {
        r#"# Aura assistant configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (AURA_*)
#   2. Project config (.aura.toml in current directory)
#   3. User global config (~/.aura/config.toml)
#   4. Built-in defaults

[general]
enabled = true
simulate_on_failure = true           # Mock schedule when the optimizer fails

[optimizer]
enabled = true
api_url = "http://localhost:8000"
timeout_ms = 45000
# auth_token = ""                    # Sent as "Authorization: Bearer <token>"

[nlp]
match_mode = "word"                  # word | substring

[chat]
# history_path = "~/.aura/chat-history.json"
context_limit = 50

[input]
# speech_command = "whisper-listen"  # stdout is submitted as the message

[logging]
enabled = true
# events_path = "~/.aura/events.jsonl"

[web]
addr = "127.0.0.1:9747"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
