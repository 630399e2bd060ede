//! Optional speech input.
//!
//! Speech is delegated to an external transcriber configured as
//! `[input] speech_command`: the command records and transcribes, and its
//! trimmed stdout becomes the user message. Whether speech is usable is
//! decided once at startup and never checked again.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::config::schema::InputConfig;
use crate::utils::process;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpeechCapability {
    Available { command: String },
    Unavailable { reason: String },
}

impl SpeechCapability {
    /// Resolve speech support from config.
    pub fn detect(input: &InputConfig) -> Self {
        let Some(command) = input
            .speech_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        else {
            return Self::Unavailable {
                reason: "no speech_command configured".to_string(),
            };
        };

        let Some(program) = process::program_name(command) else {
            return Self::Unavailable {
                reason: "speech_command is empty".to_string(),
            };
        };

        match process::find_program(program) {
            Some(_) => Self::Available {
                command: command.to_string(),
            },
            None => Self::Unavailable {
                reason: format!("'{program}' not found on PATH"),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Run the transcriber and return what it heard.
    ///
    /// Errors when speech is unavailable, the command fails, or it printed
    /// nothing.
    pub fn capture(&self) -> Result<String> {
        let command = match self {
            Self::Available { command } => command,
            Self::Unavailable { reason } => bail!("speech input unavailable: {reason}"),
        };

        let output = process::run_shell_command(command)?;
        if !output.success {
            bail!(
                "speech command exited with {}: {}",
                output
                    .exit_code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                output.stderr.trim()
            );
        }

        let transcript = output.stdout.trim();
        if transcript.is_empty() {
            bail!("speech command produced no transcript");
        }
        Ok(transcript.to_string())
    }
}
