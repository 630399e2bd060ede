//! Rule-based message understanding.
//!
//! A message goes through two independent, stateless passes:
//!
//! - [`intent::classify`] picks what the user wants done
//! - [`entities::extract`] pulls out appliances, deadline and urgency
//!
//! Neither pass consults earlier turns. Both lower-case the input once in
//! [`process_message`] and never fail.

pub mod entities;
pub mod intent;

use serde::Serialize;

use crate::matching::MatchMode;

pub use entities::{Appliance, Deadline, ExtractedEntities, Priority};
pub use intent::Intent;

/// Result of understanding one user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedMessage {
    pub intent: Intent,
    pub entities: ExtractedEntities,
    pub original: String,
}

/// Classify and extract entities from a raw user message.
pub fn process_message(message: &str, mode: MatchMode) -> ProcessedMessage {
    let lowered = message.to_lowercase();

    ProcessedMessage {
        intent: intent::classify(&lowered, mode),
        entities: entities::extract(&lowered, mode),
        original: message.to_string(),
    }
}
