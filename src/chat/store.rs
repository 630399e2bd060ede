/// Append-only message log with a welcome-message baseline.
///
/// The store always holds at least one message: a fresh or cleared store
/// contains exactly the bot welcome message. Appends assign a monotonic id
/// and a timestamp that never goes backwards relative to the previous
/// message, even if the wall clock does.
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};

use super::message::{ChatMessage, Role};

/// Greeting shown on a fresh or cleared chat.
pub const WELCOME_TEXT: &str = "👋 Hi! I'm Aura's AI assistant. I can help you schedule your appliances during optimal green energy windows to reduce your carbon footprint. What would you like to schedule today?";

/// Quick replies attached to the welcome message.
pub const WELCOME_QUICK_REPLIES: [&str; 4] = ["Schedule laundry", "Cook dinner", "Charge EV", "Help"];

/// Ordered chat log.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    /// A store holding only the welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![welcome_message(1, Utc::now())],
        }
    }

    /// Rebuild a store from persisted messages. An empty list falls back to
    /// the welcome message.
    ///
    /// Rejects logs whose ids are not strictly increasing, whose timestamps
    /// go backwards, or whose last id leaves no room for another message.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Result<Self> {
        if messages.is_empty() {
            return Ok(Self::new());
        }

        for pair in messages.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.id <= prev.id {
                bail!("message id {} follows id {}", next.id, prev.id);
            }
            if next.timestamp < prev.timestamp {
                bail!(
                    "message {} at {} is older than message {} at {}",
                    next.id,
                    next.timestamp.to_rfc3339(),
                    prev.id,
                    prev.timestamp.to_rfc3339()
                );
            }
        }

        if let Some(last) = messages.last()
            && last.id == u64::MAX
        {
            bail!("message id {} leaves no room for new messages", last.id);
        }

        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Whether the log holds anything beyond the initial welcome message.
    pub fn has_conversation(&self) -> bool {
        self.messages.len() > 1
    }

    /// Append a new message and return a reference to it.
    pub fn append(
        &mut self,
        role: Role,
        text: impl Into<String>,
        quick_replies: Vec<String>,
    ) -> &ChatMessage {
        let id = self.next_id();
        let timestamp = self.next_timestamp(Utc::now());

        self.messages.push(ChatMessage {
            id,
            role,
            text: text.into(),
            timestamp,
            quick_replies,
        });

        &self.messages[self.messages.len() - 1]
    }

    /// Reset to exactly one fresh welcome message.
    pub fn clear(&mut self) {
        let id = self.next_id();
        let timestamp = self.next_timestamp(Utc::now());
        self.messages = vec![welcome_message(id, timestamp)];
    }

    /// Ids increase along the log, so the next one follows the last. If the
    /// id space is ever exhausted the log is renumbered from 1.
    fn next_id(&mut self) -> u64 {
        let Some(last) = self.messages.last() else {
            return 1;
        };
        match last.id.checked_add(1) {
            Some(id) => id,
            None => {
                for (id, message) in (1..).zip(self.messages.iter_mut()) {
                    message.id = id;
                }
                self.messages.len() as u64 + 1
            }
        }
    }

    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.messages
            .last()
            .map_or(now, |last| last.timestamp.max(now))
    }
}

/// Build the welcome message.
pub fn welcome_message(id: u64, timestamp: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id,
        role: Role::Bot,
        text: WELCOME_TEXT.to_string(),
        timestamp,
        quick_replies: WELCOME_QUICK_REPLIES
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
