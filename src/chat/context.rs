/// Bounded per-session conversation buffer.
///
/// Owned by one assistant instance and dropped with it. Holds the most recent
/// `limit` turns for diagnostics; the classifier and extractor never read it.
use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::message::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConversationContext {
    entries: VecDeque<ContextEntry>,
    limit: usize,
}

impl ConversationContext {
    /// A limit of zero keeps nothing.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    pub fn record(&mut self, role: Role, content: impl Into<String>) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(ContextEntry {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }
}
