/// File-backed persistence for the chat log.
///
/// The whole log is stored as one JSON array at `~/.aura/chat-history.json`
/// (overridable via `[chat] history_path`). It is read once at startup and
/// rewritten on every change once the log holds more than the welcome
/// message. Writes are plain overwrites with no transactional guarantee.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::message::ChatMessage;
use super::store::MessageStore;
use crate::config::{self, schema::ChatConfig};

/// Location of the persisted chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFile {
    path: PathBuf,
}

/// Outcome of loading the persisted log at startup.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing persisted yet; the store holds the welcome message.
    Fresh(MessageStore),
    /// Persisted messages restored.
    Restored(MessageStore),
    /// The file was unreadable or corrupt; it was ignored and the store
    /// holds the welcome message.
    Discarded(MessageStore, anyhow::Error),
}

impl LoadOutcome {
    pub fn into_store(self) -> MessageStore {
        match self {
            Self::Fresh(store) | Self::Restored(store) | Self::Discarded(store, _) => store,
        }
    }
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the history file from config, falling back to
    /// `~/.aura/chat-history.json`. `None` when no home directory exists.
    pub fn from_config(chat: &ChatConfig) -> Option<Self> {
        match &chat.history_path {
            Some(raw) => Some(Self::new(config::expand_home(raw))),
            None => default_history_path().map(Self::new),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted messages. `Ok(None)` when the file does not exist.
    pub fn read(&self) -> Result<Option<Vec<ChatMessage>>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read chat history {}", self.path.display())
                });
            }
        };

        let messages: Vec<ChatMessage> = serde_json::from_str(&content)
            .with_context(|| format!("corrupt chat history {}", self.path.display()))?;

        Ok(Some(messages))
    }

    /// Load the store, recovering from any read or parse failure.
    pub fn load(&self) -> LoadOutcome {
        match self.read() {
            Ok(Some(messages)) if !messages.is_empty() => {
                match MessageStore::from_messages(messages)
                    .with_context(|| format!("corrupt chat history {}", self.path.display()))
                {
                    Ok(store) => LoadOutcome::Restored(store),
                    Err(e) => LoadOutcome::Discarded(MessageStore::new(), e),
                }
            }
            Ok(_) => LoadOutcome::Fresh(MessageStore::new()),
            Err(e) => LoadOutcome::Discarded(MessageStore::new(), e),
        }
    }

    /// Overwrite the file with the given messages.
    pub fn write(&self, messages: &[ChatMessage]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("failed to create chat history directory")?;
        }

        let json = serde_json::to_string(messages).context("failed to serialize chat history")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write chat history {}", self.path.display()))
    }

    /// Persist the store if it holds more than the welcome message.
    ///
    /// Returns `Ok(false)` when nothing was written.
    pub fn persist(&self, store: &MessageStore) -> Result<bool> {
        if !store.has_conversation() {
            return Ok(false);
        }
        self.write(store.messages())?;
        Ok(true)
    }

    /// Delete the persisted file. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to remove chat history {}", self.path.display())),
        }
    }
}

/// Default history location: `~/.aura/chat-history.json`.
pub fn default_history_path() -> Option<PathBuf> {
    config::aura_dir().map(|dir| dir.join("chat-history.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::chat::message::Role;

    /// History file inside a fresh directory; the directory goes away with
    /// the returned guard.
    fn temp_history() -> (TempDir, HistoryFile) {
        let dir = TempDir::new().unwrap();
        let history = HistoryFile::new(dir.path().join("nested").join("chat-history.json"));
        (dir, history)
    }

    #[test]
    fn missing_file_loads_fresh() {
        let (_dir, history) = temp_history();
        match history.load() {
            LoadOutcome::Fresh(store) => assert_eq!(store.len(), 1),
            other => panic!("expected fresh store, got {other:?}"),
        }
    }

    #[test]
    fn welcome_only_store_is_not_persisted() {
        let (_dir, history) = temp_history();
        let store = MessageStore::new();
        assert!(!history.persist(&store).unwrap());
        assert!(!history.exists());
    }

    #[test]
    fn persist_then_load_round_trips() {
        let (_dir, history) = temp_history();
        let mut store = MessageStore::new();
        store.append(Role::User, "I need to do laundry", Vec::new());
        store.append(
            Role::Bot,
            "Optimized Schedule Found",
            vec!["Confirm".into(), "Modify".into()],
        );

        assert!(history.persist(&store).unwrap());

        match history.load() {
            LoadOutcome::Restored(loaded) => {
                assert_eq!(loaded.messages(), store.messages());
                for (a, b) in loaded.messages().iter().zip(store.messages()) {
                    assert_eq!(a.timestamp, b.timestamp);
                }
            }
            other => panic!("expected restored store, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let (_dir, history) = temp_history();
        fs::create_dir_all(history.path().parent().unwrap()).unwrap();
        fs::write(history.path(), "{not json").unwrap();

        match history.load() {
            LoadOutcome::Discarded(store, err) => {
                assert_eq!(store.len(), 1);
                assert!(err.to_string().contains("corrupt chat history"));
            }
            other => panic!("expected discarded store, got {other:?}"),
        }
    }

    #[test]
    fn out_of_order_file_is_discarded() {
        let (_dir, history) = temp_history();
        let mut store = MessageStore::new();
        store.append(Role::User, "first", Vec::new());
        store.append(Role::Bot, "second", Vec::new());
        let mut messages = store.messages().to_vec();
        messages.swap(1, 2);
        history.write(&messages).unwrap();

        match history.load() {
            LoadOutcome::Discarded(store, err) => {
                assert_eq!(store.len(), 1);
                assert!(format!("{err:#}").contains("follows id"));
            }
            other => panic!("expected discarded store, got {other:?}"),
        }
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let (_dir, history) = temp_history();
        assert!(history.remove().is_ok());
    }

    #[test]
    fn config_override_wins() {
        let chat = ChatConfig {
            history_path: Some("/tmp/aura-custom.json".into()),
            ..ChatConfig::default()
        };
        let history = HistoryFile::from_config(&chat).unwrap();
        assert_eq!(history.path(), Path::new("/tmp/aura-custom.json"));
    }
}
