//! The chat pipeline.
//!
//! An [`Assistant`] owns one conversation: the message store, its history
//! file, the bounded conversation context, the optimizer backend and the
//! event log. Every turn runs the same fixed steps:
//!
//! 1. append the trimmed user message
//! 2. classify and extract entities
//! 3. for SCHEDULE_TASK with tasks, plan a schedule (optimizer or simulated)
//! 4. render and append the bot reply
//! 5. persist the history and log the turn
//!
//! Nothing in a turn is fatal. Optimizer, persistence and logging failures
//! are recovered locally.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::analytics::{Event, EventLog, TurnEvent};
use crate::chat::{
    ChatMessage, ConversationContext, HistoryFile, LoadOutcome, MessageStore, Role,
};
use crate::config::AuraConfig;
use crate::nlp::{self, Intent, ProcessedMessage};
use crate::optimizer::{self, OptimizationBackend, OptimizerClient, ScheduleOutcome};
use crate::responder::{self, Reply};

/// Everything produced by one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub user: ChatMessage,
    pub bot: ChatMessage,
    pub processed: ProcessedMessage,
    /// The planned schedule, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ScheduleOutcome>,
}

pub struct Assistant {
    config: AuraConfig,
    backend: Option<Box<dyn OptimizationBackend>>,
    history: Option<HistoryFile>,
    events: EventLog,
    context: ConversationContext,
    store: MessageStore,
    rng: StdRng,
}

impl Assistant {
    /// Build an assistant from config: HTTP optimizer (if enabled), the
    /// configured history file and event log, and a fresh OS-seeded RNG.
    pub fn from_config(config: AuraConfig) -> Self {
        let backend: Option<Box<dyn OptimizationBackend>> = if config.optimizer.enabled {
            Some(Box::new(OptimizerClient::from_config(&config.optimizer)))
        } else {
            None
        };
        let history = HistoryFile::from_config(&config.chat);
        let events = EventLog::from_config(&config.logging);

        Self::with_parts(config, backend, history, events, StdRng::from_os_rng())
    }

    /// Build an assistant from explicit parts and load persisted history.
    pub fn with_parts(
        config: AuraConfig,
        backend: Option<Box<dyn OptimizationBackend>>,
        history: Option<HistoryFile>,
        events: EventLog,
        rng: StdRng,
    ) -> Self {
        let store = match &history {
            Some(file) => match file.load() {
                LoadOutcome::Discarded(store, err) => {
                    events.record(Event::HistoryLoadFailed {
                        error: format!("{err:#}"),
                    });
                    store
                }
                outcome => outcome.into_store(),
            },
            None => MessageStore::new(),
        };

        let context = ConversationContext::new(config.chat.context_limit);

        Self {
            config,
            backend,
            history,
            events,
            context,
            store,
            rng,
        }
    }

    pub fn config(&self) -> &AuraConfig {
        &self.config
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn history_file(&self) -> Option<&HistoryFile> {
        self.history.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Process one user message. Blank input is ignored and returns `None`.
    pub fn send(&mut self, text: &str) -> Option<TurnResult> {
        self.turn(text, false)
    }

    /// Expand a quick-reply label to its utterance and send it.
    pub fn quick_reply(&mut self, label: &str) -> Option<TurnResult> {
        let utterance = responder::expand_quick_reply(label);
        self.turn(&utterance, true)
    }

    /// Reset to the welcome message and forget persisted history.
    pub fn clear(&mut self) {
        self.store.clear();
        self.context.clear();

        if let Some(history) = &self.history
            && let Err(e) = history.remove()
        {
            self.events.record(Event::HistorySaveFailed {
                error: format!("{e:#}"),
            });
        }
        self.events.record(Event::HistoryCleared);
    }

    /// Log a failed voice capture and append the generic error reply.
    pub fn report_speech_failure(&mut self, error: &anyhow::Error) -> ChatMessage {
        self.events.record(Event::SpeechFailed {
            error: format!("{error:#}"),
        });
        let reply = responder::error_reply();
        let bot = self.append_bot(reply);
        self.persist();
        bot
    }

    fn turn(&mut self, text: &str, quick_reply: bool) -> Option<TurnResult> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user = self.store.append(Role::User, text, Vec::new()).clone();
        self.context.record(Role::User, text);

        let mut processed = nlp::process_message(text, self.config.nlp.match_mode);
        if !self.config.general.enabled {
            processed.intent = Intent::GeneralChat;
        }

        let outcome = self.plan(&processed);

        let shown = outcome
            .as_ref()
            .filter(|o| !o.is_simulated() || self.config.general.simulate_on_failure);
        let reply = responder::respond(processed.intent, &processed.entities, shown);
        let bot = self.append_bot(reply);

        self.persist();
        self.events.record(Event::Turn(TurnEvent::new(
            &processed,
            outcome.as_ref(),
            quick_reply,
        )));

        Some(TurnResult {
            user,
            bot,
            processed,
            outcome,
        })
    }

    fn plan(&mut self, processed: &ProcessedMessage) -> Option<ScheduleOutcome> {
        if processed.intent != Intent::ScheduleTask || processed.entities.tasks.is_empty() {
            return None;
        }
        Some(optimizer::plan_schedule(
            &processed.entities,
            self.backend.as_deref(),
            &mut self.rng,
        ))
    }

    fn append_bot(&mut self, reply: Reply) -> ChatMessage {
        self.context.record(Role::Bot, reply.text.as_str());
        self.store
            .append(Role::Bot, reply.text, reply.quick_replies)
            .clone()
    }

    fn persist(&self) {
        let Some(history) = &self.history else {
            return;
        };
        if let Err(e) = history.persist(&self.store) {
            self.events.record(Event::HistorySaveFailed {
                error: format!("{e:#}"),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
