//! Recording test doubles
//!
//! [`RecordingMessenger`] keeps every outbound call in order and
//! [`FlakyStore`] wraps the in-memory store with failure injection and a
//! save counter. [`Journal`] is a shared log handlers push to, so tests can
//! assert the order in which the router ran them.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use teloxide::types::{CallbackQuery, ChatId, ReplyMarkup};

use FlowBuddy::dispatch::{Identity, Messenger};
use FlowBuddy::state::{ConversationState, MemoryStateStore, StateStore};
use FlowBuddy::utils::errors::{FlowBuddyError, Result};

/// One outbound call made through the messenger
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Html { chat_id: i64, text: String },
    Location { chat_id: i64, latitude: f64, longitude: f64 },
    Photo { chat_id: i64, path: PathBuf },
    CallbackAnswer { data: Option<String>, text: String },
}

/// Ordered, shared list of entries
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Messenger that records instead of sending
///
/// With a journal attached, callback answers are also written to it as
/// `answer:<text>` so they can be ordered against handler entries.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<Sent>>>,
    journal: Option<Journal>,
    fail: Arc<AtomicBool>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Make every following call fail after recording it
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of all plain text messages, in order
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<()> {
        self.sent.lock().unwrap().push(sent);
        if self.fail.load(Ordering::SeqCst) {
            return Err(FlowBuddyError::Config("messenger failure injected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: ChatId, text: String, _markup: Option<ReplyMarkup>) -> Result<()> {
        self.record(Sent::Text { chat_id: chat_id.0, text })
    }

    async fn send_html(&self, chat_id: ChatId, text: String, _markup: Option<ReplyMarkup>) -> Result<()> {
        self.record(Sent::Html { chat_id: chat_id.0, text })
    }

    async fn send_location(&self, chat_id: ChatId, latitude: f64, longitude: f64) -> Result<()> {
        self.record(Sent::Location { chat_id: chat_id.0, latitude, longitude })
    }

    async fn send_photo(&self, chat_id: ChatId, path: PathBuf) -> Result<()> {
        self.record(Sent::Photo { chat_id: chat_id.0, path })
    }

    async fn answer_callback_query(&self, query: &CallbackQuery, text: String) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal.push(format!("answer:{}", text));
        }
        self.record(Sent::CallbackAnswer { data: query.data.clone(), text })
    }
}

/// In-memory store with injectable load and save failures
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStateStore,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Number of save calls, failed ones included
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Stored state, bypassing failure injection
    pub async fn peek(&self, identity: &Identity) -> ConversationState {
        self.inner.load(identity).await.unwrap()
    }

    /// Store a state directly, bypassing failure injection
    pub async fn put(&self, identity: &Identity, state: &ConversationState) {
        self.inner.save(identity, state).await.unwrap()
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn load(&self, identity: &Identity) -> Result<ConversationState> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(FlowBuddyError::StateStore("load failure injected".to_string()));
        }
        self.inner.load(identity).await
    }

    async fn save(&self, identity: &Identity, state: &ConversationState) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(FlowBuddyError::StateStore("save failure injected".to_string()));
        }
        self.inner.save(identity, state).await
    }
}
