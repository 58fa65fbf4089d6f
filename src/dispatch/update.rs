//! Update context
//!
//! This module normalizes one inbound Telegram update into the
//! [`UpdateContext`] every handler receives: who sent it, what text or
//! callback data it carries, the structured payloads that came with it, and
//! the capabilities handlers use to answer.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use teloxide::Bot;
use teloxide::types::{
    CallbackQuery, ChatId, Contact, Location, Message, PreCheckoutQuery, ReplyMarkup, Update,
    UpdateKind, UserId,
};

use crate::utils::logging::log_send_failure;
use super::messenger::Messenger;
use super::router::Router;

/// The (chat, user) pair conversation state is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl Identity {
    /// Identity of updates that carry neither a chat nor a user
    pub const NONE: Identity = Identity {
        chat_id: ChatId(0),
        user_id: UserId(0),
    };

    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Resolve the identity of an update
    ///
    /// Message: its chat and sender. Callback query: the chat of the message
    /// the button was attached to and the presser; the presser's private chat
    /// when that message is gone. Pre-checkout query: the buyer as both chat
    /// and user. Anything else resolves to [`Identity::NONE`].
    pub fn from_update(update: &Update) -> Self {
        match &update.kind {
            UpdateKind::Message(message) => {
                let user_id = message.from.as_ref().map(|user| user.id).unwrap_or(UserId(0));
                Self::new(message.chat.id, user_id)
            }
            UpdateKind::CallbackQuery(query) => {
                let chat_id = query
                    .message
                    .as_ref()
                    .map(|message| message.chat().id)
                    .unwrap_or_else(|| private_chat(query.from.id));
                Self::new(chat_id, query.from.id)
            }
            UpdateKind::PreCheckoutQuery(query) => {
                Self::new(private_chat(query.from.id), query.from.id)
            }
            _ => Self::NONE,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chat_id.0, self.user_id.0)
    }
}

fn private_chat(user_id: UserId) -> ChatId {
    ChatId(user_id.0 as i64)
}

/// Per-delivery view of one update
#[derive(Clone)]
pub struct UpdateContext {
    /// The raw update as delivered
    pub update: Arc<Update>,
    pub identity: Identity,
    /// Message text, empty when the update has none
    pub text: String,
    /// Callback query data, empty unless the update is a callback query
    pub callback_data: String,
    pub contact: Option<Contact>,
    pub location: Option<Location>,
    messenger: Arc<dyn Messenger>,
    router: Router,
}

impl UpdateContext {
    /// Build the context of one update
    pub fn new(update: Update, messenger: Arc<dyn Messenger>, router: Router) -> Self {
        let identity = Identity::from_update(&update);

        let (text, contact, location) = match &update.kind {
            UpdateKind::Message(message) => (
                message.text().unwrap_or_default().to_string(),
                message.contact().cloned(),
                message.location().cloned(),
            ),
            _ => (String::new(), None, None),
        };

        let callback_data = match &update.kind {
            UpdateKind::CallbackQuery(query) => query.data.clone().unwrap_or_default(),
            _ => String::new(),
        };

        Self {
            update: Arc::new(update),
            identity,
            text,
            callback_data,
            contact,
            location,
            messenger,
            router,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.identity.chat_id
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn message(&self) -> Option<&Message> {
        match &self.update.kind {
            UpdateKind::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        match &self.update.kind {
            UpdateKind::CallbackQuery(query) => Some(query),
            _ => None,
        }
    }

    pub fn pre_checkout_query(&self) -> Option<&PreCheckoutQuery> {
        match &self.update.kind {
            UpdateKind::PreCheckoutQuery(query) => Some(query),
            _ => None,
        }
    }

    /// Raw access to the send capability, with errors
    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    /// Bot API client behind the messenger, `None` for messengers without one
    ///
    /// For calls the send helpers do not cover, such as answering a
    /// pre-checkout query or editing the message a button belongs to.
    pub fn bot(&self) -> Option<&Bot> {
        self.messenger.bot()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Send a text message to the update's chat
    pub async fn send_text(&self, text: impl Into<String>) {
        self.send_text_inner(text.into(), None).await
    }

    /// Send a text message with a keyboard to the update's chat
    pub async fn send_text_with_markup(&self, text: impl Into<String>, markup: impl Into<ReplyMarkup>) {
        self.send_text_inner(text.into(), Some(markup.into())).await
    }

    async fn send_text_inner(&self, text: String, markup: Option<ReplyMarkup>) {
        if let Err(e) = self.messenger.send_text(self.chat_id(), text, markup).await {
            log_send_failure("send_text", self.chat_id().0, &e);
        }
    }

    /// Send an HTML-formatted message to the update's chat
    pub async fn send_html(&self, text: impl Into<String>) {
        self.send_html_inner(text.into(), None).await
    }

    pub async fn send_html_with_markup(&self, text: impl Into<String>, markup: impl Into<ReplyMarkup>) {
        self.send_html_inner(text.into(), Some(markup.into())).await
    }

    async fn send_html_inner(&self, text: String, markup: Option<ReplyMarkup>) {
        if let Err(e) = self.messenger.send_html(self.chat_id(), text, markup).await {
            log_send_failure("send_html", self.chat_id().0, &e);
        }
    }

    pub async fn send_location(&self, latitude: f64, longitude: f64) {
        if let Err(e) = self.messenger.send_location(self.chat_id(), latitude, longitude).await {
            log_send_failure("send_location", self.chat_id().0, &e);
        }
    }

    /// Upload a photo from a local file
    pub async fn send_photo(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if let Err(e) = self.messenger.send_photo(self.chat_id(), path).await {
            log_send_failure("send_photo", self.chat_id().0, &e);
        }
    }

    /// Answer the update's callback query; no-op for other updates
    pub async fn answer_callback_query(&self, text: impl Into<String>) {
        if let Some(query) = self.callback_query() {
            if let Err(e) = self.messenger.answer_callback_query(query, text.into()).await {
                log_send_failure("answer_callback_query", self.chat_id().0, &e);
            }
        }
    }

    /// Start the named scenario for this update's identity, bypassing triggers
    pub async fn trigger_scenario(&self, name: &str) {
        self.router.trigger_scenario(self, name).await
    }
}

impl fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("update_id", &self.update.id)
            .field("identity", &self.identity)
            .field("text", &self.text)
            .field("callback_data", &self.callback_data)
            .field("contact", &self.contact)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
