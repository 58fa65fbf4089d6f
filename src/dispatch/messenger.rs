//! Outbound send capability
//!
//! Handlers talk back to Telegram through the [`Messenger`] bound to their
//! [`UpdateContext`](super::UpdateContext). [`TeloxideMessenger`] is the
//! production implementation; tests substitute their own.

use std::path::PathBuf;
use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, InputFile, ParseMode, ReplyMarkup},
};
use tracing::debug;

use crate::utils::errors::Result;

/// Capability to send messages on behalf of the bot
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: String, markup: Option<ReplyMarkup>) -> Result<()>;

    async fn send_html(&self, chat_id: ChatId, text: String, markup: Option<ReplyMarkup>) -> Result<()>;

    async fn send_location(&self, chat_id: ChatId, latitude: f64, longitude: f64) -> Result<()>;

    /// Upload a local file as a photo
    async fn send_photo(&self, chat_id: ChatId, path: PathBuf) -> Result<()>;

    async fn answer_callback_query(&self, query: &CallbackQuery, text: String) -> Result<()>;

    /// Underlying Bot API client, for calls the methods above do not cover
    fn bot(&self) -> Option<&Bot> {
        None
    }
}

/// Messenger backed by the Telegram Bot API
#[derive(Debug, Clone)]
pub struct TeloxideMessenger {
    bot: Bot,
}

impl TeloxideMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TeloxideMessenger {
    async fn send_text(&self, chat_id: ChatId, text: String, markup: Option<ReplyMarkup>) -> Result<()> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
        debug!(chat_id = chat_id.0, "Text message sent");
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, text: String, markup: Option<ReplyMarkup>) -> Result<()> {
        let mut request = self.bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
        debug!(chat_id = chat_id.0, "HTML message sent");
        Ok(())
    }

    async fn send_location(&self, chat_id: ChatId, latitude: f64, longitude: f64) -> Result<()> {
        self.bot.send_location(chat_id, latitude, longitude).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, path: PathBuf) -> Result<()> {
        self.bot.send_photo(chat_id, InputFile::file(path)).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, query: &CallbackQuery, text: String) -> Result<()> {
        self.bot.answer_callback_query(query.id.clone()).text(text).await?;
        debug!(callback_id = ?query.id, "Callback query answered");
        Ok(())
    }

    fn bot(&self) -> Option<&Bot> {
        Some(&self.bot)
    }
}

/// Messenger that drops everything, for routers that never reply
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMessenger;

#[async_trait]
impl Messenger for NoopMessenger {
    async fn send_text(&self, _chat_id: ChatId, _text: String, _markup: Option<ReplyMarkup>) -> Result<()> {
        Ok(())
    }

    async fn send_html(&self, _chat_id: ChatId, _text: String, _markup: Option<ReplyMarkup>) -> Result<()> {
        Ok(())
    }

    async fn send_location(&self, _chat_id: ChatId, _latitude: f64, _longitude: f64) -> Result<()> {
        Ok(())
    }

    async fn send_photo(&self, _chat_id: ChatId, _path: PathBuf) -> Result<()> {
        Ok(())
    }

    async fn answer_callback_query(&self, _query: &CallbackQuery, _text: String) -> Result<()> {
        Ok(())
    }
}
