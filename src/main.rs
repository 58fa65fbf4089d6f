//! FlowBuddy demo bot
//!
//! Main application entry point

use std::sync::Arc;
use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use tracing::{info, warn};

use FlowBuddy::{
    config::Settings,
    dispatch::{run_polling, Router, TeloxideMessenger, UpdateContext},
    handlers::{CallbackOutcome, CallbackResult, HandlerResult},
    state::{create_state_store, Scenario, ScratchData, StepOutcome},
    utils::logging,
};

const FEEDBACK_SCENARIO: &str = "feedback";
const ERROR_REPLY: &str = "Something went wrong, please try again later.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", FlowBuddy::info());

    let mut bot = Bot::new(&settings.bot.token);
    if let Some(api_url) = &settings.bot.api_url {
        bot = bot.set_api_url(url::Url::parse(api_url)?);
    }

    let state_store = create_state_store(&settings.storage).await?;
    if state_store.is_none() {
        warn!("No state store configured, scenarios are disabled");
    }

    let messenger = Arc::new(TeloxideMessenger::new(bot.clone()));
    let router = Router::builder(messenger)
        .with_state_store(state_store)
        .auto_answer_callbacks(settings.bot.auto_answer_callbacks)
        .serialize_per_identity(settings.dispatch.serialize_per_identity)
        .command("/start", handle_start)
        .command("/help", handle_help)
        .callback_handler(handle_callback)
        .default_handler(handle_unknown)
        .error_handler(report_error)
        .scenario(feedback_scenario())
        .build();

    info!(router = ?router, "Router configured");

    run_polling(bot, router).await;

    info!("FlowBuddy bot has been shut down.");

    Ok(())
}

fn handle_start(ctx: &UpdateContext) -> BoxFuture<'_, HandlerResult> {
    async move {
        let keyboard = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("Leave feedback", FEEDBACK_SCENARIO),
            InlineKeyboardButton::callback("Help", "help"),
        ]]);
        ctx.send_text_with_markup("Hi! I collect feedback about our events.", keyboard)
            .await;
        Ok(())
    }
    .boxed()
}

fn handle_help(ctx: &UpdateContext) -> BoxFuture<'_, HandlerResult> {
    async move {
        ctx.send_html(
            "<b>Commands</b>\n\
             /start - main menu\n\
             /help - this message\n\
             /feedback - rate the last event",
        )
        .await;
        Ok(())
    }
    .boxed()
}

fn handle_callback(ctx: &UpdateContext) -> BoxFuture<'_, CallbackResult> {
    async move {
        match ctx.callback_data.as_str() {
            FEEDBACK_SCENARIO => {
                ctx.trigger_scenario(FEEDBACK_SCENARIO).await;
                Ok(CallbackOutcome::Handled)
            }
            "help" => {
                handle_help(ctx).await?;
                Ok(CallbackOutcome::Handled)
            }
            _ => Ok(CallbackOutcome::Pass),
        }
    }
    .boxed()
}

fn handle_unknown(ctx: &UpdateContext) -> BoxFuture<'_, HandlerResult> {
    async move {
        if ctx.message().is_some() {
            ctx.send_text("Sorry, I did not get that. Try /help.").await;
        }
        Ok(())
    }
    .boxed()
}

/// Error details stay in the logs, the user only gets a generic reply
fn report_error<'a>(ctx: &'a UpdateContext, _error: &'a anyhow::Error) -> BoxFuture<'a, ()> {
    async move {
        if !ctx.identity.is_none() {
            ctx.send_text(ERROR_REPLY).await;
        }
    }
    .boxed()
}

fn feedback_scenario() -> Scenario {
    Scenario::builder(FEEDBACK_SCENARIO)
        .triggered_by(["/feedback", "Leave feedback"])
        .add_step("ask_rating", ask_rating)
        .add_step("rating", read_rating)
        .add_step("comment", read_comment)
        .build()
}

fn ask_rating<'a>(ctx: &'a UpdateContext, _data: &'a mut ScratchData) -> BoxFuture<'a, HandlerResult<StepOutcome>> {
    async move {
        let keyboard = KeyboardMarkup::new(vec![(1..=5)
            .map(|n| KeyboardButton::new(n.to_string()))
            .collect::<Vec<_>>()])
        .one_time_keyboard()
        .resize_keyboard();
        ctx.send_text_with_markup("How would you rate the last event, 1 to 5?", keyboard)
            .await;
        Ok(StepOutcome::next("rating"))
    }
    .boxed()
}

fn read_rating<'a>(ctx: &'a UpdateContext, data: &'a mut ScratchData) -> BoxFuture<'a, HandlerResult<StepOutcome>> {
    async move {
        match ctx.text.trim().parse::<u8>() {
            Ok(rating @ 1..=5) => {
                data.set("rating", rating)?;
                ctx.send_text("Thanks! Anything you want to add?").await;
                Ok(StepOutcome::next("comment"))
            }
            _ => {
                ctx.send_text("Please send a number from 1 to 5.").await;
                Ok(StepOutcome::next("rating"))
            }
        }
    }
    .boxed()
}

fn read_comment<'a>(ctx: &'a UpdateContext, data: &'a mut ScratchData) -> BoxFuture<'a, HandlerResult<StepOutcome>> {
    async move {
        let rating = data.get_i64("rating").unwrap_or_default();
        info!(
            chat_id = ctx.chat_id().0,
            rating = rating,
            comment = %ctx.text,
            "Feedback received"
        );
        ctx.send_text(format!("Got it: {} stars. See you at the next event!", rating))
            .await;
        Ok(StepOutcome::finish())
    }
    .boxed()
}
