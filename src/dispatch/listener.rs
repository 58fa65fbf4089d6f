//! Long-polling listener
//!
//! Feeds updates from the Bot API into a [`Router`]. teloxide's dispatcher
//! only does the polling here; every update is handed to the router on its
//! own task, so updates are handled concurrently rather than per chat in
//! sequence.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{info, trace};

use super::router::Router;

type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Poll the Bot API until interrupted, routing every update
pub async fn run_polling(bot: Bot, router: Router) {
    info!("Starting bot with polling mode...");

    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            trace!(update_id = upd.id.0, "Update not routed");
        })
        .enable_ctrlc_handler()
        .build();

    dispatcher.dispatch().await;

    info!("Polling stopped");
}

fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry().endpoint(route_update)
}

async fn route_update(update: Update, router: Router) -> ListenerResult {
    router.dispatch(update);
    Ok(())
}
