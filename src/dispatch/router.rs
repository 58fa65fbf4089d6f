//! Update router
//!
//! The router decides which application handler owns an update. For every
//! update it runs, in order:
//!
//! 1. the all-updates handler, as an observation hook that never blocks
//! 2. the automatic callback query answer, if enabled
//! 3. the callback handler, which may claim the update, failing or not
//! 4. the command whose key equals the text
//! 5. the scenario one of whose triggers equals the text
//! 6. the scenario the conversation is waiting in, per the state store
//! 7. the default handler
//!
//! Handler failures go to the error hook and never stop the router.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use futures::future::BoxFuture;
use teloxide::types::Update;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::handlers::{
    CallbackError, CallbackHandler, CallbackOutcome, CallbackResult, ErrorHandler, Handler, HandlerResult,
};
use crate::state::{ConversationState, Scenario, ScenarioManager, StateStore, StepReport};
use crate::utils::logging::{log_handler_error, log_send_failure, log_store_failure};
use super::locks::IdentityLocks;
use super::messenger::Messenger;
use super::update::UpdateContext;

/// Immutable handler configuration and dispatch entry point
///
/// Built once through [`RouterBuilder`] before updates start flowing; cloning
/// is cheap and every clone dispatches through the same configuration.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    messenger: Arc<dyn Messenger>,
    commands: HashMap<String, Handler>,
    default_handler: Option<Handler>,
    all_handler: Option<Handler>,
    callback_handler: Option<CallbackHandler>,
    error_handler: Option<ErrorHandler>,
    scenarios: ScenarioManager,
    state_store: Option<Arc<dyn StateStore>>,
    auto_answer_callbacks: bool,
    identity_locks: Option<IdentityLocks>,
}

impl Router {
    pub fn builder(messenger: Arc<dyn Messenger>) -> RouterBuilder {
        RouterBuilder::new(messenger)
    }

    pub fn scenarios(&self) -> &ScenarioManager {
        &self.inner.scenarios
    }

    pub fn state_store(&self) -> Option<&Arc<dyn StateStore>> {
        self.inner.state_store.as_ref()
    }

    /// Handle an update on its own task
    ///
    /// Updates dispatched this way run concurrently and in no particular
    /// order, including updates of the same conversation unless the router
    /// serializes per identity.
    pub fn dispatch(&self, update: Update) -> JoinHandle<()> {
        let router = self.clone();
        tokio::spawn(async move { router.handle(update).await })
    }

    /// Handle one update to completion
    pub async fn handle(&self, update: Update) {
        let ctx = UpdateContext::new(update, self.inner.messenger.clone(), self.clone());
        let span = info_span!(
            "update",
            update_id = ctx.update.id.0,
            chat_id = ctx.identity.chat_id.0,
            user_id = ctx.identity.user_id.0,
        );

        async {
            let _guard = match &self.inner.identity_locks {
                Some(locks) if !ctx.identity.is_none() => Some(locks.lock(ctx.identity).await),
                _ => None,
            };
            self.resolve(&ctx).await;
        }
        .instrument(span)
        .await
    }

    async fn resolve(&self, ctx: &UpdateContext) {
        let inner = &self.inner;

        if let Some(handler) = &inner.all_handler {
            let result = handler(ctx).await;
            self.report(ctx, "all", result).await;
        }

        if inner.auto_answer_callbacks {
            if let Some(query) = ctx.callback_query() {
                let text = query.data.clone().unwrap_or_default();
                if let Err(e) = inner.messenger.answer_callback_query(query, text).await {
                    log_send_failure("answer_callback_query", ctx.chat_id().0, &e);
                }
            }
        }

        if let Some(handler) = &inner.callback_handler {
            if !ctx.callback_data.is_empty() {
                let outcome = match handler(ctx).await {
                    Ok(outcome) => outcome,
                    Err(CallbackError { outcome, error }) => {
                        self.handle_error(ctx, "callback", error).await;
                        outcome
                    }
                };
                if outcome == CallbackOutcome::Handled {
                    return;
                }
            }
        }

        if let Some(handler) = inner.commands.get(&ctx.text) {
            let result = handler(ctx).await;
            self.report(ctx, "command", result).await;
            return;
        }

        if let Some(store) = &inner.state_store {
            if let Some(scenario) = inner.scenarios.find_by_trigger(&ctx.text) {
                debug!(scenario = scenario.name(), "Scenario triggered");
                let mut state = ConversationState::starting(scenario.name());
                self.run_scenario(scenario, ctx, &mut state, store.as_ref()).await;
                return;
            }

            match store.load(&ctx.identity).await {
                Ok(mut state) if state.is_resumable() => {
                    let name = state.scenario.clone().unwrap_or_default();
                    match inner.scenarios.get_scenario(&name) {
                        Some(scenario) => {
                            self.run_scenario(scenario, ctx, &mut state, store.as_ref()).await;
                        }
                        None => {
                            warn!(scenario = %name, "Conversation waits in an unregistered scenario");
                            let placeholder = Scenario::empty(name);
                            self.run_scenario(&placeholder, ctx, &mut state, store.as_ref()).await;
                        }
                    }
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Failed to load conversation state, using default handler"
                    );
                }
            }
        }

        self.handle_default(ctx).await;
    }

    /// Start the named scenario for the context's identity, ignoring triggers
    ///
    /// No-op without a state store or when no scenario has that name.
    pub async fn trigger_scenario(&self, ctx: &UpdateContext, name: &str) {
        let Some(store) = &self.inner.state_store else {
            warn!(scenario = name, "Cannot trigger scenario without a state store");
            return;
        };
        let Some(scenario) = self.inner.scenarios.get_scenario(name) else {
            warn!(scenario = name, "Cannot trigger unknown scenario");
            return;
        };

        let mut state = ConversationState::starting(scenario.name());
        self.run_scenario(scenario, ctx, &mut state, store.as_ref()).await;
    }

    /// Run one step and persist the state as it came out, failed step or not
    async fn run_scenario(
        &self,
        scenario: &Scenario,
        ctx: &UpdateContext,
        state: &mut ConversationState,
        store: &dyn StateStore,
    ) {
        match scenario.execute(ctx, state).await {
            StepReport::Failed(e) => self.handle_error(ctx, "step", e).await,
            StepReport::NoStep => {
                warn!(
                    scenario = scenario.name(),
                    step = ?state.step,
                    "No such step in scenario, leaving conversation state unchanged"
                );
            }
            StepReport::Continued(_) | StepReport::Terminated => {}
        }

        if let Err(e) = store.save(&ctx.identity, state).await {
            log_store_failure("save", ctx.chat_id().0, ctx.user_id().0, &e);
            let error = anyhow::Error::from(e);
            self.notify_error(ctx, &error).await;
        }
    }

    async fn handle_default(&self, ctx: &UpdateContext) {
        match &self.inner.default_handler {
            Some(handler) => {
                let result = handler(ctx).await;
                self.report(ctx, "default", result).await;
            }
            None => debug!("Update not handled"),
        }
    }

    async fn report(&self, ctx: &UpdateContext, branch: &str, result: HandlerResult) {
        if let Err(e) = result {
            self.handle_error(ctx, branch, e).await;
        }
    }

    async fn handle_error(&self, ctx: &UpdateContext, branch: &str, error: anyhow::Error) {
        log_handler_error(branch, ctx.chat_id().0, ctx.user_id().0, &error);
        self.notify_error(ctx, &error).await;
    }

    async fn notify_error(&self, ctx: &UpdateContext, error: &anyhow::Error) {
        if let Some(handler) = &self.inner.error_handler {
            handler(ctx, error).await;
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut commands: Vec<&String> = self.inner.commands.keys().collect();
        commands.sort();

        f.debug_struct("Router")
            .field("commands", &commands)
            .field("scenarios", &self.inner.scenarios)
            .field("has_state_store", &self.inner.state_store.is_some())
            .field("auto_answer_callbacks", &self.inner.auto_answer_callbacks)
            .field("serialize_per_identity", &self.inner.identity_locks.is_some())
            .finish_non_exhaustive()
    }
}

/// Setup-time registration surface of a [`Router`]
pub struct RouterBuilder {
    messenger: Arc<dyn Messenger>,
    commands: HashMap<String, Handler>,
    default_handler: Option<Handler>,
    all_handler: Option<Handler>,
    callback_handler: Option<CallbackHandler>,
    error_handler: Option<ErrorHandler>,
    scenarios: ScenarioManager,
    state_store: Option<Arc<dyn StateStore>>,
    auto_answer_callbacks: bool,
    serialize_per_identity: bool,
}

impl RouterBuilder {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self {
            messenger,
            commands: HashMap::new(),
            default_handler: None,
            all_handler: None,
            callback_handler: None,
            error_handler: None,
            scenarios: ScenarioManager::new(),
            state_store: None,
            auto_answer_callbacks: false,
            serialize_per_identity: false,
        }
    }

    /// Register a handler for text exactly equal to `command`
    pub fn command<F>(mut self, command: impl Into<String>, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.commands.insert(command.into(), Arc::new(handler));
        self
    }

    /// Handler for updates nothing else claimed
    pub fn default_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Handler run for every update before any other; its errors never stop routing
    pub fn all_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.all_handler = Some(Arc::new(handler));
        self
    }

    /// Handler for updates with callback data
    ///
    /// [`CallbackOutcome::Pass`], as a result or inside a [`CallbackError`],
    /// lets routing go on; `Handled` stops it whether the handler failed or not.
    pub fn callback_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, CallbackResult> + Send + Sync + 'static,
    {
        self.callback_handler = Some(Arc::new(handler));
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext, &'a anyhow::Error) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.register_scenario(scenario);
        self
    }

    /// Store for conversation state; without one scenarios never run
    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn with_state_store(mut self, store: Option<Arc<dyn StateStore>>) -> Self {
        self.state_store = store;
        self
    }

    /// Answer every callback query with its own data before routing it
    pub fn auto_answer_callbacks(mut self, enabled: bool) -> Self {
        self.auto_answer_callbacks = enabled;
        self
    }

    /// Handle updates of the same chat/user pair one at a time
    pub fn serialize_per_identity(mut self, enabled: bool) -> Self {
        self.serialize_per_identity = enabled;
        self
    }

    pub fn build(self) -> Router {
        let identity_locks = self.serialize_per_identity.then(IdentityLocks::new);

        Router {
            inner: Arc::new(RouterInner {
                messenger: self.messenger,
                commands: self.commands,
                default_handler: self.default_handler,
                all_handler: self.all_handler,
                callback_handler: self.callback_handler,
                error_handler: self.error_handler,
                scenarios: self.scenarios,
                state_store: self.state_store,
                auto_answer_callbacks: self.auto_answer_callbacks,
                identity_locks,
            }),
        }
    }
}
