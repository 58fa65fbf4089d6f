//! Handler types
//!
//! Application code plugs into the router through these function types:
//! - command, default and all-updates handlers
//! - the callback query handler, which reports whether it took the update,
//!   also when it fails
//! - the error hook every handler failure is funnelled into
//! - scenario step handlers
//!
//! Handlers borrow the [`UpdateContext`] for the duration of the returned
//! future, so they are written as closures or functions returning a boxed
//! future:
//!
//! ```ignore
//! use futures::FutureExt;
//!
//! router.command("/ping", |ctx| async move {
//!     ctx.send_text("pong").await;
//!     Ok(())
//! }.boxed())
//! ```

use std::sync::Arc;
use futures::future::BoxFuture;

use crate::dispatch::UpdateContext;
use crate::state::{ScratchData, StepOutcome};
use crate::utils::errors::FlowBuddyError;

/// Result of an application handler
pub type HandlerResult<T = ()> = anyhow::Result<T>;

/// Command, default and all-updates handler
pub type Handler =
    Arc<dyn for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, HandlerResult> + Send + Sync>;

/// Whether a callback handler took the update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Stop resolution here
    Handled,
    /// Let commands, scenarios and the default handler have the update
    Pass,
}

/// Failure of a callback handler, with whether it still took the update
///
/// Errors propagated with `?` count as handled: by the time a handler fails
/// it has usually started acting on the button press. Use
/// [`CallbackError::pass`] to fail and still let resolution go on.
#[derive(Debug)]
pub struct CallbackError {
    pub outcome: CallbackOutcome,
    pub error: anyhow::Error,
}

impl CallbackError {
    pub fn handled(error: impl Into<anyhow::Error>) -> Self {
        Self {
            outcome: CallbackOutcome::Handled,
            error: error.into(),
        }
    }

    pub fn pass(error: impl Into<anyhow::Error>) -> Self {
        Self {
            outcome: CallbackOutcome::Pass,
            error: error.into(),
        }
    }
}

impl From<anyhow::Error> for CallbackError {
    fn from(error: anyhow::Error) -> Self {
        Self::handled(error)
    }
}

impl From<FlowBuddyError> for CallbackError {
    fn from(error: FlowBuddyError) -> Self {
        Self::handled(error)
    }
}

impl From<teloxide::RequestError> for CallbackError {
    fn from(error: teloxide::RequestError) -> Self {
        Self::handled(error)
    }
}

/// Result of a callback query handler
pub type CallbackResult = Result<CallbackOutcome, CallbackError>;

/// Callback query handler
pub type CallbackHandler =
    Arc<dyn for<'a> Fn(&'a UpdateContext) -> BoxFuture<'a, CallbackResult> + Send + Sync>;

/// Hook receiving every handler and state store failure
pub type ErrorHandler =
    Arc<dyn for<'a> Fn(&'a UpdateContext, &'a anyhow::Error) -> BoxFuture<'a, ()> + Send + Sync>;

/// One step of a scenario
pub type StepHandler = Arc<
    dyn for<'a> Fn(&'a UpdateContext, &'a mut ScratchData) -> BoxFuture<'a, HandlerResult<StepOutcome>>
        + Send
        + Sync,
>;
