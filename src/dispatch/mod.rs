//! Update dispatch
//!
//! Everything between an update arriving and an application handler running:
//! update normalization, the routing policy, the outbound send capability and
//! the polling listener.

pub mod listener;
pub mod locks;
pub mod messenger;
pub mod router;
pub mod update;

pub use listener::run_polling;
pub use locks::{IdentityGuard, IdentityLocks};
pub use messenger::{Messenger, NoopMessenger, TeloxideMessenger};
pub use router::{Router, RouterBuilder};
pub use update::{Identity, UpdateContext};
