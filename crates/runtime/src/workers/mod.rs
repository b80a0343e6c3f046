//! Worker tasks that back the session runtime.
//!
//! The session worker owns the wallet session and the run controller; chain
//! calls it starts run on short-lived tasks that report back to it.

mod session;

pub(crate) use session::SessionServices;
pub use session::{Command, SessionWorker};
