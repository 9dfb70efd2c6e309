//! Mode controller
//!
//! [`machine`] holds the state machine itself; [`backoff`] the
//! reconnection arithmetic and restart bookkeeping; [`handle`] the
//! public handle that runs the machine as a task and exposes the
//! command surface.

mod backoff;
mod handle;
mod machine;

pub use handle::WakeWordListener;
pub use machine::{Mode, StartError};
