//! Listening socket and the readiness loop.

pub mod listener;
pub mod reactor;

pub use reactor::{Reactor, ShutdownHandle};
