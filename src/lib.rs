//! Wicket - event-driven static HTTP/1.1 server
//!
//! Core library: incremental request parsing, per-connection state machine
//! and the readiness reactor that drives them.

pub mod config;
pub mod http;
pub mod resource;
pub mod server;
