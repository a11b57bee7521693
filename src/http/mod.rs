//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 side of the server: requests that
//! arrive in arbitrary fragments, content-length bodies and keep-alive reuse
//! of a connection.
//!
//! # Architecture
//!
//! - **`buffer`**: Append-only byte region growing in fixed blocks
//! - **`request`**: Parse state of one request, stored as offsets into its buffer
//! - **`parser`**: Incremental parser, safe to re-run after every read
//! - **`connection`**: Per-connection state machine driven by readiness events
//! - **`response`**: Status codes and response builder
//! - **`writer`**: Serializes a response and writes it to a non-blocking socket
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine. The socket is
//! registered for exactly one direction at a time:
//!
//! ```text
//!        ┌──────────────────┐
//!        │  Read-interested │ ← read, append to buffer, parse
//!        └──────┬───────────┘
//!               │ Buffer complete (or size limit reached)
//!               ▼
//!        ┌──────────────────┐
//!        │ Write-interested │ ← build response, write until flushed
//!        └──────┬───────────┘
//!               │ Response sent, request reset
//!               └─ back to Read-interested (same socket)
//!
//!   Peer close, read or write error in any state → Closed
//! ```
//!
//! # Example
//!
//! ```
//! use wicket::http::parser::Progress;
//! use wicket::http::request::{Method, Request};
//!
//! let mut req = Request::from_bytes(b"GET /index.html HT").unwrap();
//! assert_eq!(req.parse(), Ok(Progress::Incomplete));
//!
//! req.buffer_mut().append(b"TP/1.1\r\n\r\n").unwrap();
//! assert_eq!(req.parse(), Ok(Progress::Parsed));
//! assert!(req.is_complete());
//! assert_eq!(req.method(), Some(Method::GET));
//! assert_eq!(req.path_str(), Some("/index.html"));
//! ```

pub mod buffer;
pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
