//! # Server Module
//!
//! TCP side of the FastAGI protocol.
//!
//! ## Connection lifecycle
//!
//! 1. [`AgiServer`] accepts a connection on its `may` listener and spawns a
//!    coroutine for it.
//! 2. [`request::read_headers`] reads the `key: value` header block up to the
//!    first blank line.
//! 3. [`AgiService::handle`] builds the call context, dispatches to the
//!    route and runs the handler.
//! 4. The connection closes when the handler returns.
//!
//! ```rust,no_run
//! use agirouter::dispatcher::RouteTable;
//! use agirouter::server::{AgiServer, AgiService};
//!
//! let table = RouteTable::new();
//! let handle = AgiServer::new(AgiService::new(table.freeze()))
//!     .start("127.0.0.1:4574")
//!     .unwrap();
//! handle.wait_ready().unwrap();
//! handle.stop();
//! ```
//!
//! Stopping the server closes the listener only; calls in progress keep
//! running until their handlers return.

mod agi_server;
pub mod request;
mod service;

pub use agi_server::{AgiServer, ServerHandle};
pub use request::{parse_call, read_headers, HeaderMap, ParamVec, ParsedCall};
pub use service::AgiService;
