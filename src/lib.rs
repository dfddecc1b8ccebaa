//! # agirouter
//!
//! **agirouter** is a coroutine-powered FastAGI call router for Rust. A
//! telephony backend opens one TCP connection per call; agirouter reads the
//! call's header block, picks the handler registered for the call's path,
//! binds the handler's parameters from the call data, and gives the handler
//! a [`CallContext`](call::CallContext) to drive the call with line commands.
//!
//! ## Architecture
//!
//! - **[`server`]** - `may` TCP acceptor, header block reader and the
//!   per-connection entry point
//! - **[`protocol`]** - command formatting, response line decoding, errors
//! - **[`call`]** - per-call context and the typed AGI commands
//! - **[`dispatcher`]** - route table, parameter signatures and the binder
//! - **[`router`]** - detachable route collections merged at startup
//! - **[`typed`]** - best-effort conversion and argument models
//! - **[`runtime_config`]** / **[`logging`]** - configuration and tracing setup
//!
//! ### Call Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant PBX as Backend
//!     participant Srv as AgiServer
//!     participant Svc as AgiService
//!     participant Disp as Dispatcher
//!     participant H as Handler
//!
//!     PBX->>Srv: connect
//!     Srv->>Srv: spawn coroutine
//!     PBX->>Svc: agi_* header block, blank line
//!     Svc->>Disp: dispatch(CallContext)
//!     Disp->>Disp: resolve path, bind params
//!     Disp->>H: handler(ctx, args)
//!     H->>PBX: COMMAND "arg" ...
//!     PBX->>H: 200 result=...
//!     H-->>Svc: Ok(())
//!     Svc-->>PBX: close
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use agirouter::call::CallContext;
//! use agirouter::dispatcher::RouteTable;
//! use agirouter::server::{AgiServer, AgiService};
//! use agirouter::CallParams;
//!
//! #[derive(CallParams, serde::Deserialize)]
//! struct Check {
//!     #[agi(default = "3")]
//!     x: i64,
//! }
//!
//! let mut table = RouteTable::new();
//! let _check = table.route_typed("check", |ctx: &mut CallContext, params: Check| {
//!     ctx.say_number(params.x, "#")?;
//!     Ok(())
//! });
//!
//! let handle = AgiServer::new(AgiService::new(table.freeze()))
//!     .start("127.0.0.1:4574")?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Handlers that want the untyped view register with
//! [`RouteTable::route`](dispatcher::RouteTable::route) and an explicit
//! [`Signature`](dispatcher::Signature) instead.
//!
//! ## Runtime Considerations
//!
//! agirouter uses the `may` coroutine runtime, not tokio. Every call runs
//! in its own coroutine and only yields on socket I/O. Stack size and worker
//! count come from [`runtime_config::RuntimeConfig`] (`AGI_STACK_SIZE`,
//! `AGI_WORKERS`).

extern crate self as agirouter;

pub mod call;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod typed;

pub use agirouter_macros::{ArgumentModel, CallParams};
pub use call::CallContext;
pub use dispatcher::{BoundArgs, Dispatcher, Param, RouteTable, Signature};
pub use protocol::{AgiError, AgiResponse, FailureKind};
pub use router::Router;
pub use server::{AgiServer, AgiService, ServerHandle};
pub use typed::{ArgumentModel, CallParams, ParamType};
