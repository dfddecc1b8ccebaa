//! # Dispatcher Module
//!
//! Route table, parameter binding and per-call dispatch.
//!
//! ## Overview
//!
//! Handlers are registered under a path together with a [`Signature`]: the
//! ordered list of parameters they expect. The signature is recorded once;
//! every call only looks it up.
//!
//! ```rust
//! use agirouter::dispatcher::{BoundArgs, Param, RouteTable, Signature};
//! use agirouter::call::CallContext;
//! use agirouter::typed::ParamType;
//!
//! let mut table = RouteTable::new();
//! let _check = table.route(
//!     "check",
//!     Signature::new()
//!         .param(Param::context("request"))
//!         .param(Param::scalar("x", ParamType::Int).with_default("3")),
//!     |ctx: &mut CallContext, args: BoundArgs| {
//!         let x: i64 = args.get_as("x").unwrap_or_default();
//!         ctx.verbose(&format!("x is {x}"), Default::default())?;
//!         Ok(())
//!     },
//! );
//! let dispatcher = table.freeze();
//! assert!(dispatcher.resolve("check").is_some());
//! ```
//!
//! ## Binding
//!
//! For each accepted call the [`binder`](bind) fills parameters from, in
//! order: the call context, positional call arguments (left to right), the
//! request URL's query parameters (by name), and declared defaults. Values
//! are converted best-effort; a value that does not convert stays as text.
//! A parameter left without any value fails the call with
//! [`AgiError::Binding`](crate::protocol::AgiError::Binding).
//!
//! ## Lifecycle
//!
//! [`RouteTable`] is mutable and lives only through startup.
//! [`RouteTable::freeze`] turns it into a [`Dispatcher`], an `Arc`-backed
//! read-only table every connection coroutine clones. There is no way to
//! register routes on a `Dispatcher`, so no locking is needed while serving.

mod binder;
mod core;
mod signature;

pub use binder::{bind, BoundArgs, BoundValue};
pub use core::{Dispatcher, Handler, Route, RouteTable};
pub(crate) use core::typed_handler;
pub use signature::{Param, ParamKind, Signature};
