//! # Router Module
//!
//! A [`Router`] collects routes without a live server so handler modules
//! can register themselves independently of startup:
//!
//! ```rust
//! use agirouter::router::Router;
//! use agirouter::dispatcher::{BoundArgs, Param, RouteTable, Signature};
//! use agirouter::call::CallContext;
//!
//! fn billing_routes() -> Router {
//!     let mut router = Router::new();
//!     let _balance = router.route(
//!         "balance",
//!         Signature::new().param(Param::context("request")),
//!         |ctx: &mut CallContext, _args: BoundArgs| {
//!             ctx.answer()?;
//!             Ok(())
//!         },
//!     );
//!     router
//! }
//!
//! let mut table = RouteTable::new();
//! assert_eq!(table.include_router(&billing_routes()), 1);
//! ```
//!
//! Merging re-registers every entry through the table's normal
//! registration, so merged routes bind exactly like direct ones.

mod core;

pub use core::Router;
