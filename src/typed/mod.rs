//! # Typed Module
//!
//! Type-directed handling of untyped call data.
//!
//! Everything that arrives from the backend is text: numbered call
//! arguments, query parameters of the request URL, and response payloads.
//! This module turns that text into typed values without ever failing a
//! call over malformed input.
//!
//! - [`convert`] / [`convert_value`] apply a declared [`ParamType`] on a
//!   best-effort basis and fall back to the original value.
//! - [`ArgumentModel`] declares an aggregate filled *positionally* from a
//!   run of raw arguments; each field converts independently.
//! - [`CallParams`] declares a typed handler's parameters as a struct and
//!   derives the route signature from it.
//!
//! ## Usage
//!
//! ```rust
//! use agirouter::typed::{convert, ParamType};
//! use agirouter::ArgumentModel;
//! use serde_json::json;
//!
//! #[derive(ArgumentModel)]
//! struct Transfer {
//!     extension: i64,
//!     #[agi(default = "30")]
//!     ring_secs: i64,
//! }
//!
//! let inst = Transfer::build(&["2001"]);
//! assert_eq!(inst.get("extension"), Some(&json!(2001)));
//! assert_eq!(inst.get("ring_secs"), Some(&json!(30)));
//! assert_eq!(convert("abc", ParamType::Int), json!("abc"));
//! ```

mod core;
mod model;
mod params;

pub use core::{convert, convert_value, ParamType};
pub use model::{ArgumentModel, ModelField, ModelInstance, ModelShape};
pub use params::{deserialize_args, CallParams, ParamsError};
