//! # CLI Module
//!
//! Command-line entry point of the `agirouter` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve the built-in demo routes until SIGINT or SIGTERM:
//!
//! ```bash
//! agirouter serve --addr 0.0.0.0:4574 --config agi.yaml --workers 4
//! ```
//!
//! Options:
//! - `--addr <HOST:PORT>` - Listen address (default from config, then `127.0.0.1:4574`)
//! - `--config <FILE>` - YAML configuration file
//! - `--workers <N>` - Number of `may` worker threads
//!
//! Routes:
//! - `hello` - logs `hello world` on the backend
//! - `echo` - answers and reads back every positional argument
//!
//! Point the dialplan at it with `AGI(agi://127.0.0.1:4574/hello)`.

mod commands;


pub use commands::{run_cli, serve_config, start_demo_server, Cli, Commands};
