//! # Call Module
//!
//! [`CallContext`] is what a handler holds while it drives a call: the
//! parsed header block (channel, path, positional arguments, query
//! parameters) plus the call's transport.
//!
//! ## Commands
//!
//! Every command goes through [`CallContext::send`], which writes one line
//! and blocks until the final response line is read. On top of it sit the
//! typed commands (`answer`, `verbose`, `say_digits`, `get_data`,
//! `get_variable`, ...) that format a specific grammar and decode the result.
//!
//! ```rust,no_run
//! use agirouter::call::CallContext;
//! use agirouter::protocol::VerboseLevel;
//!
//! fn greet(ctx: &mut CallContext) -> anyhow::Result<()> {
//!     ctx.answer()?;
//!     ctx.verbose("caller connected", VerboseLevel::Info)?;
//!     let (pin, timed_out) = ctx.get_data("enter-pin", 3000, 4)?;
//!     if !timed_out {
//!         ctx.set_variable("PIN", &pin)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failure handling
//!
//! Backend failures (`510`, `520`, `result=-1`, hangup) are raised as
//! [`AgiError::Command`](crate::protocol::AgiError::Command) only when the
//! context has `raise_on_error` set; otherwise they are logged and the
//! failure-shaped response is returned. A closed connection is always an
//! error.

mod commands;
mod context;

pub use context::CallContext;

#[cfg(test)]
pub(crate) mod testing {
    use super::CallContext;
    use crate::protocol::Transport;
    use crate::server::request::HeaderMap;
    use std::io::{self, Cursor, Write};
    use std::sync::{Arc, Mutex};

    /// Shared in-memory writer
    #[derive(Clone, Default)]
    pub(crate) struct Captured(pub(crate) Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Transport that replays `responses` and captures what is written
    pub(crate) fn scripted(responses: &str) -> (Transport, Captured) {
        scripted_bytes(responses.as_bytes())
    }

    /// Like [`scripted`], for input that is not valid UTF-8
    pub(crate) fn scripted_bytes(input: &[u8]) -> (Transport, Captured) {
        let out = Captured::default();
        let transport = Transport::new(Cursor::new(input.to_vec()), out.clone());
        (transport, out)
    }

    /// Run `f` under a subscriber that records formatted log output.
    pub(crate) fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        (value, text)
    }

    pub(crate) fn context(responses: &str) -> (CallContext, Captured) {
        let (transport, out) = scripted(responses);
        (CallContext::new(HeaderMap::new(), transport), out)
    }

    pub(crate) fn sent_lines(out: &Captured) -> Vec<String> {
        String::from_utf8(out.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
