//! # Protocol Module
//!
//! The command/response codec handlers use to drive a call.
//!
//! ## Wire format
//!
//! Commands go out as one line, literal arguments quoted:
//!
//! ```text
//! SAY DIGITS "1234" "#"
//! ```
//!
//! Every command gets exactly one final response line back:
//!
//! ```text
//! 200 result=49
//! 200 result= (timeout)
//! 510 Invalid or unknown command
//! ```
//!
//! A `200` line carries `result=VALUE` and an optional parenthesised
//! qualifier. Anything else is a failure and decodes to a [`FailureKind`].
//!
//! ## Sequencing
//!
//! The protocol is strictly non-pipelined. [`Transport::exchange`] writes a
//! command and blocks (cooperatively, on the `may` runtime) until its final
//! response has been read; the next command cannot start before that.

mod command;
mod error;
mod response;
mod transport;

pub use command::{decode_dtmf, digit_list, quote, Command, DigitList, VerboseLevel};
pub use error::{AgiError, FailureKind};
pub use response::{
    decode, AgiResponse, HANGUP_MARKER, STATUS_INVALID_COMMAND, STATUS_SUCCESS, STATUS_TRYING,
    STATUS_USAGE_ERROR, TIMEOUT_MARKER,
};
pub use transport::Transport;
