use super::error::{AgiError, FailureKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// `STATUS_CODE rest-of-line`
#[allow(clippy::unwrap_used)]
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d*)\s*(.*)$").unwrap());

/// `key=value (data)`; value and data are both optional
#[allow(clippy::unwrap_used)]
static RE_KV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)=(\S+)?\s*(?:\((.*)\))*").unwrap());

pub const STATUS_TRYING: u16 = 100;
pub const STATUS_SUCCESS: u16 = 200;
pub const STATUS_INVALID_COMMAND: u16 = 510;
pub const STATUS_USAGE_ERROR: u16 = 520;

/// Qualifier reported when a timed operation expired.
pub const TIMEOUT_MARKER: &str = "timeout";
/// Qualifier reported when the channel hung up.
pub const HANGUP_MARKER: &str = "hangup";

/// One decoded response line.
///
/// `result` is `(value, qualifier)`: `200 result=1 (timeout)` decodes to
/// `("1", "timeout")`. Any other `key=value (data)` pairs on a success line
/// land in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgiResponse {
    /// Numeric status; `0` when the line carried none
    pub status_code: u16,
    /// Free text for interim and failure lines, empty on success
    pub message: String,
    /// Primary value and parenthesised qualifier
    pub result: (String, String),
    /// Further `key=value (data)` pairs of a success line
    pub attributes: Vec<(String, (String, String))>,
    /// Set when the line reports a failure
    pub error: Option<FailureKind>,
}

impl AgiResponse {
    /// Decode one response line. Pure; never fails.
    ///
    /// Failures are reported through [`AgiResponse::error`]; use
    /// [`AgiResponse::into_result`] (or [`decode`]) to raise them.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == "HANGUP" {
            return Self {
                message: "User hung up during execution".to_string(),
                error: Some(FailureKind::Hangup),
                ..Self::default()
            };
        }

        let (code, rest) = match RE_CODE.captures(line) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => ("", line),
        };
        let status_code = code.parse::<u16>().unwrap_or(0);

        let mut response = Self {
            status_code,
            ..Self::default()
        };

        match status_code {
            STATUS_TRYING => response.message = line.to_string(),
            STATUS_SUCCESS => {
                for caps in RE_KV.captures_iter(rest) {
                    let key = caps.get(1).map_or("", |m| m.as_str());
                    let value = caps.get(2).map_or("", |m| m.as_str()).to_string();
                    let data = caps.get(3).map_or("", |m| m.as_str()).to_string();

                    if response.error.is_none() {
                        if data == HANGUP_MARKER {
                            response.error = Some(FailureKind::Hangup);
                            response.message = "User hung up during execution".to_string();
                        } else if key == "result" && value == "-1" {
                            response.error = Some(FailureKind::AppError);
                            response.message =
                                "Error executing application, or hangup".to_string();
                        }
                    }

                    if key == "result" {
                        response.result = (value, data);
                    } else {
                        response.attributes.push((key.to_string(), (value, data)));
                    }
                }
            }
            STATUS_INVALID_COMMAND => {
                response.error = Some(FailureKind::InvalidCommand);
                response.message = rest.to_string();
            }
            STATUS_USAGE_ERROR => {
                response.error = Some(FailureKind::UsageError);
                response.message = rest.trim_start_matches('-').to_string();
            }
            _ => {
                response.error = Some(FailureKind::Unknown);
                response.message = if rest.is_empty() {
                    line.to_string()
                } else {
                    rest.to_string()
                };
            }
        }
        response
    }

    /// `true` for `100 Trying...` interim lines.
    #[must_use]
    pub fn is_interim(&self) -> bool {
        self.status_code == STATUS_TRYING
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code == STATUS_SUCCESS
    }

    /// `true` when the qualifier is the timeout marker.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.result.1 == TIMEOUT_MARKER
    }

    /// Look up a non-`result` attribute such as `endpos`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&(String, String)> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Raise a failure line as [`AgiError::Command`].
    ///
    /// # Errors
    ///
    /// Returns [`AgiError::Command`] carrying this response when
    /// [`AgiResponse::error`] is set.
    pub fn into_result(self) -> Result<Self, AgiError> {
        match self.error {
            Some(kind) => Err(AgiError::Command {
                kind,
                response: Box::new(self),
            }),
            None => Ok(self),
        }
    }
}

/// Decode a response line and raise failures.
///
/// # Errors
///
/// Returns [`AgiError::Command`] for failure lines.
pub fn decode(line: &str) -> Result<AgiResponse, AgiError> {
    AgiResponse::parse(line).into_result()
}
