use crate::ids::CallId;
use crate::protocol::{AgiError, AgiResponse, Transport};
use crate::server::request::{parse_call, HeaderMap, ParamVec, UNIQUEID_HEADER};
use tracing::warn;

/// Per-call context handed to route handlers.
///
/// Owns the call's transport for its whole lifetime. Commands go through
/// [`CallContext::send`], one at a time: `&mut self` guarantees the previous
/// response has been read before the next command can be written.
pub struct CallContext {
    call_id: CallId,
    headers: HeaderMap,
    channel: Option<String>,
    path: Option<String>,
    args: Vec<String>,
    query: ParamVec,
    raise_on_error: bool,
    transport: Transport,
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("call_id", &self.call_id)
            .field("channel", &self.channel)
            .field("path", &self.path)
            .field("args", &self.args)
            .field("query", &self.query)
            .field("raise_on_error", &self.raise_on_error)
            .finish_non_exhaustive()
    }
}

impl CallContext {
    /// Build the context from a parsed header block.
    ///
    /// Failure responses are returned to the handler rather than raised
    /// until [`CallContext::with_raise_on_error`] says otherwise.
    #[must_use]
    pub fn new(headers: HeaderMap, transport: Transport) -> Self {
        let parsed = parse_call(&headers);
        let call_id = headers
            .get(UNIQUEID_HEADER)
            .map_or_else(CallId::new, |id| CallId::from_unique_id(id));
        Self {
            call_id,
            headers,
            channel: parsed.channel,
            path: parsed.path,
            args: parsed.args,
            query: parsed.query,
            raise_on_error: false,
            transport,
        }
    }

    #[must_use]
    pub fn with_raise_on_error(mut self, raise: bool) -> Self {
        self.raise_on_error = raise;
        self
    }

    #[must_use]
    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw header value by name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Positional call arguments in order
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// All query parameters, repeats included
    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn raise_on_error(&self) -> bool {
        self.raise_on_error
    }

    /// Send one command line and wait for its response.
    ///
    /// With `raise_on_error` set, failure responses come back as
    /// [`AgiError::Command`]; otherwise they are logged and returned with
    /// [`AgiResponse::error`] set.
    ///
    /// # Errors
    ///
    /// [`AgiError::ConnectionClosed`] or [`AgiError::Io`] when the transport
    /// fails, whatever `raise_on_error` says. [`AgiError::Command`] for
    /// failure responses when raising.
    pub fn send(&mut self, command: impl AsRef<str>) -> Result<AgiResponse, AgiError> {
        let command = command.as_ref();
        let response = self.transport.exchange(command)?;
        if let Some(kind) = response.error {
            if self.raise_on_error {
                return response.into_result();
            }
            warn!(
                call_id = %self.call_id,
                command = %command,
                status_code = response.status_code,
                failure = %kind,
                message = %response.message,
                "AGI command failed"
            );
        }
        Ok(response)
    }
}
