use super::request::{read_headers, HeaderMap};
use crate::call::CallContext;
use crate::dispatcher::Dispatcher;
use crate::protocol::{AgiError, Transport};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Per-connection entry point of the server.
///
/// Holds the frozen [`Dispatcher`] and the call-level settings applied to
/// every [`CallContext`]. Cheap to clone into each connection coroutine.
#[derive(Clone, Debug)]
pub struct AgiService {
    dispatcher: Dispatcher,
    raise_on_error: bool,
}

impl AgiService {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            raise_on_error: false,
        }
    }

    /// Raise backend failures into handlers instead of returning them.
    #[must_use]
    pub fn with_raise_on_error(mut self, raise: bool) -> Self {
        self.raise_on_error = raise;
        self
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one call given its parsed headers and transport.
    ///
    /// Returns once the handler has returned. A missing path or route is
    /// logged and reported without sending any command. The connection
    /// closes when `transport` is dropped on return.
    ///
    /// # Errors
    ///
    /// Whatever [`Dispatcher::dispatch`] returns; it has already been logged.
    pub fn handle(&self, headers: HeaderMap, transport: Transport) -> anyhow::Result<()> {
        let mut ctx = CallContext::new(headers, transport).with_raise_on_error(self.raise_on_error);
        let call_id = ctx.call_id();
        info!(
            call_id = %call_id,
            path = ?ctx.path(),
            channel = ?ctx.channel(),
            args = ctx.args().len(),
            "Call accepted"
        );

        let started = Instant::now();
        let result = self.dispatcher.dispatch(&mut ctx);
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(()) => info!(call_id = %call_id, elapsed_ms, "Call handled"),
            Err(err) => match err.downcast_ref::<AgiError>() {
                Some(AgiError::NoRoute(path)) => {
                    warn!(call_id = %call_id, path = %path, "No route for call");
                }
                Some(AgiError::MissingPath) => {
                    warn!(call_id = %call_id, "Call headers carry no path");
                }
                Some(AgiError::ConnectionClosed { command }) => {
                    info!(
                        call_id = %call_id,
                        command = %command,
                        elapsed_ms,
                        "Connection closed during call"
                    );
                }
                _ => error!(
                    call_id = %call_id,
                    error = %err,
                    elapsed_ms,
                    "Call handler failed"
                ),
            },
        }
        result
    }

    /// Handle the call on an accepted stream.
    ///
    /// # Errors
    ///
    /// Transport setup failures, then see [`AgiService::serve_transport`].
    pub fn serve_connection(&self, stream: may::net::TcpStream) -> anyhow::Result<()> {
        let peer = stream.peer_addr().ok();
        let transport = match Transport::from_tcp(stream) {
            Ok(t) => t,
            Err(e) => {
                warn!(peer = ?peer, error = %e, "Call setup failed");
                return Err(e.into());
            }
        };
        self.serve_transport(transport, peer)
    }

    /// Read the header block from `transport` and handle the call.
    ///
    /// A header block that cannot be read (I/O error, non-UTF-8 bytes) is
    /// logged and ends the call without sending any command.
    ///
    /// # Errors
    ///
    /// Header read failures, then see [`AgiService::handle`].
    pub fn serve_transport(
        &self,
        mut transport: Transport,
        peer: Option<SocketAddr>,
    ) -> anyhow::Result<()> {
        let headers = match read_headers(&mut transport) {
            Ok(h) => h,
            Err(e) => {
                warn!(peer = ?peer, error = %e, "Call setup failed");
                return Err(e.into());
            }
        };
        debug!(peer = ?peer, headers = headers.len(), "Header block read");
        self.handle(headers, transport)
    }
}
