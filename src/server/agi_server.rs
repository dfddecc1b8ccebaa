use super::service::AgiService;
use may::coroutine::{self, JoinHandle};
use may::net::TcpListener;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// FastAGI server: one `may` coroutine per accepted connection.
pub struct AgiServer {
    service: AgiService,
    stack_size: usize,
}

/// Handle to a running server
///
/// Provides methods for waiting until the server is ready, stopping it, or
/// joining the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    ready: Arc<AtomicBool>,
}

impl ServerHandle {
    /// Address the listener is bound to, with the OS-assigned port resolved
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the accept loop is running.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the accept loop has not started within ~250ms
    /// (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if self.ready.load(Ordering::Acquire) {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting new calls.
    ///
    /// Cancels the accept coroutine, which closes the listener. Calls already
    /// in progress run in their own coroutines and finish normally.
    pub fn stop(self) {
        // SAFETY: may marks coroutine cancellation unsafe because the target
        // unwinds at its next yield point. The accept loop holds nothing but
        // the listener, which is released by the unwind.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Accept loop cancelled");
        }
        info!(addr = %self.addr, "AGI server stopped");
    }

    /// Block until the accept loop ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked or was cancelled.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl AgiServer {
    #[must_use]
    pub fn new(service: AgiService) -> Self {
        Self {
            service,
            stack_size: may::config().get_stack_size(),
        }
    }

    /// Stack size of each connection coroutine.
    #[must_use]
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Bind `addr` and start accepting calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, the port cannot be bound
    /// or the accept coroutine cannot be spawned.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let ready = Arc::new(AtomicBool::new(false));
        let ready_flag = Arc::clone(&ready);
        let Self {
            service,
            stack_size,
        } = self;

        info!(
            addr = %addr,
            routes = service.dispatcher().len(),
            stack_size,
            "AGI server listening"
        );

        // SAFETY: `Builder::spawn` is unsafe in may because a coroutine must
        // not block its worker thread with non-cooperative I/O or hold
        // thread-local references across yields. The accept loop only uses
        // may's own listener and owns everything it touches.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("agi-accept".to_string())
                .stack_size(stack_size)
                .spawn(move || {
                    ready_flag.store(true, Ordering::Release);
                    accept_loop(&listener, &service, stack_size);
                })
        }?;

        Ok(ServerHandle { addr, handle, ready })
    }
}

fn accept_loop(listener: &TcpListener, service: &AgiService, stack_size: usize) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Accept failed");
                continue;
            }
        };
        debug!(peer = ?stream.peer_addr().ok(), "Connection accepted");

        let service = service.clone();
        // SAFETY: as above; the connection coroutine owns its stream and a
        // clone of the service, and performs only may socket I/O.
        let spawned = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || serve(&service, stream))
        };
        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn connection coroutine");
        }
    }
}

fn serve(service: &AgiService, stream: may::net::TcpStream) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        service.serve_connection(stream)
    }));
    // setup and call outcomes are logged by the service; only panics surface here
    if let Err(panic) = outcome {
        error!(panic = ?panic, "Call handler panicked");
    }
}
