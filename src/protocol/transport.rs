use super::error::AgiError;
use super::response::{AgiResponse, STATUS_USAGE_ERROR};
use std::io::{self, BufRead, BufReader, Write};
use tracing::debug;

/// Bidirectional line transport owned by one call.
///
/// Reader and writer are boxed so the same call code runs over a TCP
/// stream or an in-memory buffer.
pub struct Transport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    /// Wrap an accepted coroutine-aware TCP stream.
    ///
    /// # Errors
    ///
    /// Fails when the socket handle cannot be duplicated.
    pub fn from_tcp(stream: may::net::TcpStream) -> io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self::new(BufReader::new(stream), writer))
    }

    /// Read one line without its terminator. `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Propagates transport read failures.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    /// Write one line and flush it.
    ///
    /// # Errors
    ///
    /// Propagates transport write failures.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn read_response_line(&mut self, command: &str) -> Result<String, AgiError> {
        self.read_line()?.ok_or_else(|| AgiError::ConnectionClosed {
            command: command.to_string(),
        })
    }

    /// Send one command and read its response.
    ///
    /// Interim `100` lines are skipped. A multi-line `520-` usage block is
    /// read to its closing `520 ` line and folded into the message. Failure
    /// lines are returned, not raised; see [`AgiResponse::into_result`].
    ///
    /// # Errors
    ///
    /// [`AgiError::ConnectionClosed`] when the stream ends before a final
    /// response, [`AgiError::Io`] on transport failure.
    pub fn exchange(&mut self, command: &str) -> Result<AgiResponse, AgiError> {
        self.write_line(command)?;
        debug!(command = %command, "AGI command sent");

        let mut line = self.read_response_line(command)?;
        let mut response = AgiResponse::parse(&line);
        while response.is_interim() {
            debug!(command = %command, message = %response.message, "Interim response");
            line = self.read_response_line(command)?;
            response = AgiResponse::parse(&line);
        }

        if response.status_code == STATUS_USAGE_ERROR && line.starts_with("520-") {
            let mut usage = vec![response.message.clone()];
            loop {
                let next = self.read_response_line(command)?;
                if let Some(last) = next.strip_prefix("520 ") {
                    usage.push(last.to_string());
                    break;
                }
                usage.push(next);
            }
            response.message = usage.join("\n");
        }

        debug!(
            command = %command,
            status_code = response.status_code,
            result = ?response.result,
            error = ?response.error,
            "AGI response received"
        );
        Ok(response)
    }
}
