#![allow(dead_code)]

pub mod transport {
    use agirouter::protocol::Transport;
    use parking_lot::Mutex;
    use std::io::{self, Cursor, Write};
    use std::sync::Arc;

    /// Writer whose bytes stay inspectable after the transport is moved away
    #[derive(Clone, Default)]
    pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        /// Lines written so far, without terminators
        pub fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    /// In-memory transport that reads `input` and records writes
    pub fn scripted(input: &str) -> (Transport, SharedBuf) {
        let out = SharedBuf::default();
        let transport = Transport::new(Cursor::new(input.as_bytes().to_vec()), out.clone());
        (transport, out)
    }
}

pub mod payload {
    /// Header block of a call to `agi://127.0.0.1:4574/{path}?{kwargs}`
    /// carrying `args` as numbered arguments, blank-line terminated.
    pub fn generate_agi_payload(path: &str, args: &[&str], kwargs: &[(&str, &str)]) -> String {
        let query = kwargs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut payload = format!(
            "agi_network: yes\n\
             agi_network_script: {path}\n\
             agi_request: agi://127.0.0.1:4574/{path}?{query}\n\
             agi_channel: SIP/xxxxxx-00000000\n\
             agi_language: en_US\n\
             agi_type: SIP\n\
             agi_callerid: 201\n\
             agi_calleridname: user 201\n\
             agi_dnid: 9011\n\
             agi_context: default\n\
             agi_extension: 9011\n\
             agi_priority: 2\n"
        );
        for (idx, arg) in args.iter().enumerate() {
            payload.push_str(&format!("agi_arg_{}: {arg}\n", idx + 1));
        }
        payload.push('\n');
        payload
    }
}

pub mod test_server {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Plays the telephony backend side of one call over real TCP
    pub struct FakeBackend {
        reader: BufReader<TcpStream>,
        writer: TcpStream,
    }

    impl FakeBackend {
        pub fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let writer = stream.try_clone().unwrap();
            Self {
                reader: BufReader::new(stream),
                writer,
            }
        }

        pub fn send_headers(&mut self, payload: &str) {
            self.writer.write_all(payload.as_bytes()).unwrap();
            self.writer.flush().unwrap();
        }

        /// Next command line from the server, without its newline
        pub fn read_command(&mut self) -> String {
            let mut line = String::new();
            self.reader.read_line(&mut line).unwrap();
            line.trim_end_matches(['\r', '\n']).to_string()
        }

        pub fn reply(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).unwrap();
            self.writer.write_all(b"\n").unwrap();
            self.writer.flush().unwrap();
        }

        /// Everything the server writes until it closes the connection
        pub fn read_until_closed(&mut self) -> String {
            let mut rest = String::new();
            self.reader.read_to_string(&mut rest).unwrap();
            rest
        }

        /// Drop the connection without answering
        pub fn hang_up(self) {
            let _ = self.writer.shutdown(std::net::Shutdown::Both);
        }
    }
}
