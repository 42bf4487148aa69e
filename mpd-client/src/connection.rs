//! A single MPD connection: handshake, command execution, teardown.

use bytes::BytesMut;
use mpd_proto::{escape_argument, AckError, DecoderEvent, FrameDecoder, ProtoError, ResponseLine};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::MpdConfig;
use crate::error::{ClientError, Result};

const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Sentinel line separating entries of an `command_list_ok_begin` response.
const LIST_OK: &str = "list_OK";

/// One established connection to an MPD server.
///
/// A connection is single-flight: it runs one command (or command list) at a
/// time and drains the full response before the next send. Unrecoverable
/// failures mark the connection destroyed; ACK failures leave it usable.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    version: String,
    stream: TcpStream,
    buffer: BytesMut,
    executing: bool,
    destroyed: bool,
}

impl Connection {
    /// Connect and complete the handshake within the configured timeout.
    ///
    /// The handshake covers the TCP connect, the `OK MPD <version>` greeting
    /// and, when a password is configured, the `password` exchange.
    pub async fn connect(config: &MpdConfig, id: u64) -> Result<Self> {
        match timeout(config.handshake_timeout, Self::handshake(config, id)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::HandshakeTimeout),
        }
    }

    async fn handshake(config: &MpdConfig, id: u64) -> Result<Self> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        stream.set_nodelay(true)?;

        let mut conn = Self {
            id,
            version: String::new(),
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            executing: false,
            destroyed: false,
        };

        let greeting = conn
            .read_line()
            .await?
            .ok_or(ClientError::ClosedByServer)?;
        let version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| ClientError::Handshake(format!("unexpected greeting: {greeting}")))?;
        conn.version = version.trim().to_string();

        if let Some(password) = &config.password {
            conn.send_line(&format!("password {}", escape_argument(password)))
                .await?;
            let reply = conn.read_line().await?.ok_or(ClientError::ClosedByServer)?;
            if reply.starts_with("ACK") {
                return Err(AckError::parse(&reply).into());
            }
            if reply != "OK" {
                return Err(ClientError::Handshake(format!(
                    "unexpected password reply: {reply}"
                )));
            }
        }

        debug!(id, version = %conn.version, "connected to mpd");
        Ok(conn)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Protocol version announced in the server greeting.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True while a command is in flight. Stays set when an `execute` future
    /// is dropped mid-response, which marks the connection unsafe to reuse.
    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Write one line to the server. The newline is appended here.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        if self.destroyed {
            return Err(ClientError::NotConnected);
        }
        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
        if let Err(err) = self.stream.write_all(&out).await {
            self.destroyed = true;
            return Err(err.into());
        }
        trace!(id = self.id, line, "sent");
        Ok(())
    }

    /// Read one newline-terminated line, buffering partial reads.
    ///
    /// Returns `Ok(None)` on a clean EOF between lines. Cancel-safe: a
    /// partially received line stays in the buffer for the next call.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = self.buffer.split_to(pos + 1);
                let text = std::str::from_utf8(&line[..pos]).map_err(|_| ProtoError::InvalidUtf8)?;
                return Ok(Some(text.to_string()));
            }
            let read = self.stream.read_buf(&mut self.buffer).await?;
            if read == 0 {
                self.destroyed = true;
                return Ok(None);
            }
        }
    }

    /// Send a single command and drain its full response.
    pub async fn execute(&mut self, command: &str) -> Result<Vec<ResponseLine>> {
        self.run(command, false).await
    }

    /// Send several commands as one `command_list_ok_begin` frame.
    ///
    /// The `list_OK` separators are filtered out of the result. On failure
    /// the ACK carries the zero-based index of the command that failed.
    pub async fn execute_list(&mut self, commands: &[String]) -> Result<Vec<ResponseLine>> {
        let mut frame = String::from("command_list_ok_begin\n");
        for command in commands {
            frame.push_str(command);
            frame.push('\n');
        }
        frame.push_str("command_list_end");
        self.run(&frame, true).await
    }

    async fn run(&mut self, payload: &str, filter_list_ok: bool) -> Result<Vec<ResponseLine>> {
        if self.destroyed {
            return Err(ClientError::NotConnected);
        }
        self.executing = true;
        let result = self.drain(payload, filter_list_ok).await;
        // Not reached when the future is dropped mid-response; the flag then
        // stays set and the pool discards the connection on release.
        self.executing = false;
        if let Err(err) = &result {
            // An ACK is a complete response; anything else leaves the stream
            // in an unknown state.
            if !matches!(err, ClientError::Ack(_)) {
                self.destroyed = true;
            }
        }
        result
    }

    async fn drain(&mut self, payload: &str, filter_list_ok: bool) -> Result<Vec<ResponseLine>> {
        self.send_line(payload).await?;

        let mut decoder = FrameDecoder::new();
        let mut lines = Vec::new();
        loop {
            if !self.buffer.is_empty() {
                let chunk = self.buffer.split();
                for event in decoder.feed(&chunk)? {
                    match event {
                        DecoderEvent::Line(line) => {
                            let is_separator =
                                filter_list_ok && line.binary.is_none() && line.raw == LIST_OK;
                            if !is_separator {
                                lines.push(line);
                            }
                        }
                        DecoderEvent::Completed => return Ok(lines),
                        DecoderEvent::Error(ack) => return Err(ack.into()),
                    }
                }
            }
            let read = self.stream.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(if decoder.saw_line() {
                    ClientError::Interrupted
                } else {
                    ClientError::ClosedByServer
                });
            }
        }
    }

    /// Close the connection. Safe to call more than once.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.stream.shutdown().await?;
        debug!(id = self.id, "disconnected");
        Ok(())
    }
}
