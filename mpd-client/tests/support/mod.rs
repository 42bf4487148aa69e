//! Scripted mock MPD server for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use mpd_client::MpdConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const GREETING: &[u8] = b"OK MPD 0.23.5\n";

/// Install a log subscriber for test debugging. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bind a listener on an ephemeral local port.
pub async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

pub fn test_config(port: u16) -> MpdConfig {
    MpdConfig::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_handshake_timeout(Duration::from_secs(1))
}

/// Server side of one accepted client connection.
pub struct ServerConn {
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

impl ServerConn {
    /// Accept a client and send the standard greeting.
    pub async fn accept(listener: &TcpListener) -> Self {
        let mut conn = Self::accept_silent(listener).await;
        conn.writer.write_all(GREETING).await.expect("send greeting");
        conn
    }

    /// Accept a client without greeting it.
    pub async fn accept_silent(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.expect("accept");
        let (read, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer,
        }
    }

    /// Read one command line from the client, without the newline.
    pub async fn read_command(&mut self) -> String {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await.expect("read command");
        assert!(read > 0, "client closed the connection");
        line.trim_end().to_string()
    }

    pub async fn respond(&mut self, response: &str) {
        self.respond_bytes(response.as_bytes()).await;
    }

    pub async fn respond_bytes(&mut self, response: &[u8]) {
        self.writer.write_all(response).await.expect("send response");
    }

    /// Assert the client sends nothing within the window.
    pub async fn expect_quiet(&mut self, window: Duration) {
        let mut line = String::new();
        let result = tokio::time::timeout(window, self.reader.read_line(&mut line)).await;
        assert!(result.is_err(), "unexpected data from client: {line:?}");
    }

    /// Block until the client closes its end.
    pub async fn wait_for_close(&mut self) {
        let mut line = String::new();
        while self.reader.read_line(&mut line).await.unwrap_or(0) > 0 {
            line.clear();
        }
    }
}

/// Serve one client from a canned script of (expected commands, response)
/// pairs. Multi-line expectations cover command lists.
pub fn spawn_script(
    listener: TcpListener,
    script: Vec<(&'static str, &'static str)>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut conn = ServerConn::accept(&listener).await;
        for (expected, response) in script {
            for line in expected.lines() {
                assert_eq!(conn.read_command().await, line);
            }
            conn.respond(response).await;
        }
        conn.wait_for_close().await;
    })
}
