//! Scripted mock MPD server for monitor tests.

#![allow(dead_code)]

use std::time::Duration;

use mpd_client::MpdConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

pub const GREETING: &[u8] = b"OK MPD 0.23.5\n";

/// Install a log subscriber for test debugging. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// Config with short timeouts so reconnect tests run quickly.
pub fn test_config(port: u16) -> MpdConfig {
    MpdConfig::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_handshake_timeout(Duration::from_millis(500))
        .with_reconnect_delay(Duration::from_millis(10))
}

pub struct ServerConn {
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

impl ServerConn {
    pub async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.expect("accept");
        let (read, writer) = stream.into_split();
        let mut conn = Self {
            reader: BufReader::new(read),
            writer,
        };
        conn.writer.write_all(GREETING).await.expect("send greeting");
        conn
    }

    pub async fn read_command(&mut self) -> String {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await.expect("read command");
        assert!(read > 0, "client closed the connection");
        line.trim_end().to_string()
    }

    pub async fn respond(&mut self, response: &str) {
        self.writer
            .write_all(response.as_bytes())
            .await
            .expect("send response");
    }

    /// Read commands until `noidle` arrives, tolerating re-issued `idle`,
    /// then acknowledge it.
    pub async fn answer_noidle(&mut self) {
        loop {
            match self.read_command().await.as_str() {
                "noidle" => break,
                "idle" => continue,
                other => panic!("unexpected command while idling: {other}"),
            }
        }
        self.respond("OK\n").await;
    }

    pub async fn wait_for_close(&mut self) {
        let mut line = String::new();
        while self.reader.read_line(&mut line).await.unwrap_or(0) > 0 {
            line.clear();
        }
    }
}
