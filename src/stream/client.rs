//! Upstream connections: the live sample stream over HTTP and a fixture
//! replay used by tests and demos.
//!
//! Both feed a bounded channel from a spawned reader task. Closing a
//! [`Connection`] (through any clone of its [`Closer`]) ends the reader and
//! makes [`Connection::next`] return `None` without draining what is buffered.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::message::{decode_line, StreamMessage};
use super::oauth::OAuthSigner;
use crate::config::Credentials;
use crate::error::StreamError;

pub const SAMPLE_STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/sample.json";

const CHANNEL_CAPACITY: usize = 256;

/// Longest line buffered while waiting for its newline. Statuses are a few
/// KiB; anything past this is dropped rather than accumulated.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Opens streaming connections.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn open(&self, keys: &Credentials) -> Result<Connection>;
}

/// Cloneable close switch for a connection. Closing is idempotent.
#[derive(Clone, Debug)]
pub struct Closer {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

impl Closer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `close` has been called.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// An open stream: messages in arrival order until closed or exhausted.
#[derive(Debug)]
pub struct Connection {
    messages: mpsc::Receiver<StreamMessage>,
    closer: Closer,
}

impl Connection {
    pub fn new(messages: mpsc::Receiver<StreamMessage>, closer: Closer) -> Self {
        Self { messages, closer }
    }

    pub fn closer(&self) -> Closer {
        self.closer.clone()
    }

    pub fn close(&mut self) {
        self.closer.close();
        self.messages.close();
    }

    /// Next message, or `None` once the connection is closed or the
    /// producer has gone away.
    pub async fn next(&mut self) -> Option<StreamMessage> {
        if self.closer.is_closed() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.closer.closed() => None,
            msg = self.messages.recv() => msg,
        }
    }
}

/// OAuth-signed client for the public sample endpoint. No query parameters
/// are sent, so the feed is the unfiltered random sample.
#[derive(Clone)]
pub struct SampleStreamClient {
    url: String,
    client: reqwest::Client,
}

impl SampleStreamClient {
    pub fn new() -> Result<Self, StreamError> {
        Self::with_url(SAMPLE_STREAM_URL)
    }

    /// Fails only when the TLS backend can't be initialised.
    pub fn with_url(url: impl Into<String>) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Upstream for SampleStreamClient {
    async fn open(&self, keys: &Credentials) -> Result<Connection> {
        let auth = OAuthSigner::new(keys).sign("GET", &self.url, &[])?;

        info!(url = %self.url, "Connecting to sample stream");
        let resp = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(StreamError::from)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(StreamError::Api { status, message }.into());
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let closer = Closer::new();
        tokio::spawn(read_body(resp, tx, closer.clone()));
        Ok(Connection::new(rx, closer))
    }
}

/// Pump the response body into the channel until EOF, a transport error or
/// close. Dropping the response tears down the HTTP connection.
async fn read_body(resp: reqwest::Response, tx: mpsc::Sender<StreamMessage>, closer: Closer) {
    let mut body = Box::pin(resp.bytes_stream());
    let mut lines = LineBuffer::default();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = closer.closed() => {
                debug!("sample stream closed");
                return;
            }
            chunk = body.next() => chunk,
        };

        let bytes: Bytes = match chunk {
            Some(Ok(b)) => b,
            Some(Err(e)) => {
                warn!(error = %e, "sample stream read failed");
                return;
            }
            None => {
                info!("sample stream ended by upstream");
                return;
            }
        };

        for line in lines.push(&bytes) {
            if !forward(&line, &tx, &closer).await {
                return;
            }
        }
    }
}

/// Decode and send one line. `false` means the reader should stop.
async fn forward(line: &str, tx: &mpsc::Sender<StreamMessage>, closer: &Closer) -> bool {
    let msg = match decode_line(line) {
        None => return true,
        Some(Ok(m)) => m,
        Some(Err(e)) => {
            warn!(error = %e, "undecodable stream line");
            return true;
        }
    };

    tokio::select! {
        biased;
        _ = closer.closed() => false,
        sent = tx.send(msg) => sent.is_ok(),
    }
}

/// Splits a chunked body into `\n`-terminated lines. A line longer than
/// `limit` is discarded up to and including its newline.
struct LineBuffer {
    buf: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            discarding: false,
        }
    }

    fn push(&mut self, mut chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    chunk = &chunk[pos + 1..];
                    self.discarding = false;
                }
                None => return out,
            }
        }

        self.buf.extend_from_slice(chunk);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if pos > self.limit {
                warn!(bytes = pos, limit = self.limit, "oversized stream line dropped");
                continue;
            }
            out.push(String::from_utf8_lossy(&line).into_owned());
        }

        if self.buf.len() > self.limit {
            warn!(
                bytes = self.buf.len(),
                limit = self.limit,
                "oversized stream line dropped"
            );
            self.buf.clear();
            self.discarding = true;
        }
        out
    }
}

/// Replays newline-delimited JSON as if it came off the wire.
pub struct FixtureUpstream {
    content: String,
    hold_open: bool,
}

impl FixtureUpstream {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            content: s.to_string(),
            hold_open: false,
        }
    }

    /// Keep the connection open after the last line until it is closed,
    /// like a live stream with nothing new to say.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

#[async_trait]
impl Upstream for FixtureUpstream {
    async fn open(&self, _keys: &Credentials) -> Result<Connection> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let closer = Closer::new();
        let lines: Vec<String> = self.content.lines().map(str::to_string).collect();
        let hold_open = self.hold_open;
        let c = closer.clone();

        tokio::spawn(async move {
            for line in &lines {
                if !forward(line, &tx, &c).await {
                    return;
                }
            }
            if hold_open {
                c.closed().await;
            }
        });

        Ok(Connection::new(rx, closer))
    }
}
