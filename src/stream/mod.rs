// src/stream/mod.rs
pub mod client;
pub mod message;
pub mod oauth;
pub mod tweet;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::{resolve, Credentials};
use crate::host::{Context, IoParams, Params, Source, Tuple, Writer, NODE_TYPE_SOURCE};
use client::{Closer, Connection, SampleStreamClient, Upstream};
use message::StreamMessage;
use tweet::Tweet;

/// Name the source is registered under.
pub const SOURCE_TYPE: &str = "twitter_public_stream";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "twitter_stream_messages_total",
            "Messages received on the sample stream, by kind."
        );
        describe_counter!(
            "twitter_stream_tuples_total",
            "Tweets written downstream as tuples."
        );
        describe_counter!(
            "twitter_stream_dropped_total",
            "Tweets dropped before reaching the sink, by reason."
        );
    });
}

enum State {
    Created,
    Streaming(Closer),
    Stopped,
}

/// Source emitting every tweet of the public sample stream as a tuple whose
/// timestamp is the tweet's creation time.
pub struct PublicStreamSource {
    io_params: IoParams,
    keys: Credentials,
    upstream: Arc<dyn Upstream>,
    state: Mutex<State>,
}

impl PublicStreamSource {
    pub fn new(io_params: IoParams, keys: Credentials, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            io_params,
            keys,
            upstream,
            state: Mutex::new(State::Created),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.keys
    }

    pub fn is_stopped(&self) -> bool {
        matches!(*self.state.lock(), State::Stopped)
    }

    async fn pump(&self, ctx: &Context, conn: &mut Connection, w: &dyn Writer) -> Result<()> {
        while let Some(msg) = conn.next().await {
            counter!("twitter_stream_messages_total", "kind" => msg.kind()).increment(1);

            let tweet = match msg {
                StreamMessage::Tweet(t) => t,
                other => {
                    debug!(kind = other.kind(), "skipping non-tweet message");
                    continue;
                }
            };

            let Some(tuple) = self.to_tuple(&tweet) else {
                continue;
            };
            w.write(ctx, tuple).await?;
            counter!("twitter_stream_tuples_total").increment(1);
        }
        Ok(())
    }

    /// `None` when the tweet has to be dropped; the reason is logged.
    fn to_tuple(&self, tweet: &Tweet) -> Option<Tuple> {
        let created_at = match tweet.created_at_time() {
            Ok(t) => t,
            Err(e) => {
                error!(
                    error = %e,
                    node_type = NODE_TYPE_SOURCE,
                    node_name = %self.io_params.name,
                    created_at = %tweet.created_at,
                    "Cannot parse created at"
                );
                counter!("twitter_stream_dropped_total", "reason" => "created_at").increment(1);
                return None;
            }
        };

        let data = match tweet.to_record() {
            Ok(m) => m,
            Err(e) => {
                error!(
                    error = %e,
                    node_type = NODE_TYPE_SOURCE,
                    node_name = %self.io_params.name,
                    tweet_id = tweet.id,
                    "Cannot convert a tweet to a record"
                );
                counter!("twitter_stream_dropped_total", "reason" => "convert").increment(1);
                return None;
            }
        };

        let mut t = Tuple::new(data);
        t.timestamp = created_at;
        Some(t)
    }
}

#[async_trait]
impl Source for PublicStreamSource {
    async fn generate_stream(&self, ctx: &Context, w: &dyn Writer) -> Result<()> {
        ensure_metrics_described();
        if self.is_stopped() {
            debug!(node_name = %self.io_params.name, "source already stopped");
            return Ok(());
        }

        let mut conn = self.upstream.open(&self.keys).await?;
        {
            let mut state = self.state.lock();
            if matches!(*state, State::Stopped) {
                conn.close();
                return Ok(());
            }
            *state = State::Streaming(conn.closer());
        }

        info!(
            node_type = NODE_TYPE_SOURCE,
            node_name = %self.io_params.name,
            topology = %ctx.topology,
            "public sample stream started"
        );
        let res = self.pump(ctx, &mut conn, w).await;
        conn.close();
        *self.state.lock() = State::Stopped;

        info!(
            node_type = NODE_TYPE_SOURCE,
            node_name = %self.io_params.name,
            ok = res.is_ok(),
            "public sample stream finished"
        );
        res
    }

    async fn stop(&self, _ctx: &Context) -> Result<()> {
        let prev = std::mem::replace(&mut *self.state.lock(), State::Stopped);
        if let State::Streaming(closer) = prev {
            closer.close();
            info!(node_name = %self.io_params.name, "public sample stream stop requested");
        }
        Ok(())
    }
}

/// Creates a source that receives the public stream from Twitter's sampling
/// API. Credentials come from `key_file` or the four inline parameters.
pub fn create_public_stream_source(
    _ctx: &Context,
    io_params: &IoParams,
    params: &Params,
) -> Result<Box<dyn Source>> {
    let keys = resolve(params)?;
    let client = SampleStreamClient::new()?;
    Ok(Box::new(PublicStreamSource::new(
        io_params.clone(),
        keys,
        Arc::new(client),
    )))
}
