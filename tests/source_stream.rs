// tests/source_stream.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use twitter_public_stream::config::Credentials;
use twitter_public_stream::stream::client::{Connection, FixtureUpstream, Upstream};
use twitter_public_stream::{
    register, Context, IoParams, PublicStreamSource, Source, SourceRegistry, Tuple, Writer,
    SOURCE_TYPE,
};

/// Collects tuples; optionally fails the N-th write (1-based).
#[derive(Default)]
struct CollectWriter {
    tuples: Mutex<Vec<Tuple>>,
    attempts: AtomicUsize,
    fail_on: Option<usize>,
}

#[derive(Debug, PartialEq)]
struct SinkFull(usize);

impl std::fmt::Display for SinkFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sink full at write {}", self.0)
    }
}

impl std::error::Error for SinkFull {}

#[async_trait]
impl Writer for CollectWriter {
    async fn write(&self, _ctx: &Context, t: Tuple) -> Result<()> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(SinkFull(n).into());
        }
        self.tuples.lock().push(t);
        Ok(())
    }
}

/// Counts opens and delegates to a fixture.
struct CountingUpstream {
    inner: FixtureUpstream,
    opens: AtomicUsize,
}

impl CountingUpstream {
    fn new(inner: FixtureUpstream) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Upstream for CountingUpstream {
    async fn open(&self, keys: &Credentials) -> Result<Connection> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(keys).await
    }
}

struct FailingUpstream;

#[async_trait]
impl Upstream for FailingUpstream {
    async fn open(&self, _keys: &Credentials) -> Result<Connection> {
        Err(anyhow!("connection refused"))
    }
}

fn fixture() -> String {
    std::fs::read_to_string("tests/fixtures/sample_stream.jsonl")
        .expect("missing tests/fixtures/sample_stream.jsonl")
}

fn source_with(upstream: Arc<dyn Upstream>) -> PublicStreamSource {
    PublicStreamSource::new(
        IoParams::new(SOURCE_TYPE, "tweets"),
        Credentials::default(),
        upstream,
    )
}

#[tokio::test]
async fn only_tweets_reach_the_sink_in_order() {
    let src = source_with(Arc::new(FixtureUpstream::from_fixture_str(&fixture())));
    let w = CollectWriter::default();

    src.generate_stream(&Context::default(), &w).await.unwrap();

    let tuples = w.tuples.lock();
    let texts: Vec<&str> = tuples
        .iter()
        .map(|t| t.data["text"].as_str().unwrap())
        .collect();
    // delete/limit/warning are skipped, the tweet with a broken created_at is dropped
    assert_eq!(
        texts,
        vec![
            "first sampled tweet",
            "RT @alice: first sampled tweet",
            "third sampled tweet",
        ]
    );

    let stamps: Vec<_> = tuples.iter().map(|t| t.timestamp).collect();
    assert_eq!(
        stamps,
        vec![
            Utc.with_ymd_and_hms(2018, 3, 5, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 3, 5, 10, 30, 15).unwrap(),
            Utc.with_ymd_and_hms(2018, 3, 5, 10, 31, 0).unwrap(),
        ]
    );

    assert_eq!(tuples[0].data["user"]["screen_name"], json!("alice"));
    assert_eq!(tuples[1].data["retweeted_status"]["user"]["screen_name"], json!("alice"));
    assert_eq!(tuples[2].data["coordinates"]["coordinates"], json!([139.69, 35.69]));
    assert!(src.is_stopped());
}

#[tokio::test]
async fn sink_failure_is_returned_and_stops_the_loop() {
    let src = source_with(Arc::new(FixtureUpstream::from_fixture_str(&fixture()).hold_open()));
    let w = CollectWriter {
        fail_on: Some(2),
        ..CollectWriter::default()
    };

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        src.generate_stream(&Context::default(), &w),
    )
    .await
    .expect("generate_stream should return on sink failure")
    .unwrap_err();

    assert_eq!(err.downcast_ref::<SinkFull>(), Some(&SinkFull(2)));
    assert_eq!(w.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(w.tuples.lock().len(), 1);
    assert!(src.is_stopped());
}

#[tokio::test]
async fn stop_before_start_is_harmless() {
    let up = Arc::new(CountingUpstream::new(FixtureUpstream::from_fixture_str(&fixture())));
    let src = source_with(up.clone());
    let ctx = Context::default();

    src.stop(&ctx).await.unwrap();
    src.stop(&ctx).await.unwrap();

    let w = CollectWriter::default();
    src.generate_stream(&ctx, &w).await.unwrap();
    assert_eq!(up.opens.load(Ordering::SeqCst), 0);
    assert!(w.tuples.lock().is_empty());
}

#[tokio::test]
async fn concurrent_stop_unblocks_generate_stream() {
    let src = Arc::new(source_with(Arc::new(
        FixtureUpstream::from_fixture_str(&fixture()).hold_open(),
    )));
    let w = Arc::new(CollectWriter::default());

    let running = {
        let src = Arc::clone(&src);
        let w = Arc::clone(&w);
        tokio::spawn(async move { src.generate_stream(&Context::default(), w.as_ref()).await })
    };

    // wait until the fixture has been drained and the loop is blocked
    tokio::time::timeout(Duration::from_secs(5), async {
        while w.tuples.lock().len() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("tuples should arrive");
    assert!(!running.is_finished());

    src.stop(&Context::default()).await.unwrap();
    let res = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("generate_stream should return after stop")
        .unwrap();
    assert!(res.is_ok());
    assert!(src.is_stopped());

    // idempotent once stopped
    src.stop(&Context::default()).await.unwrap();
}

#[tokio::test]
async fn open_failure_is_returned() {
    let src = source_with(Arc::new(FailingUpstream));
    let w = CollectWriter::default();
    let err = src
        .generate_stream(&Context::default(), &w)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn registry_creates_the_public_stream_source() {
    let mut reg = SourceRegistry::new();
    register(&mut reg).unwrap();

    let params = json!({
        "consumer_key": "abc",
        "consumer_secret": "def",
        "access_token": "ghi",
        "access_token_secret": "jkl",
    })
    .as_object()
    .cloned()
    .unwrap();
    let io = IoParams::new("twitter_public_stream", "tweets");
    let src = reg.create(&Context::default(), &io, &params).unwrap();

    // never started: stop is a no-op
    src.stop(&Context::default()).await.unwrap();
}
