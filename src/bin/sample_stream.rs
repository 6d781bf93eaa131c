//! Demo host: streams the public sample as JSON lines on stdout until Ctrl-C.
//!
//! Credentials come from the environment (or `.env`): either
//! `TWITTER_KEY_FILE`, or all of `TWITTER_CONSUMER_KEY`,
//! `TWITTER_CONSUMER_SECRET`, `TWITTER_ACCESS_TOKEN` and
//! `TWITTER_ACCESS_TOKEN_SECRET`.

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use twitter_public_stream::config::params_from_env;
use twitter_public_stream::{
    register, Context, IoParams, Source, SourceRegistry, Tuple, Writer, SOURCE_TYPE,
};

/// Logs go to stderr so stdout stays a clean JSON-lines feed.
/// `SAMPLE_STREAM_LOG=json` switches to structured JSON logs.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("twitter_public_stream=info,warn"));
    let json = std::env::var("SAMPLE_STREAM_LOG")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

struct JsonLinesWriter;

#[async_trait]
impl Writer for JsonLinesWriter {
    async fn write(&self, _ctx: &Context, t: Tuple) -> Result<()> {
        let line = serde_json::json!({
            "timestamp": t.timestamp.to_rfc3339(),
            "data": t.data,
        });
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut registry = SourceRegistry::new();
    register(&mut registry)?;

    let ctx = Context::new("sample-stream-demo");
    let io = IoParams::new(SOURCE_TYPE, "tweets");
    let source: Arc<dyn Source> =
        Arc::from(registry.create(&ctx, &io, &params_from_env())?);

    let stopper = {
        let source = Arc::clone(&source);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping");
                if let Err(e) = source.stop(&ctx).await {
                    warn!(error = ?e, "stop failed");
                }
            }
        })
    };

    let res = source.generate_stream(&ctx, &JsonLinesWriter).await;
    stopper.abort();
    res
}
