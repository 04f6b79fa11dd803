//! `corvid serve` — Both entry points in one process.
//!
//! Running them together puts the message stream and the webhook handler
//! behind the same per-conversation locks, so concurrent writes to one
//! session are serialized.

use corvid_core::transport::ChatStream;
use corvid_routers::SlackRtmTransport;
use tracing::error;

use super::Runtime;
use crate::{RuntimeOpts, StreamOpts, WebOpts};

pub async fn run(
    runtime: RuntimeOpts,
    stream: StreamOpts,
    web: WebOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::build(&runtime).await?;

    let router = super::start::build_router(&rt, &stream.slack_token);
    let transport = SlackRtmTransport::new(&stream.slack_token);
    let rx = transport.start().await?;
    let stream_task = tokio::spawn(async move { router.run(rx).await });

    let state = super::web::build_state(&rt, &web.signing_secret);
    let result = corvid_gateway::serve(&web.addr, state).await;

    if let Err(e) = &result {
        error!(error = %e, "Webhook server exited");
    }
    stream_task.abort();
    result?;
    Ok(())
}
