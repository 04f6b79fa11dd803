//! `corvid start` — Real-time message bot.

use std::sync::Arc;

use corvid_core::transport::ChatStream;
use corvid_routers::{SlackApiSink, SlackRtmTransport, StreamRouter};

use super::Runtime;
use crate::{RuntimeOpts, StreamOpts};

pub async fn run(runtime: RuntimeOpts, stream: StreamOpts) -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::build(&runtime).await?;
    let router = build_router(&rt, &stream.slack_token);

    let transport = SlackRtmTransport::new(&stream.slack_token);
    let rx = transport.start().await?;
    router.run(rx).await;
    Ok(())
}

pub(super) fn build_router(rt: &Runtime, slack_token: &str) -> StreamRouter {
    StreamRouter::new(
        rt.engine.clone(),
        rt.store.clone(),
        Arc::new(SlackApiSink::new(slack_token)),
        rt.modules.clone(),
        rt.locks.clone(),
    )
}
