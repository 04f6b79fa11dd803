//! `corvid web` — Interactive-callback webhook server.

use std::sync::Arc;

use corvid_gateway::AppState;
use corvid_gateway::signature::SignatureVerifier;
use corvid_routers::CallbackRouter;

use super::Runtime;
use crate::{RuntimeOpts, WebOpts};

pub async fn run(runtime: RuntimeOpts, web: WebOpts) -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::build(&runtime).await?;
    let state = build_state(&rt, &web.signing_secret);
    corvid_gateway::serve(&web.addr, state).await?;
    Ok(())
}

pub(super) fn build_state(rt: &Runtime, signing_secret: &str) -> Arc<AppState> {
    let callbacks = Arc::new(CallbackRouter::new(
        rt.engine.clone(),
        rt.store.clone(),
        rt.modules.clone(),
        rt.locks.clone(),
    ));
    Arc::new(AppState {
        callbacks,
        verifier: SignatureVerifier::new(signing_secret),
    })
}
