// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rtcbridge — host harness.
//
// Entry point. Initialises logging, loads the bridge config, attaches the
// plugin to the platform endpoint and serves JSON-lines requests on stdin.
// Logs go to stderr so stdout stays a clean protocol stream.

mod config_file;
mod session;

use std::sync::Arc;

use rtcbridge_core::error::Result;
use rtcbridge_dispatch::RtcEnginePlugin;
use rtcbridge_native::NativeEndpoint;
use tokio::io::BufReader;
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("rtcbridge host starting");

    let config = config_file::load_config()?;
    let endpoint = rtcbridge_native::native_endpoint(&config.protocol)?;
    tracing::info!(platform = endpoint.platform_name(), "native endpoint ready");

    let plugin = Arc::new(RtcEnginePlugin::attach(endpoint, config, Handle::current())?);

    let stdin = BufReader::new(tokio::io::stdin());
    let served = session::run(Arc::clone(&plugin), stdin, tokio::io::stdout()).await;

    // Tear the engine down even when the session ended in error.
    plugin.detach()?;
    served?;

    tracing::info!("rtcbridge host stopped");
    Ok(())
}
