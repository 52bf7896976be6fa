// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON-lines session: one request per input line, one output record per
// reply or relayed event.
//
// Requests:  {"type":"call","method":"callApi","arguments":{...}}
//            {"type":"listen"}   {"type":"cancel"}
// Output:    {"type":"response","response":{...}}
//            {"type":"event","event":{...}}
//            {"type":"listening","subscription":"..."}  {"type":"cancelled"}
//            {"type":"failed","message":"..."}
//
// All output goes through one writer task, so replies and events never
// interleave mid-line.

use std::sync::Arc;

use rtcbridge_core::channel::{MethodCall, MethodResponse};
use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::EngineEvent;
use rtcbridge_dispatch::{EventSink, RtcEnginePlugin};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum HostRequest {
    Call {
        method: String,
        #[serde(default)]
        arguments: Value,
    },
    Listen,
    Cancel,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum HostOutput {
    Response { response: MethodResponse },
    Event { event: EngineEvent },
    Listening { subscription: String },
    Cancelled,
    Failed { message: String },
}

fn encode(output: &HostOutput) -> Result<String> {
    Ok(serde_json::to_string(output)?)
}

/// Event sink writing each event as an output line.
struct LineSink {
    lines: UnboundedSender<String>,
}

impl EventSink for LineSink {
    fn success(&self, event: EngineEvent) {
        match encode(&HostOutput::Event { event }) {
            Ok(line) => {
                if self.lines.send(line).is_err() {
                    debug!("output closed; event dropped");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode event"),
        }
    }
}

async fn handle(
    plugin: &Arc<RtcEnginePlugin>,
    request: HostRequest,
    lines: &UnboundedSender<String>,
) -> HostOutput {
    match request {
        HostRequest::Call { method, arguments } => {
            let call = MethodCall::new(method, arguments);
            let plugin = Arc::clone(plugin);
            // Native calls block until the engine returns.
            let response = tokio::task::spawn_blocking(move || plugin.on_method_call(&call))
                .await
                .unwrap_or_else(|e| MethodResponse::error("", format!("call task failed: {e}")));
            HostOutput::Response { response }
        }
        HostRequest::Listen => {
            let sink = Arc::new(LineSink {
                lines: lines.clone(),
            });
            match plugin.on_listen(sink) {
                Ok(id) => HostOutput::Listening {
                    subscription: id.to_string(),
                },
                Err(e) => HostOutput::Failed {
                    message: e.to_string(),
                },
            }
        }
        HostRequest::Cancel => match plugin.on_cancel() {
            Ok(()) => HostOutput::Cancelled,
            Err(e) => HostOutput::Failed {
                message: e.to_string(),
            },
        },
    }
}

/// Serve requests from `input` until EOF. Returns the output once every
/// pending line has been written.
pub async fn run<R, W>(plugin: Arc<RtcEnginePlugin>, input: R, output: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (lines_tx, mut lines_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(line) = lines_rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<W, std::io::Error>(output)
    });

    let mut input = input.lines();
    while let Some(line) = input.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<HostRequest>(&line) {
            Ok(request) => handle(&plugin, request, &lines_tx).await,
            Err(e) => HostOutput::Failed {
                message: format!("invalid request: {e}"),
            },
        };
        if lines_tx.send(encode(&reply)?).is_err() {
            warn!("output writer stopped early");
            break;
        }
    }

    // Drop the event sink's sender so the writer can drain and finish.
    if let Err(e) = plugin.on_cancel() {
        warn!(error = %e, "event cancel at end of input failed");
    }
    drop(lines_tx);

    let output = writer
        .await
        .map_err(|e| BridgeError::Bridge(format!("output writer task: {e}")))??;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcbridge_core::BridgeConfig;
    use rtcbridge_native::recording::RecordingEndpoint;
    use tokio::runtime::Handle;

    fn output_lines(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn serves_calls_and_reports_bad_lines() {
        let config = BridgeConfig::default();
        let endpoint = Arc::new(RecordingEndpoint::new(config.protocol.clone()));
        endpoint.script(9, 0, r#"{"ok":true}"#);
        let plugin =
            Arc::new(RtcEnginePlugin::attach(endpoint.clone(), config, Handle::current()).unwrap());

        let input = concat!(
            r#"{"type":"call","method":"callApi","arguments":{"apiType":9,"params":"{}"}}"#,
            "\n",
            "\n",
            "not json\n",
            r#"{"type":"listen"}"#,
            "\n",
            r#"{"type":"cancel"}"#,
            "\n",
        );

        let output = run(plugin, input.as_bytes(), Vec::new()).await.unwrap();
        let lines = output_lines(output);
        assert_eq!(lines.len(), 4);

        assert_eq!(lines[0]["type"], "response");
        assert_eq!(lines[0]["response"]["status"], "success");
        assert_eq!(lines[0]["response"]["result"], r#"{"ok":true}"#);

        assert_eq!(lines[1]["type"], "failed");
        assert!(lines[1]["message"].as_str().unwrap().starts_with("invalid request"));

        assert_eq!(lines[2]["type"], "listening");
        assert!(lines[2]["subscription"].is_string());
        assert_eq!(lines[3]["type"], "cancelled");
    }

    #[cfg(not(target_os = "android"))]
    #[tokio::test]
    async fn stub_platform_reports_described_errors() {
        let config = BridgeConfig::default();
        let endpoint = rtcbridge_native::native_endpoint(&config.protocol).unwrap();
        let plugin = Arc::new(RtcEnginePlugin::attach(endpoint, config, Handle::current()).unwrap());

        let input = concat!(
            r#"{"type":"call","method":"callApi","arguments":{"apiType":0,"params":"{}"}}"#,
            "\n",
        );
        let output = run(Arc::clone(&plugin), input.as_bytes(), Vec::new())
            .await
            .unwrap();
        let lines = output_lines(output);

        assert_eq!(lines[0]["response"]["status"], "error");
        assert_eq!(lines[0]["response"]["code"], "-4");
        assert_eq!(
            lines[0]["response"]["message"],
            "native engine not available on this platform"
        );
        assert_eq!(plugin.registry().current(), None);
    }
}
