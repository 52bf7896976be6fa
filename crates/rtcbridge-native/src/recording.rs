// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-process endpoint used by tests and benchmarks.
//
// Records every call it receives, answers with per-opcode scripted return
// codes, serves descriptions on the diagnostic opcode, and can emit events
// from any thread to mimic native callbacks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rtcbridge_core::config::ProtocolConfig;
use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::{ApiType, EngineHandle, ErrorDescriptionParams};

use crate::traits::*;

/// Handle value reported by `native_handle`.
pub const RECORDING_NATIVE_HANDLE: i64 = 0x7f00_1000;

/// One call observed by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub api_type: ApiType,
    pub params: Option<String>,
    /// `Some` when the buffer-accepting entry point was used.
    pub buffer: Option<Vec<u8>>,
}

enum Scripted {
    Return { code: i32, text: String },
    MarshalFailure(String),
}

#[derive(Default)]
struct State {
    calls: Vec<RecordedCall>,
    scripts: HashMap<ApiType, Scripted>,
    descriptions: HashMap<u32, String>,
    handler: Option<Arc<dyn NativeEventHandler>>,
    handler_failure: Option<String>,
    engine_live: bool,
    destroyed: bool,
}

/// Scripted endpoint. Unscripted opcodes return 0 with an empty buffer.
pub struct RecordingEndpoint {
    protocol: ProtocolConfig,
    state: Mutex<State>,
}

impl RecordingEndpoint {
    pub fn new(protocol: ProtocolConfig) -> Self {
        Self {
            protocol,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `api_type` return `code`, writing `text` into the result buffer.
    pub fn script(&self, api_type: impl Into<ApiType>, code: i32, text: impl Into<String>) {
        self.state().scripts.insert(
            api_type.into(),
            Scripted::Return {
                code,
                text: text.into(),
            },
        );
    }

    /// Make `api_type` fail before reaching the engine.
    pub fn script_marshal_failure(&self, api_type: impl Into<ApiType>, message: impl Into<String>) {
        self.state()
            .scripts
            .insert(api_type.into(), Scripted::MarshalFailure(message.into()));
    }

    /// Description served by the diagnostic opcode for an absolute code.
    pub fn describe(&self, code: u32, description: impl Into<String>) {
        self.state().descriptions.insert(code, description.into());
    }

    /// Make every later attempt to install an event handler fail.
    /// Removing the handler still succeeds.
    pub fn fail_handler_install(&self, message: impl Into<String>) {
        self.state().handler_failure = Some(message.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn has_event_handler(&self) -> bool {
        self.state().handler.is_some()
    }

    /// The handler as currently installed, for simulating a native callback
    /// that was already in flight when the handler was replaced.
    pub fn event_handler(&self) -> Option<Arc<dyn NativeEventHandler>> {
        self.state().handler.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Deliver an event to the installed handler, as the engine would from
    /// its own callback thread. Returns false when no handler is installed.
    pub fn emit(&self, event: &str, data: Option<&str>, buffer: Option<&[u8]>) -> bool {
        let handler = self.state().handler.clone();
        match handler {
            Some(handler) => {
                handler.on_event(event, data, buffer);
                true
            }
            None => false,
        }
    }

    fn record(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        buffer: Option<&[u8]>,
        result: &mut String,
    ) -> Result<i32> {
        let mut state = self.state();
        if state.destroyed {
            return Err(BridgeError::Bridge("recording endpoint destroyed".into()));
        }
        state.calls.push(RecordedCall {
            api_type,
            params: params.map(str::to_owned),
            buffer: buffer.map(<[u8]>::to_vec),
        });

        if api_type == self.protocol.error_description {
            let code = params
                .and_then(|p| serde_json::from_str::<ErrorDescriptionParams>(p).ok())
                .map(|p| p.code);
            if let Some(text) = code.and_then(|c| state.descriptions.get(&c)) {
                result.push_str(text);
            }
            return Ok(0);
        }

        let ret = match state.scripts.get(&api_type) {
            Some(Scripted::Return { code, text }) => {
                result.push_str(text);
                *code
            }
            Some(Scripted::MarshalFailure(message)) => {
                return Err(BridgeError::Marshal(message.clone()));
            }
            None => 0,
        };

        if api_type == self.protocol.create_engine && ret >= 0 {
            state.engine_live = true;
        } else if api_type == self.protocol.destroy_engine {
            state.engine_live = false;
        }
        Ok(ret)
    }
}

impl NativeEndpoint for RecordingEndpoint {
    fn platform_name(&self) -> &str {
        "Recording"
    }

    fn call_api(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        result: &mut String,
    ) -> Result<i32> {
        self.record(api_type, params, None, result)
    }

    fn call_api_with_buffer(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        buffer: &[u8],
        result: &mut String,
    ) -> Result<i32> {
        self.record(api_type, params, Some(buffer), result)
    }

    fn set_event_handler(&self, handler: Option<Arc<dyn NativeEventHandler>>) -> Result<()> {
        let mut state = self.state();
        if let (Some(_), Some(message)) = (&handler, &state.handler_failure) {
            return Err(BridgeError::Bridge(message.clone()));
        }
        state.handler = handler;
        Ok(())
    }

    fn engine_handle(&self) -> Option<EngineHandle> {
        let state = self.state();
        (state.engine_live && !state.destroyed).then(|| EngineHandle::new(RECORDING_NATIVE_HANDLE))
    }

    fn native_handle(&self) -> Result<i64> {
        Ok(RECORDING_NATIVE_HANDLE)
    }

    fn destroy(&self) -> Result<()> {
        let mut state = self.state();
        state.destroyed = true;
        state.engine_live = false;
        state.handler = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscripted_opcode_succeeds_empty() {
        let ep = RecordingEndpoint::new(ProtocolConfig::default());
        let mut out = String::new();
        assert_eq!(ep.call_api(ApiType(42), Some("{}"), &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert_eq!(
            ep.calls(),
            vec![RecordedCall {
                api_type: ApiType(42),
                params: Some("{}".into()),
                buffer: None,
            }]
        );
    }

    #[test]
    fn create_and_destroy_track_engine() {
        let ep = RecordingEndpoint::new(ProtocolConfig::default());
        let mut out = String::new();
        assert_eq!(ep.engine_handle(), None);
        ep.call_api(ApiType(0), Some("{}"), &mut out).unwrap();
        assert!(ep.engine_handle().is_some());
        ep.call_api(ApiType(1), Some("{}"), &mut out).unwrap();
        assert_eq!(ep.engine_handle(), None);
    }

    #[test]
    fn destroyed_endpoint_rejects_calls() {
        let ep = RecordingEndpoint::new(ProtocolConfig::default());
        ep.destroy().unwrap();
        let mut out = String::new();
        assert!(ep.call_api(ApiType(2), None, &mut out).is_err());
        assert!(ep.is_destroyed());
    }
}
