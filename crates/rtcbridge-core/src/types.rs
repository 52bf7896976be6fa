// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the opcode dispatch protocol.

use serde::{Deserialize, Serialize};

/// Integer opcode selecting which native engine operation to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiType(pub i32);

impl std::fmt::Display for ApiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ApiType {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// One request to the native endpoint.
///
/// The params string is opaque to the bridge (its schema is owned by the
/// native engine). Fields are private so an invocation cannot change after
/// it has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    api_type: ApiType,
    params: Option<String>,
    buffer: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(api_type: impl Into<ApiType>, params: Option<String>) -> Self {
        Self {
            api_type: api_type.into(),
            params,
            buffer: None,
        }
    }

    /// Attach a raw buffer. A present-but-empty buffer still selects the
    /// buffer-accepting native entry point.
    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn api_type(&self) -> ApiType {
        self.api_type
    }

    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }
}

/// Successful outcome of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    /// Return code 0 with an empty result buffer.
    Empty,
    /// Return code 0 with the result buffer's text.
    Text(String),
    /// Positive return code (a count or handle rather than a payload).
    Code(i32),
}

/// Described failure obtained from the diagnostic side channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: i32,
    pub description: String,
}

/// Params of the diagnostic side-channel opcode: `{"code":<abs code>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptionParams {
    pub code: u32,
}

impl ErrorDescriptionParams {
    /// Build the lookup for a (normally negative) return code.
    pub fn for_return_code(ret: i32) -> Self {
        Self {
            code: ret.unsigned_abs(),
        }
    }

    pub fn to_params(self) -> String {
        format!("{{\"code\":{}}}", self.code)
    }
}

/// Identifier of the live native engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineHandle {
    pub native_handle: i64,
}

impl EngineHandle {
    pub fn new(native_handle: i64) -> Self {
        Self { native_handle }
    }
}

impl std::fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine@{:#x}", self.native_handle)
    }
}

/// Asynchronous event emitted by the native engine, as relayed to the
/// event channel subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineEvent {
    pub method_name: String,
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Vec<u8>>,
}

impl EngineEvent {
    pub fn new(method_name: impl Into<String>, data: Option<String>) -> Self {
        Self {
            method_name: method_name.into(),
            data,
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = Some(buffer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_still_present() {
        let inv = Invocation::new(12, Some("{}".into())).with_buffer(Vec::new());
        assert_eq!(inv.buffer(), Some(&[][..]));
        assert_eq!(inv.api_type(), ApiType(12));
    }

    #[test]
    fn event_record_omits_missing_buffer() {
        let ev = EngineEvent::new("onJoinChannelSuccess", Some("{\"uid\":1}".into()));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["methodName"], "onJoinChannelSuccess");
        assert_eq!(json["data"], "{\"uid\":1}");
        assert!(json.get("buffer").is_none());
    }

    #[test]
    fn event_record_carries_buffer() {
        let ev = EngineEvent::new("onStreamMessage", None).with_buffer(vec![1, 2, 3]);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["buffer"], serde_json::json!([1, 2, 3]));
        assert!(json["data"].is_null());
    }

    #[test]
    fn error_description_params_use_absolute_code() {
        let params = ErrorDescriptionParams::for_return_code(-7);
        assert_eq!(params.to_params(), r#"{"code":7}"#);
        let parsed: ErrorDescriptionParams = serde_json::from_str(&params.to_params()).unwrap();
        assert_eq!(parsed, params);
        assert_eq!(ErrorDescriptionParams::for_return_code(i32::MIN).code, 2_147_483_648);
    }

    #[test]
    fn engine_handle_display_is_hex() {
        assert_eq!(EngineHandle::new(255).to_string(), "engine@0xff");
    }
}
