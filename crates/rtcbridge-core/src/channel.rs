// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message-channel envelope exchanged with the application framework.
//
// Arguments and results are carried as `serde_json::Value`, which covers the
// framework codec's value space (null, bool, int, string, byte list, map).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::types::CallResult;

/// An incoming method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Look up a named argument in a map-shaped argument list.
    ///
    /// Missing keys and explicit nulls both yield `Ok(None)`; a value of the
    /// wrong shape is a marshalling error.
    pub fn argument<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| BridgeError::Marshal(format!("argument `{key}`: {e}"))),
        }
    }

    /// Interpret the whole argument list as a single value.
    pub fn arguments<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.arguments {
            Value::Null => Ok(None),
            value => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| BridgeError::Marshal(format!("arguments: {e}"))),
        }
    }
}

/// Reply to a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        Self::error(err.response_code(), err.response_message())
    }

    /// Map a dispatcher outcome onto the channel reply convention:
    /// `null` for an empty result, the text payload, or the positive code.
    pub fn from_call(outcome: Result<CallResult>) -> Self {
        match outcome {
            Ok(CallResult::Empty) => Self::success(Value::Null),
            Ok(CallResult::Text(text)) => Self::success(text),
            Ok(CallResult::Code(code)) => Self::success(code),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_argument_lookup() {
        let call = MethodCall::new("callApi", json!({ "apiType": 4, "params": null }));
        assert_eq!(call.argument::<i32>("apiType").unwrap(), Some(4));
        assert_eq!(call.argument::<String>("params").unwrap(), None);
        assert_eq!(call.argument::<String>("missing").unwrap(), None);
    }

    #[test]
    fn mistyped_argument_is_marshal_error() {
        let call = MethodCall::new("callApi", json!({ "apiType": "four" }));
        let err = call.argument::<i32>("apiType").unwrap_err();
        assert!(matches!(err, BridgeError::Marshal(_)));
    }

    #[test]
    fn call_results_map_to_channel_values() {
        assert_eq!(
            MethodResponse::from_call(Ok(CallResult::Empty)),
            MethodResponse::success(Value::Null)
        );
        assert_eq!(
            MethodResponse::from_call(Ok(CallResult::Text("{\"a\":1}".into()))),
            MethodResponse::success("{\"a\":1}")
        );
        assert_eq!(
            MethodResponse::from_call(Ok(CallResult::Code(3))),
            MethodResponse::success(3)
        );
    }

    #[test]
    fn native_failure_maps_to_error_reply() {
        let reply = MethodResponse::from_call(Err(BridgeError::Native {
            code: -2,
            description: "invalid argument".into(),
        }));
        assert_eq!(reply, MethodResponse::error("-2", "invalid argument"));
        assert!(!reply.is_success());
    }

    #[test]
    fn response_serializes_with_status_tag() {
        let json = serde_json::to_value(MethodResponse::NotImplemented).unwrap();
        assert_eq!(json, json!({ "status": "notImplemented" }));
    }
}
