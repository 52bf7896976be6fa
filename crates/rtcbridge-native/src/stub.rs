// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub endpoint for desktop/CI builds where the native engine is unavailable.
//
// Every opcode fails with ERR_NOT_SUPPORTED. The diagnostic opcode still
// answers, so callers see a described error instead of a bare code. The real
// implementation lives in the `android` module.

use std::sync::Arc;

use rtcbridge_core::codes::{self, ERR_NOT_SUPPORTED};
use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::{ApiType, EngineHandle, ErrorDescriptionParams};

use crate::traits::*;

/// No-op endpoint returned on platforms without the native engine.
pub struct StubEndpoint {
    error_description: ApiType,
}

impl StubEndpoint {
    pub fn new(error_description: ApiType) -> Self {
        Self { error_description }
    }

    fn describe(&self, params: Option<&str>, result: &mut String) -> i32 {
        let Some(code) = params
            .and_then(|p| serde_json::from_str::<ErrorDescriptionParams>(p).ok())
            .map(|p| p.code)
        else {
            return -(ERR_NOT_SUPPORTED as i32);
        };
        if code == ERR_NOT_SUPPORTED {
            result.push_str("native engine not available on this platform");
        } else {
            result.push_str(&codes::fallback_description(code));
        }
        0
    }
}

impl NativeEndpoint for StubEndpoint {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn call_api(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        result: &mut String,
    ) -> Result<i32> {
        if api_type == self.error_description {
            return Ok(self.describe(params, result));
        }
        tracing::warn!(%api_type, "NativeEndpoint::call_api called on stub endpoint");
        Ok(-(ERR_NOT_SUPPORTED as i32))
    }

    fn call_api_with_buffer(
        &self,
        api_type: ApiType,
        _params: Option<&str>,
        buffer: &[u8],
        _result: &mut String,
    ) -> Result<i32> {
        tracing::warn!(
            %api_type,
            bytes = buffer.len(),
            "NativeEndpoint::call_api_with_buffer called on stub endpoint"
        );
        Ok(-(ERR_NOT_SUPPORTED as i32))
    }

    fn set_event_handler(&self, handler: Option<Arc<dyn NativeEventHandler>>) -> Result<()> {
        // The stub never emits, so the handler is simply dropped.
        tracing::debug!(installed = handler.is_some(), "stub endpoint event handler");
        Ok(())
    }

    fn engine_handle(&self) -> Option<EngineHandle> {
        None
    }

    fn native_handle(&self) -> Result<i64> {
        Err(BridgeError::PlatformUnavailable)
    }

    fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_is_unsupported() {
        let stub = StubEndpoint::new(ApiType(132));
        let mut out = String::new();
        assert_eq!(stub.call_api(ApiType(0), Some("{}"), &mut out).unwrap(), -4);
        assert_eq!(
            stub.call_api_with_buffer(ApiType(5), None, &[1, 2], &mut out)
                .unwrap(),
            -4
        );
        assert!(out.is_empty());
    }

    #[test]
    fn diagnostic_opcode_describes() {
        let stub = StubEndpoint::new(ApiType(132));
        let mut out = String::new();
        assert_eq!(
            stub.call_api(ApiType(132), Some(r#"{"code":4}"#), &mut out)
                .unwrap(),
            0
        );
        assert!(out.contains("not available"));

        let mut out = String::new();
        stub.call_api(ApiType(132), Some(r#"{"code":7}"#), &mut out)
            .unwrap();
        assert_eq!(out, "ERR_NOT_INITIALIZED");
    }

    #[test]
    fn no_native_handle() {
        let stub = StubEndpoint::new(ApiType(132));
        assert!(matches!(
            stub.native_handle(),
            Err(BridgeError::PlatformUnavailable)
        ));
        assert_eq!(stub.engine_handle(), None);
    }
}
