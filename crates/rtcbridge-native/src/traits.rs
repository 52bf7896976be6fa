// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native engine endpoint.
//
// The engine is addressed purely by integer opcode. Return codes follow the
// engine convention: 0 = success (result buffer may hold a payload),
// positive = success with a numeric result, negative = error code.

use std::sync::Arc;

use rtcbridge_core::error::Result;
use rtcbridge_core::types::{ApiType, EngineHandle};

/// Opaque callable surface of the native engine.
///
/// `Err` from the call methods means the call could not be marshalled
/// (JNI failure, unavailable runtime). Engine-level failures are reported
/// through a negative `Ok` code.
pub trait NativeEndpoint: Send + Sync {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;

    /// Invoke an opcode. The engine appends its textual result to `result`.
    fn call_api(&self, api_type: ApiType, params: Option<&str>, result: &mut String)
    -> Result<i32>;

    /// Invoke an opcode that also takes a raw byte buffer. The buffer is only
    /// borrowed for the duration of the call.
    fn call_api_with_buffer(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        buffer: &[u8],
        result: &mut String,
    ) -> Result<i32>;

    /// Install or remove the receiver of asynchronous engine events.
    fn set_event_handler(&self, handler: Option<Arc<dyn NativeEventHandler>>) -> Result<()>;

    /// The live engine instance, if the create opcode has constructed one.
    fn engine_handle(&self) -> Option<EngineHandle>;

    /// Identifier of the endpoint object itself.
    fn native_handle(&self) -> Result<i64>;

    /// Tear down the native endpoint. Further calls are invalid.
    fn destroy(&self) -> Result<()>;
}

/// Receiver of events emitted by the native engine.
///
/// Called from whatever thread the engine emits on; implementations must not
/// assume any particular calling context.
pub trait NativeEventHandler: Send + Sync {
    fn on_event(&self, event: &str, data: Option<&str>, buffer: Option<&[u8]>);
}
