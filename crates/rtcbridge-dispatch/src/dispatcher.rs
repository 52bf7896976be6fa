// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generic opcode dispatcher.
//
// One `invoke` is exactly one native call, plus one diagnostic side-channel
// call when (and only when) the primary call returns a negative code.
// Calls are synchronous; nothing is queued, batched or retried.

use std::sync::{Arc, PoisonError, RwLock};

use rtcbridge_core::codes;
use rtcbridge_core::config::ProtocolConfig;
use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::{CallResult, ErrorDescriptionParams, ErrorReport, Invocation};
use rtcbridge_native::NativeEndpoint;
use tracing::{debug, info, instrument, warn};

use crate::api::EngineCall;
use crate::registry::EngineRegistry;

/// Interpret a native return code and its result buffer.
///
/// `Err` carries the negative code for the caller to describe.
pub(crate) fn interpret(ret: i32, result: String) -> std::result::Result<CallResult, i32> {
    match ret {
        0 if result.is_empty() => Ok(CallResult::Empty),
        0 => Ok(CallResult::Text(result)),
        code if code > 0 => Ok(CallResult::Code(code)),
        code => Err(code),
    }
}

/// Translates invocations into native endpoint calls.
pub struct Dispatcher {
    /// `None` once the endpoint has been torn down.
    endpoint: RwLock<Option<Arc<dyn NativeEndpoint>>>,
    registry: EngineRegistry,
    protocol: ProtocolConfig,
}

impl Dispatcher {
    pub fn new(
        endpoint: Arc<dyn NativeEndpoint>,
        registry: EngineRegistry,
        protocol: ProtocolConfig,
    ) -> Self {
        info!(
            platform = endpoint.platform_name(),
            protocol = %protocol.version,
            "dispatcher attached"
        );
        Self {
            endpoint: RwLock::new(Some(endpoint)),
            registry,
            protocol,
        }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    fn endpoint(&self) -> Result<Arc<dyn NativeEndpoint>> {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(BridgeError::Detached)
    }

    /// Invoke one native operation.
    ///
    /// An invocation carrying a buffer (even an empty one) goes through the
    /// buffer-accepting entry point.
    #[instrument(skip(self, invocation), fields(
        api_type = %invocation.api_type(),
        buffered = invocation.buffer().is_some(),
    ))]
    pub fn invoke(&self, invocation: &Invocation) -> Result<CallResult> {
        let endpoint = self.endpoint()?;
        let call = EngineCall::decode(invocation, &self.protocol);

        let mut result = String::new();
        let ret = match invocation.buffer() {
            None => endpoint.call_api(invocation.api_type(), invocation.params(), &mut result)?,
            Some(buffer) => endpoint.call_api_with_buffer(
                invocation.api_type(),
                invocation.params(),
                buffer,
                &mut result,
            )?,
        };

        match call {
            EngineCall::CreateEngine if ret >= 0 => self.register_created(&endpoint),
            EngineCall::DestroyEngine => self.registry.on_engine_destroyed(),
            _ => {}
        }

        match interpret(ret, result) {
            Ok(outcome) => {
                debug!(ret, "native call succeeded");
                Ok(outcome)
            }
            Err(code) => {
                let report = Self::lookup(endpoint.as_ref(), &self.protocol, code);
                warn!(code, description = %report.description, "native call failed");
                Err(BridgeError::Native {
                    code: report.code,
                    description: report.description,
                })
            }
        }
    }

    /// Record the engine built by a successful create, unless `endpoint` was
    /// detached while the call was in flight. Runs under the endpoint lock so
    /// it cannot interleave with `detach`.
    fn register_created(&self, endpoint: &Arc<dyn NativeEndpoint>) {
        let current = self.endpoint.read().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(live) if Arc::ptr_eq(live, endpoint) => {
                self.registry.on_engine_created(endpoint.engine_handle());
            }
            _ => warn!("endpoint detached during create; engine not registered"),
        }
    }

    /// Describe an error code through the diagnostic side channel.
    pub fn describe_error(&self, code: i32) -> Result<ErrorReport> {
        let endpoint = self.endpoint()?;
        Ok(Self::lookup(endpoint.as_ref(), &self.protocol, code))
    }

    /// Side-channel lookup. The diagnostic call's own return code is not
    /// interpreted; an empty or failed lookup falls back to the known-code
    /// table so the caller always gets some description.
    fn lookup(endpoint: &dyn NativeEndpoint, protocol: &ProtocolConfig, code: i32) -> ErrorReport {
        let params = ErrorDescriptionParams::for_return_code(code);
        let mut description = String::new();
        if let Err(e) = endpoint.call_api(
            protocol.error_description,
            Some(&params.to_params()),
            &mut description,
        ) {
            warn!(code, error = %e, "error description lookup failed");
            description.clear();
        }
        if description.is_empty() {
            description = codes::fallback_description(params.code);
        }
        ErrorReport { code, description }
    }

    /// Identifier of the native endpoint object. Test harness use only.
    #[cfg(debug_assertions)]
    pub fn native_handle(&self) -> Result<i64> {
        self.endpoint()?.native_handle()
    }

    /// Tear the native endpoint down out of band. Test harness use only.
    #[cfg(debug_assertions)]
    pub fn force_destroy(&self) -> Result<()> {
        warn!("forcing native endpoint teardown");
        self.detach()
    }

    /// Destroy the native endpoint and clear the registry. Subsequent
    /// invocations fail with `Detached`; detaching twice is a no-op.
    pub fn detach(&self) -> Result<()> {
        let endpoint = {
            let mut slot = self.endpoint.write().unwrap_or_else(PoisonError::into_inner);
            self.registry.on_engine_destroyed();
            slot.take()
        };
        match endpoint {
            Some(endpoint) => {
                endpoint.destroy()?;
                info!("dispatcher detached");
            }
            None => debug!("dispatcher already detached"),
        }
        Ok(())
    }
}
