// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method-channel router for one plugin attachment.
//
// Owns the dispatcher, event relay, asset resolver and engine registry for
// the lifetime between `attach` and `detach`, and maps channel method calls
// onto them.

use std::sync::Arc;

use rtcbridge_core::channel::{MethodCall, MethodResponse};
use rtcbridge_core::config::BridgeConfig;
use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::{CallResult, Invocation};
use rtcbridge_native::NativeEndpoint;
use tokio::runtime::Handle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::assets::AssetResolver;
use crate::dispatcher::Dispatcher;
use crate::events::{EventRelay, EventSink};
use crate::registry::EngineRegistry;

/// Method names understood on the method channel.
pub mod methods {
    pub const CALL_API: &str = "callApi";
    pub const CALL_API_WITH_BUFFER: &str = "callApiWithBuffer";
    pub const GET_ASSET_ABSOLUTE_PATH: &str = "getAssetAbsolutePath";
    pub const CREATE_TEXTURE_RENDER: &str = "createTextureRender";
    pub const DESTROY_TEXTURE_RENDER: &str = "destroyTextureRender";
    /// Debug builds only.
    pub const GET_ENGINE_INT_PTR: &str = "getIrisRtcEngineIntPtr";
    /// Debug builds only.
    pub const FORCE_DESTROY_ENGINE: &str = "forceDestroyIrisRtcEngine";
}

/// Return code reported for method names the bridge does not know.
const UNKNOWN_METHOD_CODE: i32 = -1;

/// One attachment of the bridge to the framework.
pub struct RtcEnginePlugin {
    config: BridgeConfig,
    registry: EngineRegistry,
    dispatcher: Dispatcher,
    events: EventRelay,
    assets: AssetResolver,
}

impl RtcEnginePlugin {
    /// Wire up a new attachment around `endpoint`. Events are delivered on
    /// the `delivery` runtime.
    pub fn attach(
        endpoint: Arc<dyn NativeEndpoint>,
        config: BridgeConfig,
        delivery: Handle,
    ) -> Result<Self> {
        config.validate()?;
        let registry = EngineRegistry::new();
        let dispatcher = Dispatcher::new(
            Arc::clone(&endpoint),
            registry.clone(),
            config.protocol.clone(),
        );
        let events = EventRelay::new(endpoint, delivery);
        let assets = AssetResolver::from_config(&config);

        info!(
            method_channel = %config.method_channel,
            event_channel = %config.event_channel,
            "plugin attached"
        );
        Ok(Self {
            config,
            registry,
            dispatcher,
            events,
            assets,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Shared handle to the live engine, for components that need it.
    pub fn registry(&self) -> EngineRegistry {
        self.registry.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one method call. Never fails: every error becomes an error reply.
    #[instrument(skip(self, call), fields(method = %call.method))]
    pub fn on_method_call(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            methods::CREATE_TEXTURE_RENDER | methods::DESTROY_TEXTURE_RENDER => {
                MethodResponse::NotImplemented
            }
            methods::GET_ASSET_ABSOLUTE_PATH => match self.asset_absolute_path(call) {
                Ok(path) => MethodResponse::success(path),
                Err(e) => MethodResponse::from_error(&e),
            },
            _ => self.call_api_method(call),
        }
    }

    fn call_api_method(&self, call: &MethodCall) -> MethodResponse {
        #[cfg(debug_assertions)]
        if let Some(reply) = self.debug_method(call) {
            return reply;
        }
        MethodResponse::from_call(self.dispatch(call))
    }

    fn dispatch(&self, call: &MethodCall) -> Result<CallResult> {
        match call.method.as_str() {
            methods::CALL_API => self.dispatcher.invoke(&Self::invocation(call)?),
            methods::CALL_API_WITH_BUFFER => {
                // A null buffer still selects the buffer entry point.
                let buffer: Option<Vec<u8>> = call.argument("buffer")?;
                let invocation = Self::invocation(call)?.with_buffer(buffer.unwrap_or_default());
                self.dispatcher.invoke(&invocation)
            }
            other => {
                warn!(method = other, "unknown method");
                let report = self.dispatcher.describe_error(UNKNOWN_METHOD_CODE)?;
                Err(BridgeError::Native {
                    code: report.code,
                    description: report.description,
                })
            }
        }
    }

    fn invocation(call: &MethodCall) -> Result<Invocation> {
        let api_type: i32 = call
            .argument("apiType")?
            .ok_or(BridgeError::MissingArgument("apiType"))?;
        let params: Option<String> = call.argument("params")?;
        Ok(Invocation::new(api_type, params))
    }

    #[cfg(debug_assertions)]
    fn debug_method(&self, call: &MethodCall) -> Option<MethodResponse> {
        let reply = match call.method.as_str() {
            methods::GET_ENGINE_INT_PTR => match self.dispatcher.native_handle() {
                Ok(handle) => MethodResponse::success(handle),
                Err(e) => MethodResponse::from_error(&e),
            },
            methods::FORCE_DESTROY_ENGINE => match self.dispatcher.force_destroy() {
                Ok(()) => MethodResponse::success(true),
                Err(e) => MethodResponse::from_error(&e),
            },
            _ => return None,
        };
        Some(reply)
    }

    fn asset_absolute_path(&self, call: &MethodCall) -> Result<String> {
        let name: String = call.arguments()?.ok_or_else(|| {
            BridgeError::InvalidArgument("The parameter should not be null".into())
        })?;
        self.assets.resolve(&name)
    }

    /// Event channel listen: relay native events to `sink`.
    pub fn on_listen(&self, sink: Arc<dyn EventSink>) -> Result<Uuid> {
        self.events.listen(sink)
    }

    /// Event channel cancel.
    pub fn on_cancel(&self) -> Result<()> {
        self.events.cancel()
    }

    /// End the attachment: stop events and tear the native endpoint down.
    /// Later calls fail with `Detached`; detaching again is a no-op.
    pub fn detach(&self) -> Result<()> {
        if let Err(e) = self.events.cancel() {
            warn!(error = %e, "event cancel failed during detach");
        }
        self.dispatcher.detach()?;
        info!("plugin detached");
        Ok(())
    }
}
