// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed view of an invocation.
//
// The wire protocol stays generic (opcode + params string + optional buffer),
// but the opcodes the bridge itself acts on are decoded once, here, against
// the configured protocol table. Everything else is forwarded untouched.

use rtcbridge_core::config::ProtocolConfig;
use rtcbridge_core::types::{ApiType, ErrorDescriptionParams, Invocation};

/// Decoded invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// Constructs the native engine; the registry is populated on success.
    CreateEngine,
    /// Releases the native engine; the registry is cleared afterwards.
    DestroyEngine,
    /// Direct use of the diagnostic opcode with well-formed params. Params
    /// that do not parse decode as `Generic` and are forwarded as-is.
    ErrorDescription(ErrorDescriptionParams),
    /// Any other opcode. Its params schema belongs to the native engine.
    Generic(ApiType),
}

impl EngineCall {
    /// Decoding never fails: params stay opaque to the dispatcher.
    pub fn decode(invocation: &Invocation, protocol: &ProtocolConfig) -> Self {
        let api_type = invocation.api_type();
        if api_type == protocol.create_engine {
            Self::CreateEngine
        } else if api_type == protocol.destroy_engine {
            Self::DestroyEngine
        } else if api_type == protocol.error_description {
            invocation
                .params()
                .and_then(|raw| serde_json::from_str::<ErrorDescriptionParams>(raw).ok())
                .map_or(Self::Generic(api_type), Self::ErrorDescription)
        } else {
            Self::Generic(api_type)
        }
    }
}
