// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rtcbridge — Native engine endpoint abstractions.
//
// Defines the opcode-addressed endpoint trait and picks the platform
// implementation: JNI into the Java engine object on Android, a stub that
// reports every opcode as unsupported elsewhere.

pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

#[cfg(any(test, feature = "testing"))]
pub mod recording;

use std::sync::Arc;

use rtcbridge_core::config::ProtocolConfig;
use rtcbridge_core::error::Result;

pub use traits::{NativeEndpoint, NativeEventHandler};

/// Construct the endpoint for the target operating system.
pub fn native_endpoint(protocol: &ProtocolConfig) -> Result<Arc<dyn NativeEndpoint>> {
    #[cfg(target_os = "android")]
    {
        let _ = protocol;
        Ok(Arc::new(android::AndroidEndpoint::new()?))
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: no native engine; every opcode reports ERR_NOT_SUPPORTED.
        Ok(Arc::new(stub::StubEndpoint::new(protocol.error_description)))
    }
}
