// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rtcbridge — Core types, errors and configuration shared across all crates.

pub mod channel;
pub mod codes;
pub mod config;
pub mod error;
pub mod types;

pub use channel::{MethodCall, MethodResponse};
pub use config::{BridgeConfig, ProtocolConfig};
pub use error::BridgeError;
pub use types::*;
