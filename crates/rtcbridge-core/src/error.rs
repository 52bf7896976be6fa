// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for rtcbridge.

use thiserror::Error;

/// Channel error code for a missing asset.
pub const ASSET_NOT_FOUND_CODE: &str = "FileNotFoundException";
/// Channel error code for a null or malformed argument.
pub const INVALID_ARGUMENT_CODE: &str = "IllegalArgumentException";

/// Top-level error type for all bridge operations.
///
/// A missing engine in the registry is deliberately *not* represented here:
/// lookups return `Option` and absence is a normal state.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Native endpoint --
    /// The native endpoint returned a negative code. The description comes
    /// from the diagnostic side channel.
    #[error("native call failed with code {code}: {description}")]
    Native { code: i32, description: String },

    // -- Marshalling --
    /// Failure before or around the native call, including exceptions thrown
    /// by the engine's host runtime. Reported with the bare message.
    #[error("marshal error: {0}")]
    Marshal(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Lifecycle --
    #[error("engine has been detached")]
    Detached,

    // -- Assets --
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Error code reported on the method channel.
    ///
    /// Native failures are keyed by their stringified negative code; every
    /// other failure is a marshalling-side problem and carries an empty code,
    /// except the asset lookups, which use the exception class names Dart
    /// callers already match on.
    pub fn response_code(&self) -> String {
        match self {
            Self::Native { code, .. } => code.to_string(),
            Self::AssetNotFound(_) => ASSET_NOT_FOUND_CODE.into(),
            Self::InvalidArgument(_) => INVALID_ARGUMENT_CODE.into(),
            _ => String::new(),
        }
    }

    /// Message reported on the method channel.
    pub fn response_message(&self) -> String {
        match self {
            Self::Native { description, .. } => description.clone(),
            Self::Marshal(message)
            | Self::InvalidArgument(message)
            | Self::AssetNotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
