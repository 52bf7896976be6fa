// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Well-known engine error codes.
//
// The diagnostic side channel is the authority for error descriptions. This
// table only supplies a fallback when that lookup yields nothing, and gives
// log lines a stable name to grep for.

/// Generic failure.
pub const ERR_FAILED: u32 = 1;
/// Invalid argument.
pub const ERR_INVALID_ARGUMENT: u32 = 2;
/// Engine not ready.
pub const ERR_NOT_READY: u32 = 3;
/// Not supported by this engine build or platform.
pub const ERR_NOT_SUPPORTED: u32 = 4;
/// Request refused.
pub const ERR_REFUSED: u32 = 5;
/// Result buffer too small.
pub const ERR_BUFFER_TOO_SMALL: u32 = 6;
/// Engine not initialized.
pub const ERR_NOT_INITIALIZED: u32 = 7;
/// Missing permission.
pub const ERR_NO_PERMISSION: u32 = 9;
/// Operation timed out.
pub const ERR_TIMEDOUT: u32 = 10;
/// Operation cancelled.
pub const ERR_CANCELED: u32 = 11;
/// Calls issued too frequently.
pub const ERR_TOO_OFTEN: u32 = 12;
/// Invalid app id.
pub const ERR_INVALID_APP_ID: u32 = 101;
/// Invalid channel name.
pub const ERR_INVALID_CHANNEL_NAME: u32 = 102;
/// Token expired.
pub const ERR_TOKEN_EXPIRED: u32 = 109;
/// Invalid token.
pub const ERR_INVALID_TOKEN: u32 = 110;

/// Short symbolic name for an absolute error code, if known.
pub fn error_name(code: u32) -> Option<&'static str> {
    let name = match code {
        ERR_FAILED => "ERR_FAILED",
        ERR_INVALID_ARGUMENT => "ERR_INVALID_ARGUMENT",
        ERR_NOT_READY => "ERR_NOT_READY",
        ERR_NOT_SUPPORTED => "ERR_NOT_SUPPORTED",
        ERR_REFUSED => "ERR_REFUSED",
        ERR_BUFFER_TOO_SMALL => "ERR_BUFFER_TOO_SMALL",
        ERR_NOT_INITIALIZED => "ERR_NOT_INITIALIZED",
        ERR_NO_PERMISSION => "ERR_NO_PERMISSION",
        ERR_TIMEDOUT => "ERR_TIMEDOUT",
        ERR_CANCELED => "ERR_CANCELED",
        ERR_TOO_OFTEN => "ERR_TOO_OFTEN",
        ERR_INVALID_APP_ID => "ERR_INVALID_APP_ID",
        ERR_INVALID_CHANNEL_NAME => "ERR_INVALID_CHANNEL_NAME",
        ERR_TOKEN_EXPIRED => "ERR_TOKEN_EXPIRED",
        ERR_INVALID_TOKEN => "ERR_INVALID_TOKEN",
        _ => return None,
    };
    Some(name)
}

/// Description used when the diagnostic side channel returns nothing.
pub fn fallback_description(code: u32) -> String {
    match error_name(code) {
        Some(name) => name.to_string(),
        None => format!("unknown error ({code})"),
    }
}
