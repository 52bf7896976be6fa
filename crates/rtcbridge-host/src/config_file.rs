// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Config file location.

use std::ffi::OsString;

use rtcbridge_core::error::Result;
use rtcbridge_core::BridgeConfig;
use tracing::info;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "RTCBRIDGE_CONFIG";

/// Load the config named by `RTCBRIDGE_CONFIG`, or the defaults when unset.
/// A named file that cannot be read or parsed is an error.
pub fn load_config() -> Result<BridgeConfig> {
    load_from(std::env::var_os(CONFIG_ENV))
}

fn load_from(path: Option<OsString>) -> Result<BridgeConfig> {
    match path {
        Some(path) => {
            info!(path = %path.to_string_lossy(), "loading bridge config");
            BridgeConfig::load(path)
        }
        None => {
            info!("no bridge config set; using defaults");
            Ok(BridgeConfig::default())
        }
    }
}
