// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::ApiType;

/// The opcode contract of the native engine build the bridge talks to.
///
/// The full opcode table and the params schema belong to the native engine.
/// The bridge only needs to know the three opcodes it treats specially, so
/// those are configurable per engine version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Version tag of the native engine contract, for logs.
    pub version: String,
    /// Opcode that constructs the native engine.
    pub create_engine: ApiType,
    /// Opcode that releases the native engine.
    pub destroy_engine: ApiType,
    /// Reserved diagnostic opcode translating an absolute error code into a
    /// description.
    pub error_description: ApiType,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: "3.x".into(),
            create_engine: ApiType(0),
            destroy_engine: ApiType(1),
            error_description: ApiType(132),
        }
    }
}

impl ProtocolConfig {
    /// Reject opcode tables where the special opcodes collide.
    pub fn validate(&self) -> Result<()> {
        let special = [self.create_engine, self.destroy_engine, self.error_description];
        for (i, a) in special.iter().enumerate() {
            if special[i + 1..].contains(a) {
                return Err(BridgeError::Config(format!(
                    "protocol {}: opcode {a} is assigned to more than one role",
                    self.version
                )));
            }
        }
        Ok(())
    }
}

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the method channel carrying invocations.
    pub method_channel: String,
    /// Name of the event channel carrying native events.
    pub event_channel: String,
    /// Opcode contract of the native engine.
    pub protocol: ProtocolConfig,
    /// Directory the bundled application assets are unpacked under.
    pub asset_root: PathBuf,
    /// Prefix the framework applies to asset keys.
    pub asset_prefix: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            method_channel: "agora_rtc_engine".into(),
            event_channel: "agora_rtc_engine/events".into(),
            protocol: ProtocolConfig::default(),
            asset_root: PathBuf::from("."),
            asset_prefix: "flutter_assets".into(),
        }
    }
}

impl BridgeConfig {
    /// Load a config from a JSON file. Unspecified fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.method_channel.is_empty() || self.event_channel.is_empty() {
            return Err(BridgeError::Config("channel names must not be empty".into()));
        }
        self.protocol.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_protocol() {
        let config = BridgeConfig::default();
        assert_eq!(config.protocol.create_engine, ApiType(0));
        assert_eq!(config.protocol.destroy_engine, ApiType(1));
        assert_eq!(config.protocol.error_description, ApiType(132));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn colliding_opcodes_rejected() {
        let protocol = ProtocolConfig {
            destroy_engine: ApiType(132),
            ..Default::default()
        };
        assert!(matches!(protocol.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, r#"{ "protocol": { "version": "4.0", "error_description": 140 } }"#)
            .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.protocol.version, "4.0");
        assert_eq!(config.protocol.error_description, ApiType(140));
        assert_eq!(config.protocol.create_engine, ApiType(0));
        assert_eq!(config.method_channel, "agora_rtc_engine");
    }

    #[test]
    fn persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        let config = BridgeConfig {
            asset_prefix: "assets".into(),
            ..Default::default()
        };
        config.persist(&path).unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }
}
