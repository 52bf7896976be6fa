// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bundled asset path resolution.

use std::path::{Component, Path, PathBuf};

use rtcbridge_core::config::BridgeConfig;
use rtcbridge_core::error::{BridgeError, Result};
use tracing::{debug, instrument};

/// Maps framework asset names onto on-device paths the engine can open.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
    prefix: String,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.asset_root.clone(), config.asset_prefix.clone())
    }

    /// Resolve `name` to `/assets/<prefix>/<name>`, failing unless the asset
    /// exists as a readable file under the asset root.
    #[instrument(skip(self))]
    pub fn resolve(&self, name: &str) -> Result<String> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(BridgeError::AssetNotFound(name.to_string()));
        }

        let key = format!("{}/{}", self.prefix, name);
        let path = self.root.join(&key);
        let meta = std::fs::metadata(&path)
            .map_err(|e| BridgeError::AssetNotFound(format!("{key}: {e}")))?;
        if !meta.is_file() {
            return Err(BridgeError::AssetNotFound(format!("{key}: not a file")));
        }
        std::fs::File::open(&path).map_err(|e| BridgeError::AssetNotFound(format!("{key}: {e}")))?;

        debug!(%key, "asset resolved");
        Ok(format!("/assets/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(files: &[&str]) -> (tempfile::TempDir, AssetResolver) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join("flutter_assets").join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"RIFF").unwrap();
        }
        let resolver = AssetResolver::new(dir.path(), "flutter_assets");
        (dir, resolver)
    }

    #[test]
    fn existing_asset_resolves() {
        let (_dir, resolver) = resolver_with(&["assets/Sound_Horizon.mp3"]);
        assert_eq!(
            resolver.resolve("assets/Sound_Horizon.mp3").unwrap(),
            "/assets/flutter_assets/assets/Sound_Horizon.mp3"
        );
    }

    #[test]
    fn missing_asset_fails() {
        let (_dir, resolver) = resolver_with(&[]);
        assert!(matches!(
            resolver.resolve("nope.wav"),
            Err(BridgeError::AssetNotFound(_))
        ));
    }

    #[test]
    fn directory_is_not_an_asset() {
        let (_dir, resolver) = resolver_with(&["effects/a.wav"]);
        assert!(resolver.resolve("effects").is_err());
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, resolver) = resolver_with(&["a.wav"]);
        assert!(resolver.resolve("../flutter_assets/a.wav").is_err());
        assert!(resolver.resolve("/etc/passwd").is_err());
        assert!(resolver.resolve("").is_err());
    }
}
