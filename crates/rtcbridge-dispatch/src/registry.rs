// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared record of the live native engine.
//
// One registry exists per plugin attachment and is handed explicitly to
// every component that needs the engine (the dispatcher writes it, render
// views and sibling channels read it). Absence is a normal state: before the
// create opcode and after the destroy opcode `current()` is `None`.

use std::sync::{Arc, PoisonError, RwLock};

use rtcbridge_core::types::EngineHandle;
use tracing::{debug, info, warn};

/// Cloneable handle to the live-engine slot. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    slot: Arc<RwLock<Option<EngineHandle>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live engine, if any.
    pub fn current(&self) -> Option<EngineHandle> {
        *self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_live(&self) -> bool {
        self.current().is_some()
    }

    /// Record the engine constructed by the create opcode. The endpoint may
    /// not expose one, in which case the slot stays empty.
    pub(crate) fn on_engine_created(&self, handle: Option<EngineHandle>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        match handle {
            Some(handle) => {
                if let Some(previous) = slot.replace(handle) {
                    warn!(%previous, %handle, "engine re-created without release");
                }
                info!(%handle, "engine registered");
            }
            None => {
                *slot = None;
                warn!("create opcode succeeded but the endpoint exposes no engine");
            }
        }
    }

    pub(crate) fn on_engine_destroyed(&self) {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match previous {
            Some(handle) => info!(%handle, "engine unregistered"),
            None => debug!("engine unregister with empty registry"),
        }
    }
}
