// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rtcbridge — Opcode dispatcher, event relay and method router.

pub mod api;
pub mod assets;
pub mod dispatcher;
pub mod events;
pub mod plugin;
pub mod registry;

pub use api::EngineCall;
pub use assets::AssetResolver;
pub use dispatcher::Dispatcher;
pub use events::{EventRelay, EventSink};
pub use plugin::RtcEnginePlugin;
pub use registry::EngineRegistry;
