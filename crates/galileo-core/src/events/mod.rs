// ── Typed push events ──
//
// The catalog decodes raw Socket.IO frames into `GalileoEvent`s, the
// registry routes them to handlers, and the connector feeds the registry
// from a live channel.

mod catalog;
mod connector;
mod registry;

pub use catalog::*;
pub use connector::{EventConnector, spawn_dispatch};
pub use registry::EventRegistry;
