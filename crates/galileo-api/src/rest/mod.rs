// Galileo REST API: shared client plus one module per resource.

pub mod cargo_bays;
pub mod client;
pub mod jobs;
pub mod machines;
pub mod missions;
pub mod profiles;
pub mod query;
pub mod stations;
pub mod universes;

pub use client::{GalileoClient, NAMESPACE};
pub use query::{QueryParams, QueryValue};
