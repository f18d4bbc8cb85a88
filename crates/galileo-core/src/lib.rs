// galileo-core: Services, typed push events, and the SDK facade over galileo-api.

pub mod config;
pub mod error;
pub mod events;
pub mod notify;
pub mod sdk;
pub mod services;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthServer, Backend, SdkConfig};
pub use error::{CoreError, EventError};
pub use events::{EventCategory, EventConnector, EventKind, EventRegistry, GalileoEvent, TypedEvent};
pub use notify::LzNotifier;
pub use sdk::Galileo;
pub use services::{
    CargoBaysService, JobsService, MachinesService, MissionsService, ProfilesService,
    StationsService, UniversesService, UploadedFile,
};

// Wire records and transport settings, so consumers need only this crate.
pub use galileo_api::models;
pub use galileo_api::{PolicyTarget, ReconnectConfig, TlsMode};
