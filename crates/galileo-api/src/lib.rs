// galileo-api: Async Rust client for the Galileo job-orchestration backend
//
// REST resources (jobs, machines, stations, profiles, missions, universes,
// cargo bays), token authentication with refresh, the OAuth device flow,
// and the Socket.IO event channel.

pub mod auth;
pub mod device_flow;
pub mod error;
pub mod models;
pub mod rest;
pub mod socketio;
pub mod transport;

pub use auth::{AuthProvider, Credentials, TokenEndpoint, TokenResponse};
pub use device_flow::{DeviceCode, DeviceFlow};
pub use error::Error;
pub use rest::stations::PolicyTarget;
pub use rest::{GalileoClient, QueryParams, QueryValue};
pub use socketio::{EventStream, ReconnectConfig, SocketEvent};
pub use transport::{TlsMode, TransportConfig};
