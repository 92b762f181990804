//! Partner-facing client for the SaaS platform.
//!
//! This crate implements the contract defined in `saas-sdk`:
//!
//! - [`Api`] - the facade a partner app talks to: URL builders, the SSO
//!   handshake, and resource accessors
//! - [`LocalClient`] - in-process backend for apps deployed inside the
//!   platform (directory-store backed)
//! - [`RemoteClient`] - HTTP backend for independent deployments
//! - [`SessionState`] - per-request session bag the host persists
//! - [`PlatformConfig`] - connection configuration
//!
//! ## Usage
//!
//! ```ignore
//! use saas_client::{Api, HandshakeQuery, SessionState};
//!
//! // Per inbound request:
//! let mut api = Api::builder("some-key", "s0m3s3cr3t")
//!     .request_host(request.host())           // selects the backend
//!     .session(store.load(request))           // host-owned session bag
//!     .build()?;
//!
//! // Completing the SSO handshake on the redirect back:
//! let outcome = api.check_session(&HandshakeQuery::from_query(request.query()));
//! if outcome.accepted {
//!     let user = api.active_user().await?;
//! }
//!
//! store.save(request, api.session());
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod local_client;
pub mod ports;
pub mod remote_client;
pub mod session;

// Facade
pub use api::{Api, ApiBuilder};

// Configuration
pub use config::PlatformConfig;

// Backends
pub use local_client::LocalClient;
pub use remote_client::{ORIGIN_DOMAIN_HEADER, RemoteClient};

// Ports of the in-process backend
pub use ports::{DirectoryGateway, Filter, GatewayError, Join, Query, Row};

// Session and handshake types
pub use session::{HandshakeOutcome, HandshakeQuery, SessionState};

// Contract re-exports, so hosts depend on one crate
pub use saas_sdk::{
    Credential, PlatformClient, ResourceCollection, ResourceObject, ResourceValue, SdkError,
};
