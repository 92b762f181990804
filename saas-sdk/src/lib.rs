//! SaaS platform SDK contract.
//!
//! This crate provides the public contract shared by every backend of the
//! partner SDK:
//!
//! - [`PlatformClient`] - capability trait implemented by both the
//!   in-process and the HTTP backend
//! - [`Credential`] - partner key/secret pair
//! - [`ResourceObject`], [`ResourceCollection`] - loosely-typed platform
//!   records
//! - [`SdkError`] - error taxonomy
//!
//! ## Usage
//!
//! Partner applications normally consume this contract through the `Api`
//! facade in `saas-client`; a custom backend only needs to implement
//! [`PlatformClient`]:
//!
//! ```ignore
//! use saas_sdk::{PlatformClient, ResourceObject, SdkError};
//!
//! struct FixtureClient;
//!
//! #[async_trait::async_trait]
//! impl PlatformClient for FixtureClient {
//!     async fn get_owner_app(&self) -> Result<ResourceObject, SdkError> {
//!         Ok(ResourceObject::new())
//!     }
//!     // ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

// API trait
pub use api::PlatformClient;

// Error types
pub use error::SdkError;

// Models
pub use models::{Credential, ResourceCollection, ResourceObject, ResourceValue};
