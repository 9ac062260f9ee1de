//! Client library for the FortiCare asset management API.
//!
//! Register products, licenses and services, list assets and entitlements,
//! and download license files. Every call goes through `ApiClient::execute`,
//! which signs the request with the session token and refreshes it once when
//! the server rejects it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{
    ApiClient, ApiClientBuilder, ApiError, ClientConfig, EntitlementQuery, LicenseQuery, ProductQuery,
    ProductStatus,
};
pub use auth::{AuthOutcome, CredentialStore, Session, SessionStore};
pub use config::Config;
pub use models::{
    Asset, BaseFields, Entitlement, License, LicenseUnit, Location, ProductUnit, RegistrationUnit,
    ServiceUnit,
};
