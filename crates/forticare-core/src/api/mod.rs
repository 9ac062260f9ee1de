//! FortiCare registration API.
//!
//! `client` holds the authenticated request executor; the remaining
//! modules add the domain operations to `ApiClient`.

pub mod client;
mod entitlements;
pub mod error;
mod licenses;
mod products;
pub mod response;
mod services;

pub use client::{ApiClient, ApiClientBuilder, ClientConfig, DEFAULT_API_URL};
pub use entitlements::EntitlementQuery;
pub use error::{ApiError, Result};
pub use licenses::LicenseQuery;
pub use products::{ProductQuery, ProductStatus};
pub use response::{RequestOutcome, TOKEN_ERROR_MESSAGES};
