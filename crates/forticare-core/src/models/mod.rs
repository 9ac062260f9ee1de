//! Data models for FortiCare entities.
//!
//! - `Asset` with its `Support`, `Contract`, `Term`, `License` and
//!   `AssetGroup` details
//! - `Entitlement`: FlexVM entitlements
//! - `Location`: postal data for product registration
//! - Registration units: `ProductUnit`, `LicenseUnit`, `ServiceUnit`

pub mod asset;
pub(crate) mod de;
pub mod entitlement;
pub mod location;
pub mod registration;

pub use asset::{Asset, AssetGroup, Contract, License, Support, Term};
pub use entitlement::Entitlement;
pub use location::Location;
pub use registration::{BaseFields, LicenseUnit, ProductUnit, RegistrationUnit, ServiceUnit, UnitBase};

/// Timestamp layout used in request bodies.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
