//! Product listing, details and registration.

use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::client::ApiClient;
use super::error::{ApiError, Result};
use super::response::take_payload;
use crate::models::{Asset, Location, ProductUnit, WIRE_DATE_FORMAT};

const LIST_ENDPOINT: &str = "/products/list";
const DETAILS_ENDPOINT: &str = "/products/details";
const REGISTER_ENDPOINT: &str = "/products/register";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductStatus {
    #[default]
    Registered,
    Pending,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Registered => "Registered",
            ProductStatus::Pending => "Pending",
        }
    }
}

/// Filters for `/products/list`.
///
/// `expire_before` is always sent; serial number (or pattern) and model are
/// only sent when non-empty.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub expire_before: NaiveDateTime,
    pub serial_number: String,
    pub product_model: String,
    pub status: ProductStatus,
}

impl ProductQuery {
    pub fn new(expire_before: NaiveDateTime) -> Self {
        Self {
            expire_before,
            serial_number: String::new(),
            product_model: String::new(),
            status: ProductStatus::default(),
        }
    }

    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = serial.into();
        self
    }

    pub fn product_model(mut self, model: impl Into<String>) -> Self {
        self.product_model = model.into();
        self
    }

    pub fn status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("status".into(), json!(self.status.as_str()));
        body.insert(
            "expireBefore".into(),
            json!(self.expire_before.format(WIRE_DATE_FORMAT).to_string()),
        );
        if !self.serial_number.is_empty() {
            body.insert("serialNumber".into(), json!(self.serial_number));
        }
        if !self.product_model.is_empty() {
            body.insert("productModel".into(), json!(self.product_model));
        }
        Value::Object(body)
    }
}

/// Request body for `/products/register`.
///
/// A unit whose serial number appears in `locations` points at the first
/// matching entry of the `locations` array.
fn registration_body(units: &[ProductUnit], locations: &[(String, Location)]) -> Value {
    let registration_units: Vec<Value> = units
        .iter()
        .map(|unit| {
            let mut unit = unit.clone();
            if let Some(index) = locations
                .iter()
                .position(|(serial, _)| serial == unit.serial_number())
            {
                unit.base.location_ref = Some(format!("#/locations/{}", index));
            }
            Value::Object(unit.to_wire())
        })
        .collect();

    let locations: Vec<Value> = locations.iter().map(|(_, location)| location.to_wire()).collect();

    json!({
        "registrationUnits": registration_units,
        "locations": locations,
    })
}

impl ApiClient {
    /// List products matching the query
    pub async fn get_products(&mut self, query: &ProductQuery) -> Result<Vec<Asset>> {
        info!(status = query.status.as_str(), "Fetching products");
        let result = async {
            let body = self.execute(LIST_ENDPOINT, &query.to_body()).await?;
            take_payload(LIST_ENDPOINT, body, "assets")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to fetch products"))
    }

    pub async fn get_product_details(&mut self, serial_number: &str) -> Result<Asset> {
        info!(serial_number, "Fetching product details");
        let result = async {
            if serial_number.trim().is_empty() {
                return Err(ApiError::InvalidArgument("Serial number is empty".to_string()));
            }
            let body = self
                .execute(DETAILS_ENDPOINT, &json!({ "serialNumber": serial_number }))
                .await?;
            take_payload(DETAILS_ENDPOINT, body, "assetDetails")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, serial_number, "Failed to fetch product details"))
    }

    /// Register products, attaching each one to its location when given.
    ///
    /// `locations` pairs a serial number with the location of that unit.
    pub async fn register_products(
        &mut self,
        units: &[ProductUnit],
        locations: &[(String, Location)],
    ) -> Result<Vec<Asset>> {
        info!(units = units.len(), locations = locations.len(), "Registering products");
        let result = async {
            if units.is_empty() {
                return Err(ApiError::InvalidArgument("No product to register".to_string()));
            }
            let body = self
                .execute(REGISTER_ENDPOINT, &registration_body(units, locations))
                .await?;
            take_payload(REGISTER_ENDPOINT, body, "assets")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to register products"))
    }
}
