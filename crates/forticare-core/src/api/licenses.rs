use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::client::ApiClient;
use super::error::{ApiError, Result};
use super::response::take_payload;
use crate::models::{Asset, License, LicenseUnit};

const LIST_ENDPOINT: &str = "/licenses/list";
const REGISTER_ENDPOINT: &str = "/licenses/register";
const DOWNLOAD_ENDPOINT: &str = "/licenses/download";

/// Filters for `/licenses/list`; empty fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct LicenseQuery {
    pub serial_number: String,
    pub license_sku: String,
    pub status: String,
}

impl LicenseQuery {
    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = serial.into();
        self
    }

    pub fn license_sku(mut self, sku: impl Into<String>) -> Self {
        self.license_sku = sku.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    fn to_body(&self) -> Value {
        let mut body = Map::new();
        if !self.serial_number.is_empty() {
            body.insert("serialNumber".into(), json!(self.serial_number));
        }
        if !self.license_sku.is_empty() {
            body.insert("licenseSKU".into(), json!(self.license_sku));
        }
        if !self.status.is_empty() {
            body.insert("status".into(), json!(self.status));
        }
        Value::Object(body)
    }
}

impl ApiClient {
    pub async fn get_licenses(&mut self, query: &LicenseQuery) -> Result<Vec<License>> {
        info!("Fetching licenses");
        let result = async {
            let body = self.execute(LIST_ENDPOINT, &query.to_body()).await?;
            take_payload(LIST_ENDPOINT, body, "licenses")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to fetch licenses"))
    }

    /// Register a license code; the server answers with the generated assets.
    pub async fn register_license(&mut self, unit: &LicenseUnit) -> Result<Vec<Asset>> {
        info!(code = %unit.license_registration_code, "Registering license");
        let result = async {
            let body = self
                .execute(REGISTER_ENDPOINT, &Value::Object(unit.to_wire()))
                .await?;
            take_payload(REGISTER_ENDPOINT, body, "assets")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to register license"))
    }

    /// Download the license key file of a serial number.
    pub async fn download_license(&mut self, serial_number: &str) -> Result<String> {
        info!(serial_number, "Downloading license file");
        let result = async {
            if serial_number.trim().is_empty() {
                return Err(ApiError::InvalidArgument("Serial number is empty".to_string()));
            }
            let body = self
                .execute(DOWNLOAD_ENDPOINT, &json!({ "serialNumber": serial_number }))
                .await?;
            take_payload(DOWNLOAD_ENDPOINT, body, "licenseFile")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, serial_number, "Failed to download license file"))
    }
}
