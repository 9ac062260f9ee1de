use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::client::ApiClient;
use super::error::{ApiError, Result};
use super::response::take_payload;
use crate::models::Entitlement;

const LIST_ENDPOINT: &str = "/entitlements/list";

/// Filters for `/entitlements/list`.
///
/// At least one of `config_id` and `account_id` must be set; zero means
/// unset.
#[derive(Debug, Clone, Default)]
pub struct EntitlementQuery {
    pub program_serial_number: String,
    pub config_id: i64,
    pub account_id: i64,
}

impl EntitlementQuery {
    pub fn new(program_serial_number: impl Into<String>) -> Self {
        Self {
            program_serial_number: program_serial_number.into(),
            ..Default::default()
        }
    }

    pub fn config_id(mut self, config_id: i64) -> Self {
        self.config_id = config_id;
        self
    }

    pub fn account_id(mut self, account_id: i64) -> Self {
        self.account_id = account_id;
        self
    }

    fn to_body(&self) -> Result<Value> {
        if self.config_id == 0 && self.account_id == 0 {
            return Err(ApiError::InvalidArgument(
                "Account ID or Configuration ID must be provided".to_string(),
            ));
        }
        let mut body = Map::new();
        body.insert("programSerialNumber".into(), json!(self.program_serial_number));
        if self.config_id != 0 {
            body.insert("configId".into(), json!(self.config_id));
        }
        if self.account_id != 0 {
            body.insert("accountId".into(), json!(self.account_id));
        }
        Ok(Value::Object(body))
    }
}

impl ApiClient {
    /// List the FlexVM entitlements of a program
    pub async fn get_entitlements(&mut self, query: &EntitlementQuery) -> Result<Vec<Entitlement>> {
        info!(
            account_id = query.account_id,
            config_id = query.config_id,
            "Fetching entitlements"
        );
        let result = async {
            let request = query.to_body()?;
            let body = self.execute(LIST_ENDPOINT, &request).await?;
            take_payload(LIST_ENDPOINT, body, "entitlements")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to fetch entitlements"))
    }
}
