use serde_json::Value;
use tracing::{error, info};

use super::client::ApiClient;
use super::error::Result;
use super::response::take_payload;
use crate::models::{Asset, ServiceUnit};

const REGISTER_ENDPOINT: &str = "/services/register";

impl ApiClient {
    /// Register a subscription contract; returns the asset it generated.
    pub async fn register_service(&mut self, unit: &ServiceUnit) -> Result<Asset> {
        info!(contract = %unit.contract_number, "Registering service");
        let result = async {
            let body = self
                .execute(REGISTER_ENDPOINT, &Value::Object(unit.to_wire()))
                .await?;
            take_payload(REGISTER_ENDPOINT, body, "assetDetails")
        }
        .await;
        result.inspect_err(|e| error!(error = %e, "Failed to register service"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::client::test_support::{api_path, client};
    use crate::api::error::ApiError;

    #[tokio::test]
    async fn test_register_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path(REGISTER_ENDPOINT)))
            .and(body_json(json!({
                "contractNumber": "2121DJ8902",
                "description": "VM-S",
                "isGovernment": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "assetDetails": {
                    "serialNumber": "FGVMSLTM00000001",
                    "productModel": "FortiGate-VM S",
                    "contracts": [{
                        "contractNumber": "2121DJ8902",
                        "sku": "FC1-10-FGVVS-464-01-12",
                        "terms": [{
                            "supportType": "Firmware & General Updates",
                            "startDate": "2023-01-01T00:00:00",
                            "endDate": "2024-01-01T00:00:00"
                        }]
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let unit = ServiceUnit::new("2121DJ8902").unwrap().description("VM-S");
        let mut api = client(&server, false, Some("current"));
        let asset = api.register_service(&unit).await.unwrap();

        assert_eq!(asset.serial_number, "FGVMSLTM00000001");
        assert_eq!(asset.contracts.len(), 1);
    }

    #[tokio::test]
    async fn test_register_service_leaves_out_empty_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path(REGISTER_ENDPOINT)))
            .and(body_json(json!({
                "contractNumber": "2121DJ8902",
                "isGovernment": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "assetDetails": { "serialNumber": "FGVMSLTM00000002" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let unit = ServiceUnit::new("2121DJ8902").unwrap().government(true);
        let mut api = client(&server, false, Some("current"));
        let asset = api.register_service(&unit).await.unwrap();
        assert_eq!(asset.serial_number, "FGVMSLTM00000002");
    }

    #[tokio::test]
    async fn test_register_service_empty_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(api_path(REGISTER_ENDPOINT)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let unit = ServiceUnit::new("2121DJ8902").unwrap();
        let mut api = client(&server, false, Some("current"));
        let err = api.register_service(&unit).await.unwrap_err();

        match err {
            ApiError::UnexpectedResponse { endpoint, key } => {
                assert_eq!(endpoint, REGISTER_ENDPOINT);
                assert_eq!(key, "assetDetails");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
