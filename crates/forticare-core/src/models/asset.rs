//! Registered products ("assets") and the support data attached to them.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::de::{null_default, optional_date_time, trimmed};
use super::location::Location;

/// A registered product as returned by the product, license and service
/// endpoints.
///
/// Two assets are equal when they share a serial number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default, deserialize_with = "null_default")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub is_decommissioned: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub product_model: String,
    #[serde(default, deserialize_with = "optional_date_time")]
    pub registration_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_default")]
    pub entitlements: Vec<Support>,
    #[serde(default, deserialize_with = "null_default")]
    pub warranty_supports: Vec<Support>,
    #[serde(default, deserialize_with = "null_default")]
    pub asset_groups: Vec<AssetGroup>,
    #[serde(default, deserialize_with = "null_default")]
    pub contracts: Vec<Contract>,
    /// End of registration date of the product model
    #[serde(rename = "productModelEoR", default)]
    pub product_model_eor: Option<String>,
    /// End of support date of the product model
    #[serde(rename = "productModelEoS", default)]
    pub product_model_eos: Option<String>,
    #[serde(default, alias = "license", deserialize_with = "null_default")]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "null_default")]
    pub partner: String,
    #[serde(default, deserialize_with = "null_default")]
    pub folder_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub folder_path: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default)]
    pub trial_types: Option<String>,
}

impl Asset {
    /// Latest end date among entitlements and warranty supports.
    pub fn support_end(&self) -> Option<NaiveDateTime> {
        self.entitlements
            .iter()
            .chain(self.warranty_supports.iter())
            .filter_map(|s| s.end_date)
            .max()
    }

    /// Entitlements still running at `at`.
    pub fn active_entitlements(&self, at: NaiveDateTime) -> Vec<&Support> {
        self.entitlements.iter().filter(|s| s.is_active(at)).collect()
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.serial_number == other.serial_number
    }
}

impl Eq for Asset {}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset: {} - {}", self.product_model, self.serial_number)
    }
}

/// An entitlement or warranty line on an asset.
///
/// Equal when type, level and end date match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Support {
    #[serde(default, deserialize_with = "optional_date_time")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_date_time")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_default")]
    pub level: i64,
    #[serde(default, deserialize_with = "trimmed")]
    pub level_desc: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: i64,
    #[serde(default, deserialize_with = "trimmed")]
    pub type_desc: String,
}

impl Support {
    pub fn is_active(&self, at: NaiveDateTime) -> bool {
        let started = self.start_date.map(|d| d <= at).unwrap_or(true);
        let not_ended = self.end_date.map(|d| d >= at).unwrap_or(false);
        started && not_ended
    }
}

impl PartialEq for Support {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.level == other.level && self.end_date == other.end_date
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entitlement: {}", self.type_desc)
    }
}

/// A support term of a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    #[serde(default, deserialize_with = "optional_date_time")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_date_time")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "trimmed")]
    pub support_type: String,
}

/// A support contract; equal when contract numbers match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default, deserialize_with = "null_default")]
    pub contract_number: String,
    #[serde(default, deserialize_with = "null_default")]
    pub sku: String,
    #[serde(default, deserialize_with = "null_default")]
    pub terms: Vec<Term>,
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.contract_number == other.contract_number
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contract: {} - {}", self.sku, self.contract_number)
    }
}

/// A license attached to an asset or listed by `/licenses/list`.
///
/// Equal when serial numbers match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default, deserialize_with = "null_default")]
    pub license_number: String,
    #[serde(rename = "licenseSKU", default, deserialize_with = "null_default")]
    pub license_sku: String,
    #[serde(default, deserialize_with = "null_default")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
}

impl PartialEq for License {
    fn eq(&self, other: &Self) -> bool {
        self.serial_number == other.serial_number
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "License: {} - {}", self.license_sku, self.license_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    #[serde(default, deserialize_with = "null_default")]
    pub asset_group_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub asset_group: String,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn details_json() -> serde_json::Value {
        json!({
            "description": null,
            "entitlements": [
                {
                    "endDate": "2021-09-23T00:00:00",
                    "level": 20,
                    "levelDesc": "Premium                                 ",
                    "startDate": "2020-09-23T00:00:00",
                    "type": 11,
                    "typeDesc": "Enhanced Support       "
                },
                {
                    "endDate": "2021-09-23T00:00:00",
                    "level": 6,
                    "levelDesc": "Web/Online                              ",
                    "startDate": "2020-09-23T00:00:00",
                    "type": 118,
                    "typeDesc": "FortiADC GSLB Cloud Service QPS"
                }
            ],
            "isDecommissioned": false,
            "productModel": "FortiGSLB Cloud",
            "registrationDate": "2020-09-23T02:46:42",
            "serialNumber": "FCGSLB0000000205",
            "warrantySupports": null,
            "assetGroups": null,
            "contracts": [
                {
                    "contractNumber": "1162XX438908",
                    "sku": "FC2-10-CGSLB-332-02-12",
                    "terms": [
                        {
                            "endDate": "2021-09-23T00:00:00",
                            "startDate": "2020-09-23T00:00:00",
                            "supportType": "Enhanced Support"
                        }
                    ]
                }
            ],
            "productModelEoR": null,
            "productModelEoS": null,
            "license": null,
            "location": null,
            "partner": "FORTITEST",
            "folderId": 0,
            "folderPath": "/My Assets"
        })
    }

    #[test]
    fn test_parse_asset_details() {
        let asset: Asset = serde_json::from_value(details_json()).unwrap();

        assert_eq!(asset.serial_number, "FCGSLB0000000205");
        assert_eq!(asset.product_model, "FortiGSLB Cloud");
        assert_eq!(asset.description, "");
        assert!(!asset.is_decommissioned);
        assert_eq!(asset.entitlements.len(), 2);
        assert_eq!(asset.entitlements[0].level_desc, "Premium");
        assert_eq!(asset.entitlements[0].type_desc, "Enhanced Support");
        assert_eq!(asset.entitlements[1].kind, 118);
        assert!(asset.warranty_supports.is_empty());
        assert!(asset.asset_groups.is_empty());
        assert!(asset.licenses.is_empty());
        assert!(asset.location.is_none());
        assert_eq!(asset.contracts.len(), 1);
        assert_eq!(asset.contracts[0].terms.len(), 1);
        assert_eq!(asset.partner, "FORTITEST");
        assert_eq!(asset.folder_path, "/My Assets");
        assert_eq!(
            asset.registration_date,
            NaiveDate::from_ymd_opt(2020, 9, 23).and_then(|d| d.and_hms_opt(2, 46, 42))
        );
    }

    #[test]
    fn test_asset_display_and_equality() {
        let asset: Asset = serde_json::from_value(details_json()).unwrap();
        assert_eq!(asset.to_string(), "Asset: FortiGSLB Cloud - FCGSLB0000000205");

        let same_serial = Asset {
            serial_number: "FCGSLB0000000205".into(),
            ..Default::default()
        };
        assert_eq!(asset, same_serial);
        assert_ne!(asset, Asset::default());
    }

    #[test]
    fn test_support_end_and_activity() {
        let asset: Asset = serde_json::from_value(details_json()).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 9, 23).and_then(|d| d.and_hms_opt(0, 0, 0));
        assert_eq!(asset.support_end(), end);

        let during = NaiveDate::from_ymd_opt(2021, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap();
        let after = NaiveDate::from_ymd_opt(2022, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap();
        assert_eq!(asset.active_entitlements(during).len(), 2);
        assert!(asset.active_entitlements(after).is_empty());
    }

    #[test]
    fn test_license_parse_and_display() {
        let license: License = serde_json::from_value(json!({
            "licenseNumber": "FMCLD4713562246",
            "licenseSKU": "FMG-VM-CLOUD",
            "serialNumber": "FMGVCLTM20000051",
            "status": "Registered"
        }))
        .unwrap();
        assert_eq!(license.license_sku, "FMG-VM-CLOUD");
        assert_eq!(license.to_string(), "License: FMG-VM-CLOUD - FMCLD4713562246");
    }

    #[test]
    fn test_contract_equality_by_number() {
        let a = Contract { contract_number: "5762CL381100".into(), sku: "A".into(), terms: vec![] };
        let b = Contract { contract_number: "5762CL381100".into(), sku: "B".into(), terms: vec![] };
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Contract: A - 5762CL381100");
    }
}
