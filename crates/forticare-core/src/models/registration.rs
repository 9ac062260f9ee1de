//! Registration units: the typed payloads sent to the register endpoints.
//!
//! Product and license units share `UnitBase`; service units only carry a
//! contract number and the descriptive fields. Every unit renders to a JSON
//! object whose keys are sorted and whose optional fields appear only when
//! set.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Map, Value};

use crate::api::error::{ApiError, Result};

/// Fields common to product and license registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitBase {
    pub serial_number: String,
    pub description: String,
    pub is_government: bool,
    pub additional_info: String,
    pub folder_id: Option<i64>,
    pub asset_group_ids: Vec<i64>,
    pub replaced_serial_number: String,
    pub cloud_key: String,
    /// JSON pointer into the request's `locations` array, e.g. `#/locations/0`
    pub location_ref: Option<String>,
}

impl UnitBase {
    /// Everything but `description`, whose presence depends on the unit kind.
    fn write_fields(&self, fields: &mut BTreeMap<&'static str, Value>) {
        fields.insert("isGovernment", json!(self.is_government));
        if !self.serial_number.is_empty() {
            fields.insert("serialNumber", json!(self.serial_number));
        }
        if !self.additional_info.is_empty() {
            fields.insert("additionalInfo", json!(self.additional_info));
        }
        if let Some(folder_id) = self.folder_id {
            fields.insert("folderId", json!(folder_id));
        }
        if !self.asset_group_ids.is_empty() {
            fields.insert("assetGroupIds", json!(self.asset_group_ids));
        }
        if !self.replaced_serial_number.is_empty() {
            fields.insert("replacedSerialNumber", json!(self.replaced_serial_number));
        }
        if !self.cloud_key.is_empty() {
            fields.insert("cloudKey", json!(self.cloud_key));
        }
        if let Some(ref location) = self.location_ref {
            fields.insert("location", json!({ "ref": location }));
        }
    }
}

fn sorted(fields: BTreeMap<&'static str, Value>) -> Map<String, Value> {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Builder methods for units that embed a `UnitBase`.
pub trait BaseFields: Sized {
    fn base_mut(&mut self) -> &mut UnitBase;

    fn description(mut self, description: impl Into<String>) -> Self {
        self.base_mut().description = description.into();
        self
    }

    fn government(mut self, is_government: bool) -> Self {
        self.base_mut().is_government = is_government;
        self
    }

    fn additional_info(mut self, info: impl Into<String>) -> Self {
        self.base_mut().additional_info = info.into();
        self
    }

    fn folder_id(mut self, folder_id: i64) -> Self {
        self.base_mut().folder_id = Some(folder_id);
        self
    }

    fn asset_group_ids(mut self, ids: Vec<i64>) -> Self {
        self.base_mut().asset_group_ids = ids;
        self
    }

    fn replaced_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.base_mut().replaced_serial_number = serial.into();
        self
    }

    fn cloud_key(mut self, key: impl Into<String>) -> Self {
        self.base_mut().cloud_key = key.into();
        self
    }
}

/// A product to register under `/products/register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUnit {
    pub base: UnitBase,
    pub contract_number: String,
}

impl ProductUnit {
    /// Serial number is mandatory.
    pub fn new(serial_number: impl Into<String>) -> Result<Self> {
        let serial_number = serial_number.into();
        if serial_number.trim().is_empty() {
            return Err(ApiError::InvalidArgument("Serial number is empty".to_string()));
        }
        Ok(Self {
            base: UnitBase { serial_number, ..Default::default() },
            contract_number: String::new(),
        })
    }

    pub fn contract_number(mut self, contract: impl Into<String>) -> Self {
        self.contract_number = contract.into();
        self
    }

    pub fn serial_number(&self) -> &str {
        &self.base.serial_number
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let mut fields = BTreeMap::new();
        self.base.write_fields(&mut fields);
        fields.insert("description", json!(self.base.description));
        if !self.contract_number.is_empty() {
            fields.insert("contractNumber", json!(self.contract_number));
        }
        sorted(fields)
    }
}

impl BaseFields for ProductUnit {
    fn base_mut(&mut self) -> &mut UnitBase {
        &mut self.base
    }
}

/// A license registration code to redeem under `/licenses/register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseUnit {
    pub base: UnitBase,
    pub license_registration_code: String,
}

impl LicenseUnit {
    /// Registration code is mandatory; the serial number is optional.
    pub fn new(registration_code: impl Into<String>) -> Result<Self> {
        let license_registration_code = registration_code.into();
        if license_registration_code.trim().is_empty() {
            return Err(ApiError::InvalidArgument("License registration code is empty".to_string()));
        }
        Ok(Self {
            base: UnitBase::default(),
            license_registration_code,
        })
    }

    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.base.serial_number = serial.into();
        self
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let mut fields = BTreeMap::new();
        self.base.write_fields(&mut fields);
        if !self.base.description.is_empty() {
            fields.insert("description", json!(self.base.description));
        }
        fields.insert("licenseRegistrationCode", json!(self.license_registration_code));
        sorted(fields)
    }
}

impl BaseFields for LicenseUnit {
    fn base_mut(&mut self) -> &mut UnitBase {
        &mut self.base
    }
}

/// A subscription contract (e.g. VM-S) to register under `/services/register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub contract_number: String,
    pub description: String,
    pub is_government: bool,
    pub additional_info: String,
}

impl ServiceUnit {
    /// Contract number is mandatory.
    pub fn new(contract_number: impl Into<String>) -> Result<Self> {
        let contract_number = contract_number.into();
        if contract_number.trim().is_empty() {
            return Err(ApiError::InvalidArgument("Contract number is empty".to_string()));
        }
        Ok(Self {
            contract_number,
            description: String::new(),
            is_government: false,
            additional_info: String::new(),
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn government(mut self, is_government: bool) -> Self {
        self.is_government = is_government;
        self
    }

    pub fn additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = info.into();
        self
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        let mut fields = BTreeMap::new();
        fields.insert("contractNumber", json!(self.contract_number));
        fields.insert("isGovernment", json!(self.is_government));
        if !self.description.is_empty() {
            fields.insert("description", json!(self.description));
        }
        if !self.additional_info.is_empty() {
            fields.insert("additionalInfo", json!(self.additional_info));
        }
        sorted(fields)
    }
}

/// Any of the three registration payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationUnit {
    License(LicenseUnit),
    Product(ProductUnit),
    Service(ServiceUnit),
}

impl RegistrationUnit {
    pub fn endpoint(&self) -> &'static str {
        match self {
            RegistrationUnit::License(_) => "/licenses/register",
            RegistrationUnit::Product(_) => "/products/register",
            RegistrationUnit::Service(_) => "/services/register",
        }
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        match self {
            RegistrationUnit::License(unit) => unit.to_wire(),
            RegistrationUnit::Product(unit) => unit.to_wire(),
            RegistrationUnit::Service(unit) => unit.to_wire(),
        }
    }
}

impl From<LicenseUnit> for RegistrationUnit {
    fn from(unit: LicenseUnit) -> Self {
        RegistrationUnit::License(unit)
    }
}

impl From<ProductUnit> for RegistrationUnit {
    fn from(unit: ProductUnit) -> Self {
        RegistrationUnit::Product(unit)
    }
}

impl From<ServiceUnit> for RegistrationUnit {
    fn from(unit: ServiceUnit) -> Self {
        RegistrationUnit::Service(unit)
    }
}

impl fmt::Display for RegistrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationUnit::License(unit) => {
                write!(f, "LicenseRegistrationUnit(code={})", unit.license_registration_code)
            }
            RegistrationUnit::Product(unit) => {
                write!(f, "ProductRegistrationUnit(sn={})", unit.base.serial_number)
            }
            RegistrationUnit::Service(unit) => {
                write!(f, "ServiceRegistrationUnit(contract={})", unit.contract_number)
            }
        }
    }
}
