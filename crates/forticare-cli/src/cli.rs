//! Command-line interface definition and argument parsing

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

/// Command-line arguments for forticare
#[derive(Parser, Debug)]
#[command(
    name = "forticare",
    about = "Manage FortiCare assets, licenses and entitlements",
    version
)]
pub struct Cli {
    /// API user (IAM API user ID)
    #[arg(long, short, global = true, env = "FORTICARE_API_USER")]
    pub user: Option<String>,

    /// Never log in implicitly; use the token saved by `forticare login`
    #[arg(long, global = true)]
    pub no_auto_login: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the credentials and optionally remember them
    Login {
        /// Store the API key in the OS keychain and the user in the config file
        #[arg(long)]
        save: bool,
    },

    /// Forget the stored API key and the saved token
    Logout,

    /// List products
    Products {
        /// Support expiration bound (YYYY-MM-DD), ten years from now by default
        #[arg(long, value_parser = parse_date)]
        expire_before: Option<NaiveDateTime>,

        /// Serial number or search pattern
        #[arg(long)]
        serial: Option<String>,

        /// Product model name
        #[arg(long)]
        model: Option<String>,

        /// List pending products instead of registered ones
        #[arg(long)]
        pending: bool,
    },

    /// Show the details of a product
    Product {
        serial: String,
    },

    /// Register a product
    RegisterProduct {
        serial: String,

        #[arg(long)]
        contract: Option<String>,

        #[arg(long)]
        cloud_key: Option<String>,

        #[arg(long)]
        folder_id: Option<i64>,

        /// Serial number of the product this one replaces
        #[arg(long)]
        replaced_serial: Option<String>,

        #[command(flatten)]
        details: UnitDetails,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Register a subscription contract
    RegisterService {
        contract: String,

        #[command(flatten)]
        details: UnitDetails,
    },

    /// Redeem a license registration code
    RegisterLicense {
        code: String,

        /// Serial number to attach the license to
        #[arg(long)]
        serial: Option<String>,

        #[command(flatten)]
        details: UnitDetails,
    },

    /// List licenses
    Licenses {
        #[arg(long)]
        serial: Option<String>,

        #[arg(long)]
        sku: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Download a license key file
    DownloadLicense {
        serial: String,

        /// Write the file here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List FlexVM entitlements of a program
    Entitlements {
        program_serial: String,

        #[arg(long)]
        config_id: Option<i64>,

        #[arg(long)]
        account_id: Option<i64>,
    },
}

/// Descriptive fields shared by every registration
#[derive(Args, Debug)]
pub struct UnitDetails {
    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub additional_info: String,

    /// Register for a government customer
    #[arg(long)]
    pub government: bool,
}

/// Location of a registered product; used only when an address is given
#[derive(Args, Debug)]
pub struct LocationArgs {
    #[arg(long, requires_all = ["postal_code", "country_code"])]
    pub address: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    #[arg(long)]
    pub country_code: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {}", value))
}
