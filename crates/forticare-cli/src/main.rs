//! forticare - command-line client for the FortiCare asset management API.
//!
//! Every command prints its result as pretty JSON on stdout; logs go to
//! stderr and, with `--log-dir`, to a daily rolling file.

mod cli;

use std::io;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, TimeDelta};
use clap::Parser;
use serde_json::json;
use tracing::{debug, info, info_span, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forticare_core::models::Asset;
use forticare_core::{
    ApiClient, BaseFields, Config, CredentialStore, EntitlementQuery, LicenseQuery, LicenseUnit,
    Location, ProductQuery, ProductStatus, ProductUnit, RegistrationUnit, ServiceUnit, SessionStore,
};

use cli::{Cli, Commands, LocationArgs, UnitDetails};

/// Default product listing window when `--expire-before` is omitted
const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 3650;

const LOG_FILE_PREFIX: &str = "forticare.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file when dropped.
fn init_tracing(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    let mut config = Config::load()?;
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Ok(url) = std::env::var("FORTICARE_API_URL") {
        config.api_url = Some(url);
    }
    if let Ok(url) = std::env::var("FORTICARE_OAUTH_URL") {
        config.oauth_url = Some(url);
    }

    let user = cli
        .user
        .clone()
        .or_else(|| config.api_user.clone())
        .ok_or_else(|| anyhow!("No API user: pass --user or set FORTICARE_API_USER"))?;

    let auto_login = config.auto_login && !cli.no_auto_login;
    let api_key = match cli.command {
        Commands::Logout => String::new(),
        Commands::Login { .. } => resolve_api_key(&user)?,
        // Without auto-login the saved token is all that is used
        _ if !auto_login => resolve_api_key(&user).unwrap_or_default(),
        _ => resolve_api_key(&user)?,
    };
    let mut client = ApiClient::builder()
        .config(config.client_config())
        .credentials(user.clone(), api_key.clone())
        .auto_login(auto_login)
        .span(info_span!("forticare", user = %user))
        .build()?;

    // Reuse the token of a previous run; required when auto-login is off
    let store = SessionStore::default_location()?;
    if !matches!(cli.command, Commands::Logout) {
        match store.restore(client.session_mut()) {
            Ok(true) => debug!(user = %user, "Reusing saved token"),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, path = %store.path().display(), "Ignoring unreadable session file")
            }
        }
    }
    let saved_token = client.session().token().map(str::to_string);

    let result = run(&mut client, &mut config, &store, cli.command, &user, &api_key).await;

    if client.session().token() != saved_token.as_deref() {
        store.persist(client.session())?;
    }
    result
}

/// API key from `FORTICARE_API_KEY`, then from the OS keychain
fn resolve_api_key(user: &str) -> Result<String> {
    if let Ok(key) = std::env::var("FORTICARE_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    debug!(user, "FORTICARE_API_KEY unset, reading keychain");
    if !CredentialStore::has_api_key(user)? {
        bail!(
            "No API key for {}: set FORTICARE_API_KEY or run `forticare login --save`",
            user
        );
    }
    CredentialStore::get_api_key(user)
}

async fn run(
    client: &mut ApiClient,
    config: &mut Config,
    store: &SessionStore,
    command: Commands,
    user: &str,
    api_key: &str,
) -> Result<()> {
    match command {
        Commands::Login { save } => {
            if !client.login(user, api_key).await? {
                return Err(anyhow!("Login failed for {}", user));
            }
            info!(user, "Logged in");
            if save {
                CredentialStore::store(user, api_key)?;
                config.api_user = Some(user.to_string());
                config.save()?;
            }
            println!("{}", client.session());
        }
        Commands::Logout => {
            store.clear()?;
            if CredentialStore::delete(user)? {
                println!("Removed stored API key for {}", user);
            } else {
                println!("No API key stored for {}", user);
            }
        }
        Commands::Products {
            expire_before,
            serial,
            model,
            pending,
        } => {
            let expire_before = expire_before.unwrap_or_else(|| {
                Local::now().naive_local() + TimeDelta::days(DEFAULT_EXPIRY_WINDOW_DAYS)
            });
            let mut query = ProductQuery::new(expire_before)
                .serial_number(serial.unwrap_or_default())
                .product_model(model.unwrap_or_default());
            if pending {
                query = query.status(ProductStatus::Pending);
            }
            print_json(&client.get_products(&query).await?)?;
        }
        Commands::Product { serial } => {
            print_json(&client.get_product_details(&serial).await?)?;
        }
        Commands::RegisterProduct {
            serial,
            contract,
            cloud_key,
            folder_id,
            replaced_serial,
            details,
            location,
        } => {
            let mut unit = ProductUnit::new(serial.clone())?
                .contract_number(contract.unwrap_or_default())
                .cloud_key(cloud_key.unwrap_or_default())
                .replaced_serial_number(replaced_serial.unwrap_or_default());
            if let Some(folder_id) = folder_id {
                unit = unit.folder_id(folder_id);
            }
            let unit = with_details(unit, details);
            let locations: Vec<(String, Location)> = to_location(location)
                .map(|location| vec![(serial, location)])
                .unwrap_or_default();
            let assets = register(client, unit.into(), &locations).await?;
            print_json(&assets)?;
        }
        Commands::RegisterService { contract, details } => {
            let unit = ServiceUnit::new(contract)?
                .description(details.description)
                .additional_info(details.additional_info)
                .government(details.government);
            let assets = register(client, unit.into(), &[]).await?;
            print_json(&assets)?;
        }
        Commands::RegisterLicense {
            code,
            serial,
            details,
        } => {
            let unit = LicenseUnit::new(code)?.serial_number(serial.unwrap_or_default());
            let unit = with_details(unit, details);
            let assets = register(client, unit.into(), &[]).await?;
            print_json(&assets)?;
        }
        Commands::Licenses { serial, sku, status } => {
            let query = LicenseQuery::default()
                .serial_number(serial.unwrap_or_default())
                .license_sku(sku.unwrap_or_default())
                .status(status.unwrap_or_default());
            print_json(&client.get_licenses(&query).await?)?;
        }
        Commands::DownloadLicense { serial, output } => {
            let file = client.download_license(&serial).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &file)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    print_json(&json!({ "serialNumber": serial, "file": path }))?;
                }
                None => println!("{}", file),
            }
        }
        Commands::Entitlements {
            program_serial,
            config_id,
            account_id,
        } => {
            let query = EntitlementQuery::new(program_serial)
                .config_id(config_id.unwrap_or_default())
                .account_id(account_id.unwrap_or_default());
            print_json(&client.get_entitlements(&query).await?)?;
        }
    }
    Ok(())
}

/// Send a registration unit to its endpoint
async fn register(
    client: &mut ApiClient,
    unit: RegistrationUnit,
    locations: &[(String, Location)],
) -> Result<Vec<Asset>> {
    info!(%unit, endpoint = unit.endpoint(), "Registering");
    let assets = match unit {
        RegistrationUnit::Product(unit) => client.register_products(&[unit], locations).await?,
        RegistrationUnit::License(unit) => client.register_license(&unit).await?,
        RegistrationUnit::Service(unit) => vec![client.register_service(&unit).await?],
    };
    Ok(assets)
}

fn with_details<U: BaseFields>(unit: U, details: UnitDetails) -> U {
    unit.description(details.description)
        .additional_info(details.additional_info)
        .government(details.government)
}

fn to_location(args: LocationArgs) -> Option<Location> {
    let address = args.address?;
    let mut location = Location::new(
        address,
        args.postal_code.unwrap_or_default(),
        args.country_code.unwrap_or_default(),
    );
    if let Some(company) = args.company {
        location = location.company(company);
    }
    if let Some(city) = args.city {
        location = location.city(city);
    }
    if let Some(state) = args.state {
        location = location.state_or_province(state);
    }
    Some(location)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
