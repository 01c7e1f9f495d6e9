mod company;
mod customer;
mod product;
mod state;

pub use company::{Company, Config, ExportSettings, InvoiceSettings};
pub use customer::Customer;
pub use product::Product;
pub use state::{ArchivedInvoice, CustomerReply, State};

use crate::error::{BillingError, Result};
use directories::ProjectDirs;
use fs4::fs_std::FileExt;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.billsync/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "billsync") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.billsync/
    let home = dirs_home().ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".billsync"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the export directory; relative paths are taken from the config dir
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

fn load_toml<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    if !path.exists() {
        return Err(BillingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    load_toml(config_dir.join("config.toml"))
}

/// Load customers.toml keyed by customer id
pub fn load_customers(config_dir: &Path) -> Result<BTreeMap<String, Customer>> {
    load_toml(config_dir.join("customers.toml"))
}

/// Load products.toml keyed by product id
pub fn load_products(config_dir: &Path) -> Result<BTreeMap<String, Product>> {
    load_toml(config_dir.join("products.toml"))
}

/// Load state.toml (empty book if missing)
pub fn load_state(config_dir: &Path) -> Result<State> {
    let path = config_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })
}

/// Save state.toml by writing a sibling file and renaming it over the old one
pub fn save_state(config_dir: &Path, state: &State) -> Result<()> {
    let path = config_dir.join("state.toml");
    let content = toml::to_string_pretty(state).map_err(|e| BillingError::Serialize {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let staging = path.with_extension("toml.tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, &path)?;
    Ok(())
}

/// Lock file guarding state.toml and the number pool
pub const LOCK_FILE: &str = ".billsync.lock";

/// Exclusive hold on the books in a config directory. Dropping it unlocks.
#[derive(Debug)]
pub struct BookLock {
    _file: File,
}

/// Block until no other writer holds the books in `config_dir`
pub fn lock_book(config_dir: &Path) -> Result<BookLock> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(config_dir.join(LOCK_FILE))?;
    FileExt::lock_exclusive(&file)?;
    Ok(BookLock { _file: file })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Your Company Name"
address = "12 Market Road, Pune"
email = "billing@yourcompany.com"
# phone = "+91-20-5555-0100"    # optional
# gstin = "27ABCDE1234F1Z5"      # optional

[invoice]
prefix = "INV-"
number_width = 10       # e.g., INV-0000000001
currency_symbol = "₹"
due_days = 30
tax_rate = 0.08         # 8%

[export]
output_dir = "exports"  # relative to this directory
"#;

/// Template content for customers.toml
pub const CUSTOMERS_TEMPLATE: &str = r#"# Define your customers here. The table name (e.g., [acme]) is used
# as the customer identifier in the create command.
#
# Example:
#   billsync create --customer acme --item widget:3

[example-customer]
name = "Example Traders"
email = "accounts@example.com"
phone = "+91-98765-43210"       # optional
address = "45 Park Street"      # optional
# company = "Example Traders Pvt Ltd"
# gstin = "29AAAAA0000A1Z5"
"#;

/// Template content for products.toml
pub const PRODUCTS_TEMPLATE: &str = r#"# Define your products here. The table name (e.g., [widget]) is used
# as the product identifier in the create command. purchase_price is
# the unit cost used for profit reporting; leave it out when unknown.
# stock_quantity and min_stock_level (default 10) feed the stock report.
#
# Example:
#   billsync create --customer acme --item widget:3 --item service:1

[widget]
name = "Steel Widget"
sku = "WID-001"
category = "Hardware"
price = 250.00
purchase_price = 180.00
unit = "piece"
stock_quantity = 40
min_stock_level = 10    # 'billsync stock' warns at or below this

[cable]
name = "Copper Cable (10m)"
sku = "CAB-010"
category = "Electrical"
price = 900.00
purchase_price = 620.00
unit = "roll"
stock_quantity = 4
min_stock_level = 10

# No stock_quantity: services are not stock-tracked
[service]
name = "Installation Service"
sku = "SRV-001"
price = 1500.00
unit = "visit"
"#;
