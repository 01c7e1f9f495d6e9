use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    pub address: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gstin: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InvoiceSettings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Digits the sequence number is zero-padded to
    #[serde(default = "default_number_width")]
    pub number_width: usize,
    pub currency_symbol: String,
    pub due_days: u32,
    #[serde(default)]
    pub tax_rate: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExportSettings {
    pub output_dir: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: "exports".to_string(),
        }
    }
}

fn default_prefix() -> String {
    "INV-".to_string()
}

fn default_number_width() -> usize {
    10
}
