use std::path::Path;
use std::time::Duration;

use chrono::{Duration as Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::expand_path;
use crate::error::Result;
use crate::model::{InvoiceData, PartyInfo, DEFAULT_DUE_DAYS};
use crate::pdf::FontSource;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Owner of every record this CLI writes.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
    #[serde(default)]
    pub magic_fill: MagicFillSettings,
}

/// Defaults copied into the "from" block of new invoices.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Sender {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InvoiceSettings {
    #[serde(default = "default_due_days")]
    pub due_days: u32,
    /// Percent, e.g. 8.25.
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            due_days: default_due_days(),
            tax_rate: None,
            notes: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PdfSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_timeout_secs")]
    pub render_timeout_secs: u64,
    #[serde(default)]
    pub regular_font: Option<String>,
    #[serde(default)]
    pub regular_font_url: Option<String>,
    #[serde(default)]
    pub bold_font: Option<String>,
    #[serde(default)]
    pub bold_font_url: Option<String>,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            render_timeout_secs: default_timeout_secs(),
            regular_font: None,
            regular_font_url: None,
            bold_font: None,
            bold_font_url: None,
        }
    }
}

impl PdfSettings {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs.max(1))
    }

    /// Regular and bold font sources, relative paths resolved against
    /// `config_dir`.
    pub fn font_sources(&self, config_dir: &Path) -> (FontSource, FontSource) {
        let source = |path: &Option<String>, url: &Option<String>| FontSource {
            path: path.as_deref().map(|p| resolve(config_dir, p)),
            url: url.clone().filter(|u| !u.trim().is_empty()),
        };
        (
            source(&self.regular_font, &self.regular_font_url),
            source(&self.bold_font, &self.bold_font_url),
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MagicFillSettings {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MagicFillSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MagicFillSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            sender: Sender::default(),
            invoice: InvoiceSettings::default(),
            pdf: PdfSettings::default(),
            magic_fill: MagicFillSettings::default(),
        }
    }
}

impl Config {
    /// A fresh invoice with the configured sender, due days, tax and notes.
    /// A configured tax rate outside 0..=100 is rejected.
    pub fn new_invoice(&self, today: NaiveDate) -> Result<InvoiceData> {
        let mut data = InvoiceData::new_default(today).with_sender(PartyInfo {
            name: self.sender.name.clone(),
            email: self.sender.email.clone(),
            address: self.sender.address.clone(),
            phone: self.sender.phone.clone(),
        });
        data.due_date = Some(today + Days::days(i64::from(self.invoice.due_days)));
        data.set_tax(self.invoice.tax_rate.filter(|rate| *rate != 0.0))?;
        data.notes = self
            .invoice
            .notes
            .clone()
            .filter(|notes| !notes.trim().is_empty());
        Ok(data)
    }
}

pub(super) fn resolve(config_dir: &Path, path: &str) -> std::path::PathBuf {
    let expanded = expand_path(path);
    if expanded.is_relative() {
        config_dir.join(expanded)
    } else {
        expanded
    }
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_due_days() -> u32 {
    DEFAULT_DUE_DAYS as u32
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
