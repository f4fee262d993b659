use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::LineItem;
use super::party::PartyInfo;
use crate::error::{InvoiceError, Result};

/// Days between issue date and due date for a fresh invoice.
pub const DEFAULT_DUE_DAYS: i64 = 30;

/// The invoice document being edited.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default, with = "date_field")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, with = "date_field")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub sender: PartyInfo,
    #[serde(default)]
    pub recipient: PartyInfo,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Tax rate in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    /// Logo as a `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl InvoiceData {
    /// A blank invoice dated `today`, due in 30 days, with one empty row.
    pub fn new_default(today: NaiveDate) -> Self {
        Self {
            invoice_number: generate_invoice_number(today),
            issue_date: Some(today),
            due_date: Some(today + Duration::days(DEFAULT_DUE_DAYS)),
            sender: PartyInfo::default(),
            recipient: PartyInfo::default(),
            items: vec![LineItem::empty()],
            notes: None,
            tax: None,
            logo: None,
        }
    }

    /// A copy under a new number, with fresh item ids and default dates.
    pub fn duplicate(&self, today: NaiveDate) -> Self {
        let fresh = Self::new_default(today);
        Self {
            invoice_number: fresh.invoice_number,
            issue_date: fresh.issue_date,
            due_date: fresh.due_date,
            items: self.items.iter().map(LineItem::with_new_id).collect(),
            ..self.clone()
        }
    }

    /// Replaces the sender block, e.g. with configured defaults.
    pub fn with_sender(mut self, sender: PartyInfo) -> Self {
        self.sender = sender;
        self
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Removes the item at `index` (0-based). The last remaining item is kept.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem> {
        if index >= self.items.len() {
            return Err(InvoiceError::InvalidItemIndex {
                index: index + 1,
                count: self.items.len(),
            });
        }
        if self.items.len() == 1 {
            return Err(InvoiceError::LastItem);
        }
        Ok(self.items.remove(index))
    }

    pub fn set_tax(&mut self, tax: Option<f64>) -> Result<()> {
        if let Some(rate) = tax {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(InvoiceError::InvalidTaxRate(rate));
            }
        }
        self.tax = tax;
        Ok(())
    }

    /// Notes with surrounding whitespace removed, if there are any.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }
}

/// `INV-YYMM-NNNN` with a random four-digit suffix.
pub fn generate_invoice_number(today: NaiveDate) -> String {
    let suffix = rand::rng().random_range(0..10_000);
    format!("INV-{}-{:04}", today.format("%y%m"), suffix)
}

/// Parses `YYYY-MM-DD`, tolerating a trailing time part (`2026-03-05T00:00:00Z`).
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|err| match value.get(..10) {
            Some(prefix) if value.len() > 10 => NaiveDate::parse_from_str(prefix, "%Y-%m-%d"),
            _ => Err(err),
        })
        .map_err(|_| InvoiceError::InvalidDate(value.to_string()))
}

/// Dates travel as `YYYY-MM-DD`; the empty string means "not set".
mod date_field {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_date(value).map(Some).map_err(de::Error::custom),
        }
    }
}
