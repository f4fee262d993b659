//! Magic Fill results and how they merge into an invoice.
//!
//! The extraction service returns loosely shaped JSON. Nothing from it is
//! trusted: [`ExtractedInvoice::from_json`] keeps only fields of the expected
//! type and logs everything it drops.

use chrono::NaiveDate;
use log::warn;
use serde_json::{Map, Value};

use super::invoice::{parse_date, InvoiceData};
use super::item::LineItem;
use super::party::PartyInfo;
use crate::error::{InvoiceError, Result};

/// Party fields the service managed to extract; `None` means "keep mine".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedParty {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    pub description: String,
    pub quantity: Option<f64>,
    pub rate: Option<f64>,
}

/// A validated, partial invoice proposed by Magic Fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedInvoice {
    pub sender: Option<ExtractedParty>,
    pub recipient: Option<ExtractedParty>,
    pub items: Option<Vec<ExtractedItem>>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ExtractedInvoice {
    /// Validates an untrusted extraction payload field by field.
    ///
    /// Only a non-object top level is an error; any malformed field is
    /// dropped and the rest is kept.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            InvoiceError::MagicFillResponse("expected a JSON object".to_string())
        })?;

        Ok(Self {
            sender: party_field(obj, "sender"),
            recipient: party_field(obj, "recipient"),
            items: items_field(obj),
            issue_date: date_field(obj, "issueDate"),
            due_date: date_field(obj, "dueDate"),
            notes: string_field(obj, "notes"),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            warn!("Magic Fill: ignoring non-string '{key}': {other}");
            None
        }
    }
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match obj.get(key) {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(n) if n.is_finite() && n >= 0.0 => Some(n),
        _ => {
            warn!("Magic Fill: ignoring invalid number '{key}': {:?}", obj.get(key));
            None
        }
    }
}

fn date_field(obj: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = string_field(obj, key)?;
    match parse_date(&raw) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Magic Fill: ignoring unparseable date '{key}': {raw}");
            None
        }
    }
}

fn party_field(obj: &Map<String, Value>, key: &str) -> Option<ExtractedParty> {
    let party = match obj.get(key)? {
        Value::Object(party) => party,
        Value::Null => return None,
        other => {
            warn!("Magic Fill: ignoring non-object '{key}': {other}");
            return None;
        }
    };
    let extracted = ExtractedParty {
        name: string_field(party, "name"),
        email: string_field(party, "email"),
        address: string_field(party, "address"),
        phone: string_field(party, "phone"),
    };
    (extracted != ExtractedParty::default()).then_some(extracted)
}

fn items_field(obj: &Map<String, Value>) -> Option<Vec<ExtractedItem>> {
    let raw = match obj.get("items")? {
        Value::Array(items) => items,
        Value::Null => return None,
        other => {
            warn!("Magic Fill: ignoring non-array 'items': {other}");
            return None;
        }
    };

    let items = raw
        .iter()
        .filter_map(|entry| {
            let Value::Object(item) = entry else {
                warn!("Magic Fill: ignoring non-object item: {entry}");
                return None;
            };
            let description = string_field(item, "description").unwrap_or_default();
            let quantity = number_field(item, "quantity");
            let rate = number_field(item, "rate");
            if description.is_empty() && quantity.is_none() && rate.is_none() {
                warn!("Magic Fill: ignoring empty item: {entry}");
                return None;
            }
            Some(ExtractedItem {
                description,
                quantity,
                rate,
            })
        })
        .collect();
    Some(items)
}

fn merge_party(current: &PartyInfo, extracted: &ExtractedParty) -> PartyInfo {
    PartyInfo {
        name: extracted.name.clone().unwrap_or_else(|| current.name.clone()),
        email: extracted.email.clone().unwrap_or_else(|| current.email.clone()),
        address: extracted
            .address
            .clone()
            .unwrap_or_else(|| current.address.clone()),
        phone: extracted.phone.clone().or_else(|| current.phone.clone()),
    }
}

/// Merges a Magic Fill result into `current`.
///
/// Party fields merge one by one, extracted values winning. A non-empty item
/// list replaces the current items wholesale; an empty or missing one leaves
/// them alone. Dates and notes overwrite when present.
pub fn apply_extracted_fields(current: &InvoiceData, extracted: &ExtractedInvoice) -> InvoiceData {
    let mut updated = current.clone();

    if let Some(sender) = &extracted.sender {
        updated.sender = merge_party(&current.sender, sender);
    }
    if let Some(recipient) = &extracted.recipient {
        updated.recipient = merge_party(&current.recipient, recipient);
    }
    if let Some(items) = extracted.items.as_ref().filter(|items| !items.is_empty()) {
        updated.items = items
            .iter()
            .map(|item| LineItem::new(item.description.clone(), item.quantity, item.rate))
            .collect();
    }
    if let Some(issue_date) = extracted.issue_date {
        updated.issue_date = Some(issue_date);
    }
    if let Some(due_date) = extracted.due_date {
        updated.due_date = Some(due_date);
    }
    if let Some(notes) = &extracted.notes {
        updated.notes = Some(notes.clone());
    }

    updated
}
