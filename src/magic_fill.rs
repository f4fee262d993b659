//! Magic Fill: turn free text into invoice fields.
//!
//! The extraction itself happens in an external service. This module sends
//! the text, validates whatever comes back and hands a typed
//! [`ExtractedInvoice`] to the merge in [`crate::model`].

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde_json::{json, Value};
use ureq::Agent;

use crate::error::{InvoiceError, Result};
use crate::model::{apply_extracted_fields, ExtractedInvoice, InvoiceData};

pub trait Extractor {
    fn extract(&self, text: &str) -> Result<ExtractedInvoice>;
}

/// POSTs `{"text": ...}` to an extraction endpoint.
pub struct HttpExtractor {
    endpoint: String,
    agent: Agent,
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }
}

impl Extractor for HttpExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedInvoice> {
        let text = validate_text(text)?;
        debug!("Magic Fill: sending {} chars to {}", text.len(), self.endpoint);

        let mut response = self
            .agent
            .post(&self.endpoint)
            .send_json(json!({ "text": text }))
            .map_err(|e| InvoiceError::MagicFillRequest(e.to_string()))?;
        let status = response.status();
        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| InvoiceError::MagicFillResponse(e.to_string()))?;

        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(InvoiceError::MagicFillRequest(message.to_string()));
        }
        if !status.is_success() {
            return Err(InvoiceError::MagicFillRequest(format!(
                "{} returned {status}",
                self.endpoint
            )));
        }
        ExtractedInvoice::from_json(&body)
    }
}

/// Reads a previously saved extraction reply instead of calling a service.
pub struct JsonFileExtractor {
    path: PathBuf,
}

impl JsonFileExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Extractor for JsonFileExtractor {
    /// The text is ignored; the saved reply is the extraction.
    fn extract(&self, _text: &str) -> Result<ExtractedInvoice> {
        let content = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| InvoiceError::MagicFillResponse(format!("{}: {e}", self.path.display())))?;
        ExtractedInvoice::from_json(&value)
    }
}

fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InvoiceError::EmptyFillText);
    }
    Ok(text)
}

/// Extracts from `text` and merges the result into `current`.
///
/// On any error `current` is untouched; the caller keeps its invoice.
pub fn magic_fill(
    extractor: &dyn Extractor,
    current: &InvoiceData,
    text: &str,
) -> Result<InvoiceData> {
    let extracted = extractor.extract(text)?;
    if extracted.is_empty() {
        info!("Magic Fill found nothing to apply");
    }
    Ok(apply_extracted_fields(current, &extracted))
}
