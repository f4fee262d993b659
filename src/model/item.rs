use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{InvoiceError, Result};
use crate::money::item_amount;

/// One billable row.
///
/// `amount` is derived from `quantity * rate` and can only change through
/// [`LineItem::set_quantity`] and [`LineItem::set_rate`]. A stored
/// `amount` is ignored on read and recomputed from the inputs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(from = "StoredLineItem")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    quantity: Option<f64>,
    rate: Option<f64>,
    amount: f64,
}

/// The wire shape of a [`LineItem`].
#[derive(Deserialize)]
struct StoredLineItem {
    #[serde(default = "generate_id")]
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    rate: Option<f64>,
}

impl From<StoredLineItem> for LineItem {
    fn from(stored: StoredLineItem) -> Self {
        Self {
            amount: item_amount(stored.quantity, stored.rate),
            id: stored.id,
            description: stored.description,
            quantity: stored.quantity,
            rate: stored.rate,
        }
    }
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Option<f64>, rate: Option<f64>) -> Self {
        Self {
            id: generate_id(),
            description: description.into(),
            quantity,
            rate,
            amount: item_amount(quantity, rate),
        }
    }

    /// Parses `description:quantity:rate`. The description may itself
    /// contain colons; quantity and rate are the last two fields.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let mut parts = spec.rsplitn(3, ':');
        let (Some(rate), Some(quantity), Some(description)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(InvoiceError::InvalidItemFormat(spec.to_string()));
        };
        let description = description.trim();
        if description.is_empty() {
            return Err(InvoiceError::InvalidItemFormat(spec.to_string()));
        }

        let number = |field: &'static str, raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .ok_or_else(|| InvoiceError::InvalidQuantity {
                    item: description.to_string(),
                    field,
                    value: raw.to_string(),
                })
        };
        Ok(Self::new(
            description,
            Some(number("quantity", quantity)?),
            Some(number("rate", rate)?),
        ))
    }

    /// A blank row as the editor adds it: quantity 1, no rate yet.
    pub fn empty() -> Self {
        Self::new("", Some(1.0), None)
    }

    pub fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_quantity(&mut self, quantity: Option<f64>) {
        self.quantity = quantity;
        self.amount = item_amount(self.quantity, self.rate);
    }

    pub fn set_rate(&mut self, rate: Option<f64>) {
        self.rate = rate;
        self.amount = item_amount(self.quantity, self.rate);
    }

    /// Same content under a fresh id.
    pub fn with_new_id(&self) -> Self {
        Self {
            id: generate_id(),
            ..self.clone()
        }
    }
}

/// Nine random base-36 characters, unique enough within one invoice.
pub fn generate_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_item_spec() {
        let item = LineItem::from_spec("Design: phase 1:8:95.5").unwrap();
        assert_eq!(item.description, "Design: phase 1");
        assert_eq!(item.quantity(), Some(8.0));
        assert_eq!(item.amount(), 764.0);
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(matches!(
            LineItem::from_spec("Design:8"),
            Err(InvoiceError::InvalidItemFormat(_))
        ));
        assert!(matches!(
            LineItem::from_spec("Design:-1:10"),
            Err(InvoiceError::InvalidQuantity { field: "quantity", .. })
        ));
        assert!(matches!(
            LineItem::from_spec(":1:10"),
            Err(InvoiceError::InvalidItemFormat(_))
        ));
    }

    #[test]
    fn setters_keep_amount_in_sync() {
        let mut item = LineItem::empty();
        assert_eq!(item.amount(), 0.0);
        item.set_rate(Some(40.0));
        item.set_quantity(Some(2.5));
        assert_eq!(item.amount(), 100.0);
        assert_eq!(item.id.len(), 9);
    }

    #[test]
    fn stored_amount_is_recomputed_on_read() {
        let items: Vec<LineItem> = serde_json::from_str(
            r#"[
                { "id": "a1", "quantity": 2, "rate": 3, "amount": 999 },
                { "id": "b2", "quantity": 2, "rate": 3 },
                { "rate": 5 }
            ]"#,
        )
        .unwrap();

        assert_eq!(items[0].amount(), 6.0);
        assert_eq!(items[1].amount(), 6.0);
        assert_eq!(items[2].amount(), 0.0);
        assert_eq!(items[2].id.len(), 9);
        assert_eq!(crate::money::subtotal(&items), 12.0);
    }
}
