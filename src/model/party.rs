use serde::{Deserialize, Serialize};

/// Sender or recipient details. Every field is optional at this level;
/// blanks are replaced by placeholders only when the invoice is displayed.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PartyInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PartyInfo {
    /// The name, or `placeholder` when it is blank.
    pub fn display_name<'a>(&'a self, placeholder: &'a str) -> &'a str {
        non_blank(&self.name).unwrap_or(placeholder)
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn address(&self) -> Option<&str> {
        non_blank(&self.address)
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().and_then(non_blank)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
