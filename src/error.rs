use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Config directory not found at {0}. Run 'invoice init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Failed to read invoice history {path}: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invoice '{0}' not found in history")]
    InvoiceNotFound(String),

    #[error("Invalid invoice index '{0}'. Use 'invoice list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("An invoice needs at least one line item; the last item cannot be removed")]
    LastItem,

    #[error("Item {index} does not exist (invoice has {count} item(s))")]
    InvalidItemIndex { index: usize, count: usize },

    #[error("Invalid item format '{0}'. Expected 'description:quantity:rate' (e.g., 'Design work:8:95')")]
    InvalidItemFormat(String),

    #[error("Invalid {field} '{value}' for item '{item}': must be a non-negative number")]
    InvalidQuantity {
        item: String,
        field: &'static str,
        value: String,
    },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid tax rate {0}. Use a percentage between 0 and 100")]
    InvalidTaxRate(f64),

    #[error("Please provide text to parse")]
    EmptyFillText,

    #[error("Magic Fill endpoint is not configured. Set [magic_fill] endpoint in config.toml or use --json")]
    MagicFillNotConfigured,

    #[error("Magic Fill request failed: {0}")]
    MagicFillRequest(String),

    #[error("Magic Fill returned an unusable response: {0}")]
    MagicFillResponse(String),

    #[error("Failed to load font '{name}': {reason}")]
    FontFetch { name: String, reason: String },

    #[error("Font '{0}' is not a usable TrueType font")]
    FontParse(String),

    #[error("Logo image could not be decoded: {0}")]
    InvalidLogo(String),

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Rendering {invoice} did not finish within {seconds}s")]
    RenderTimeout { invoice: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
