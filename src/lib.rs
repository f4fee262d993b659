pub mod config;
pub mod error;
pub mod layout;
pub mod magic_fill;
pub mod model;
pub mod money;
pub mod pdf;
pub mod render;
pub mod store;

pub use config::Config;
pub use error::{InvoiceError, Result};
pub use layout::{LayoutEngine, Page};
pub use magic_fill::{magic_fill, Extractor, HttpExtractor, JsonFileExtractor};
pub use model::{apply_extracted_fields, InvoiceData, InvoiceRecord, InvoiceStatus, LineItem, PartyInfo};
pub use money::{compute_totals, format_currency, Totals};
pub use pdf::{pdf_filename, render_to_pdf, FontSet};
pub use render::RenderJob;
pub use store::{InvoiceStore, JsonFileStore};
