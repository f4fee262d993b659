mod extract;
mod invoice;
mod item;
mod party;
mod record;

pub use extract::{apply_extracted_fields, ExtractedInvoice, ExtractedItem, ExtractedParty};
pub use invoice::{generate_invoice_number, parse_date, InvoiceData, DEFAULT_DUE_DAYS};
pub use item::{generate_id, LineItem};
pub use party::PartyInfo;
pub use record::{InvoiceRecord, InvoiceStatus};
