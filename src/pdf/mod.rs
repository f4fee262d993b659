//! Vector PDF export: layout, then paint every page with lopdf.

mod fonts;
mod logo;
mod surface;

pub use fonts::{FontProgram, FontSet, FontSource};
pub use logo::logo_data_uri;
pub use surface::{paint, PdfSurface, Surface};

use std::path::Path;

use log::info;

use crate::error::Result;
use crate::layout::{theme, LayoutEngine};
use crate::model::InvoiceData;

/// Renders `data` into PDF bytes. Nothing touches the filesystem, so a
/// failed render leaves no partial file behind.
pub fn render_to_pdf(data: &InvoiceData, fonts: &FontSet) -> Result<Vec<u8>> {
    let pages = LayoutEngine::new(fonts).layout(data);
    let title = match data.invoice_number.trim() {
        "" => "Invoice".to_string(),
        number => format!("Invoice {number}"),
    };

    let mut surface = PdfSurface::new(fonts, &title);
    paint(&mut surface, &pages, theme::PAGE)?;
    surface.finish()
}

/// `invoice-{number}.pdf`, or `invoice-draft.pdf` without a number.
pub fn pdf_filename(data: &InvoiceData) -> String {
    let number: String = data
        .invoice_number
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    if number.is_empty() {
        "invoice-draft.pdf".to_string()
    } else {
        format!("invoice-{number}.pdf")
    }
}

/// Writes finished PDF bytes, creating the parent directory if needed.
pub fn write_pdf(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
