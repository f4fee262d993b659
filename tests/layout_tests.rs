use chrono::NaiveDate;
use invoice_studio::layout::{theme, DrawOp, LayoutEngine, Page};
use invoice_studio::model::{InvoiceData, LineItem, PartyInfo};
use invoice_studio::pdf::FontSet;

fn invoice_with_items(count: usize) -> InvoiceData {
    let mut data = InvoiceData::new_default(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    data.items = (1..=count)
        .map(|i| LineItem::new(format!("Item {i}"), Some(1.0), Some(10.0)))
        .collect();
    data
}

fn layout(data: &InvoiceData) -> Vec<Page> {
    let fonts = FontSet::builtin();
    LayoutEngine::new(&fonts).layout(data)
}

fn all_texts(pages: &[Page]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|page| page.texts().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

fn count_exact(pages: &[Page], needle: &str) -> usize {
    all_texts(pages).iter().filter(|t| *t == needle).count()
}

#[test]
fn short_invoice_fits_one_page_with_footer() {
    let pages = layout(&invoice_with_items(1));
    assert_eq!(pages.len(), 1);
    assert_eq!(count_exact(&pages, "Thank you for your business!"), 1);
    assert_eq!(count_exact(&pages, "INVOICE"), 1);
}

#[test]
fn twenty_items_paginate_and_each_appears_once() {
    let pages = layout(&invoice_with_items(20));
    assert!(pages.len() >= 2);
    assert_eq!(count_exact(&pages, "Item 1"), 1);
    assert_eq!(count_exact(&pages, "Item 20"), 1);
    // Footer is reserved for single-page invoices.
    assert_eq!(count_exact(&pages, "Thank you for your business!"), 0);
}

#[test]
fn items_keep_their_order_across_pages() {
    let count = 60;
    let pages = layout(&invoice_with_items(count));
    assert!(pages.len() >= 2);

    let items: Vec<String> = all_texts(&pages)
        .into_iter()
        .filter(|t| t.starts_with("Item "))
        .collect();
    let expected: Vec<String> = (1..=count).map(|i| format!("Item {i}")).collect();
    assert_eq!(items, expected);
}

#[test]
fn no_row_crosses_the_safe_bottom() {
    let pages = layout(&invoice_with_items(45));
    for page in &pages {
        for op in &page.ops {
            if let DrawOp::Rect(rect) = op {
                if rect.height == theme::ROW_HEIGHT || rect.height == theme::COMPACT_ROW_HEIGHT {
                    assert!(rect.y + rect.height <= theme::SAFE_BOTTOM);
                }
            }
        }
    }
}

#[test]
fn many_items_switch_to_compact_rows() {
    let zebra_heights = |pages: &[Page]| -> Vec<f32> {
        pages
            .iter()
            .flat_map(|page| page.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Rect(rect) if rect.fill == Some(theme::ZEBRA) => Some(rect.height),
                _ => None,
            })
            .collect()
    };

    let regular = zebra_heights(&layout(&invoice_with_items(24)));
    assert!(regular.iter().all(|h| *h == theme::ROW_HEIGHT));

    let compact = zebra_heights(&layout(&invoice_with_items(25)));
    assert!(compact.iter().all(|h| *h == theme::COMPACT_ROW_HEIGHT));
}

#[test]
fn tax_line_only_when_rate_is_positive() {
    let mut data = invoice_with_items(2);
    let has_tax_line = |pages: &[Page]| all_texts(pages).iter().any(|t| t.starts_with("Tax ("));

    assert!(!has_tax_line(&layout(&data)));

    data.tax = Some(0.0);
    assert!(!has_tax_line(&layout(&data)));

    data.tax = Some(7.5);
    let pages = layout(&data);
    assert_eq!(count_exact(&pages, "Tax (7.5%)"), 1);
    assert_eq!(count_exact(&pages, "$1.50"), 1);
    assert_eq!(count_exact(&pages, "$21.50"), 1);
}

#[test]
fn blank_parties_use_placeholders() {
    let pages = layout(&invoice_with_items(1));
    assert_eq!(count_exact(&pages, "Your Business"), 1);
    assert_eq!(count_exact(&pages, "Client Name"), 1);
}

#[test]
fn filled_parties_skip_empty_fields() {
    let mut data = invoice_with_items(1);
    data.sender = PartyInfo {
        name: "Acme".to_string(),
        email: "billing@acme.test".to_string(),
        address: String::new(),
        phone: Some("  ".to_string()),
    };
    let pages = layout(&data);
    assert_eq!(count_exact(&pages, "Acme"), 1);
    assert_eq!(count_exact(&pages, "billing@acme.test"), 1);
    assert_eq!(count_exact(&pages, "  "), 0);
}

#[test]
fn notes_are_drawn_only_when_present() {
    let mut data = invoice_with_items(1);
    assert_eq!(count_exact(&layout(&data), "NOTES"), 0);

    data.notes = Some("   ".to_string());
    assert_eq!(count_exact(&layout(&data), "NOTES"), 0);

    data.notes = Some("Wire transfer only.\nThanks!".to_string());
    let pages = layout(&data);
    assert_eq!(count_exact(&pages, "NOTES"), 1);
    assert_eq!(count_exact(&pages, "Wire transfer only.\nThanks!"), 1);
}

#[test]
fn long_notes_move_to_a_new_page() {
    let mut data = invoice_with_items(12);
    data.notes = Some("Payment terms apply. ".repeat(120));
    let pages = layout(&data);
    assert_eq!(pages.len(), 2);
    assert!(pages[0].texts().any(|t| t == "$120.00"));
    assert!(!pages[0].texts().any(|t| t == "NOTES"));
    assert!(pages[1].texts().any(|t| t == "NOTES"));
}

#[test]
fn notes_taller_than_a_page_continue_on_the_next() {
    let mut data = invoice_with_items(1);
    let lines: Vec<String> = (1..=90).map(|i| format!("Line {i}")).collect();
    data.notes = Some(lines.join("\n"));
    let pages = layout(&data);
    assert_eq!(pages.len(), 3);

    for page in &pages {
        for op in &page.ops {
            if let DrawOp::Rect(rect) = op {
                if rect.fill == Some(theme::NOTES_FILL) {
                    assert!(rect.y + rect.height <= theme::PAGE.height - theme::MARGIN);
                }
            }
        }
    }

    let drawn: Vec<String> = all_texts(&pages)
        .iter()
        .filter(|t| t.starts_with("Line "))
        .flat_map(|t| t.lines().map(str::to_string).collect::<Vec<_>>())
        .collect();
    assert_eq!(drawn, lines);
    assert_eq!(count_exact(&pages, "NOTES"), 1);
    assert!(!pages[0].texts().any(|t| t.starts_with("Line ")));
}

#[test]
fn logo_replaces_the_gradient_mark() {
    let mut data = invoice_with_items(1);
    let first_op = |pages: &[Page]| pages[0].ops[0].clone();

    assert!(matches!(first_op(&layout(&data)), DrawOp::Gradient(_)));

    data.logo = Some("data:image/png;base64,AAAA".to_string());
    assert!(matches!(first_op(&layout(&data)), DrawOp::Image(_)));
}

#[test]
fn dates_use_long_format() {
    let pages = layout(&invoice_with_items(1));
    assert_eq!(count_exact(&pages, "March 5, 2026"), 1);
    assert_eq!(count_exact(&pages, "April 4, 2026"), 1);
}
