//! Turns an [`InvoiceData`] snapshot into pages of positioned draw ops.
//!
//! Layout is a single top-to-bottom pass with a y cursor: header, parties,
//! dates, the item table, the summary, notes and a footer. Page breaks are
//! decided before each table row, before the summary and before the notes
//! panel; nothing already placed is ever moved.

mod ops;
mod text;
pub mod theme;

pub use ops::{
    Align, Color, DrawOp, FontWeight, GradientOp, GradientStop, ImageOp, LineOp, Page, PageSize,
    RectOp, TextRun,
};
pub use text::{truncate_to_width, wrap_lines, TextMeasure};

use log::debug;

use crate::model::{InvoiceData, LineItem, PartyInfo};
use crate::money::{
    compute_totals, format_currency, format_long_date, format_percent, format_quantity,
};
use theme::*;

const DESCRIPTION_X: f32 = MARGIN + 8.0;
const AMOUNT_RIGHT: f32 = CONTENT_RIGHT - 8.0;
const RATE_RIGHT: f32 = AMOUNT_RIGHT - 100.0;
const QTY_CENTER: f32 = RATE_RIGHT - 110.0;
const DESCRIPTION_WIDTH: f32 = QTY_CENTER - 38.0 - DESCRIPTION_X;

pub struct LayoutEngine<'m> {
    measure: &'m dyn TextMeasure,
}

impl<'m> LayoutEngine<'m> {
    pub fn new(measure: &'m dyn TextMeasure) -> Self {
        Self { measure }
    }

    pub fn layout(&self, data: &InvoiceData) -> Vec<Page> {
        let mut flow = Flow::default();

        self.header(&mut flow, data);
        let parties_bottom = self.parties(&mut flow, data);
        flow.y = parties_bottom.max(PARTIES_TOP);
        self.dates(&mut flow, data);
        self.items(&mut flow, &data.items);
        self.summary(&mut flow, data);
        if let Some(notes) = data.notes_text() {
            self.notes(&mut flow, notes);
        }
        self.footer(&mut flow);

        let pages = flow.finish();
        debug!(
            "laid out {} ({} items) on {} page(s)",
            data.invoice_number,
            data.items.len(),
            pages.len()
        );
        pages
    }

    fn header(&self, flow: &mut Flow, data: &InvoiceData) {
        let (x, y, size) = (MARGIN, MARGIN, HEADER_HEIGHT);
        match &data.logo {
            Some(logo) if !logo.trim().is_empty() => flow.push(DrawOp::Image(ImageOp {
                x,
                y,
                width: size,
                height: size,
                radius: LOGO_RADIUS,
                source: logo.clone(),
            })),
            _ => {
                flow.push(DrawOp::Gradient(GradientOp {
                    x,
                    y,
                    width: size,
                    height: size,
                    radius: LOGO_RADIUS,
                    from: (x, y),
                    to: (x + size, y + size),
                    stops: brand_gradient(),
                }));
                document_mark(flow, x + size / 2.0, y + size / 2.0);
            }
        }

        let title_x = x + size + 16.0;
        flow.push(text(
            "INVOICE",
            title_x,
            y + 6.0,
            22.0,
            FontWeight::Bold,
            TEXT,
        ));
        if !data.invoice_number.trim().is_empty() {
            flow.push(text(
                data.invoice_number.trim(),
                title_x,
                y + 34.0,
                11.0,
                FontWeight::Regular,
                MUTED,
            ));
        }
    }

    /// Returns the lower edge of the taller column.
    fn parties(&self, flow: &mut Flow, data: &InvoiceData) -> f32 {
        let half = CONTENT_WIDTH / 2.0;
        let left = self.party_column(flow, "FROM", &data.sender, "Your Business", MARGIN);
        let right = self.party_column(
            flow,
            "BILL TO",
            &data.recipient,
            "Client Name",
            MARGIN + half,
        );
        left.max(right)
    }

    fn party_column(
        &self,
        flow: &mut Flow,
        label: &str,
        party: &PartyInfo,
        placeholder: &str,
        x: f32,
    ) -> f32 {
        let width = CONTENT_WIDTH / 2.0 - COLUMN_GAP;
        let mut y = PARTIES_TOP;

        flow.push(text(label, x, y, 8.0, FontWeight::Bold, FAINT));
        y += 14.0;

        let name = party.display_name(placeholder);
        y += self.wrapped(flow, name, x, y, 12.0, 15.0, width, FontWeight::Bold, TEXT) + 2.0;

        if let Some(email) = party.email() {
            let mut run = text(email, x, y, 9.5, FontWeight::Regular, MUTED);
            run.max_width = Some(width);
            flow.push(DrawOp::Text(run));
            y += 13.0;
        }
        if let Some(address) = party.address() {
            y += self.wrapped(flow, address, x, y, 9.5, 12.5, width, FontWeight::Regular, MUTED);
            y += 1.0;
        }
        if let Some(phone) = party.phone() {
            flow.push(text(phone, x, y, 9.5, FontWeight::Regular, MUTED));
            y += 13.0;
        }
        y
    }

    fn dates(&self, flow: &mut Flow, data: &InvoiceData) {
        let y = (flow.y + DATES_GAP).max(DATES_MIN_TOP);
        flow.push(DrawOp::Rect(RectOp {
            x: MARGIN,
            y,
            width: CONTENT_WIDTH,
            height: DATES_HEIGHT,
            radius: 8.0,
            fill: Some(PANEL),
            stroke: None,
        }));

        let pairs = [
            ("ISSUE DATE", data.issue_date),
            ("DUE DATE", data.due_date),
        ];
        for (i, (label, date)) in pairs.into_iter().enumerate() {
            let x = MARGIN + 16.0 + i as f32 * 170.0;
            flow.push(text(label, x, y + 10.0, 8.0, FontWeight::Bold, FAINT));
            flow.push(text(
                &format_long_date(date),
                x,
                y + 23.0,
                11.0,
                FontWeight::Bold,
                TEXT,
            ));
        }
        flow.y = y + DATES_HEIGHT;
    }

    fn items(&self, flow: &mut Flow, items: &[LineItem]) {
        let compact = items.len() > COMPACT_ROW_THRESHOLD;
        let row_height = if compact { COMPACT_ROW_HEIGHT } else { ROW_HEIGHT };
        let size = if compact { 9.0 } else { 10.0 };

        flow.y += TABLE_GAP;
        let y = flow.y;
        let label_y = y + 8.0;
        let header = [
            ("DESCRIPTION", DESCRIPTION_X, Align::Left),
            ("QTY", QTY_CENTER, Align::Center),
            ("RATE", RATE_RIGHT, Align::Right),
            ("AMOUNT", AMOUNT_RIGHT, Align::Right),
        ];
        for (label, x, align) in header {
            let mut run = text(label, x, label_y, 8.0, FontWeight::Bold, MUTED);
            run.align = align;
            flow.push(DrawOp::Text(run));
        }
        flow.push(rule(MARGIN, CONTENT_RIGHT, y + TABLE_HEADER_HEIGHT, 1.5));
        flow.y = y + TABLE_HEADER_HEIGHT + 2.0;

        for (index, item) in items.iter().enumerate() {
            if flow.y + row_height > SAFE_BOTTOM {
                debug!("page break before item {}", index + 1);
                flow.new_page();
                flow.push(rule(MARGIN, CONTENT_RIGHT, flow.y, 0.75));
                flow.y += 8.0;
            }
            self.item_row(flow, index, item, row_height, size);
            flow.y += row_height;
        }
    }

    fn item_row(&self, flow: &mut Flow, index: usize, item: &LineItem, height: f32, size: f32) {
        let y = flow.y;
        if index % 2 == 0 {
            flow.push(DrawOp::Rect(RectOp {
                x: MARGIN,
                y,
                width: CONTENT_WIDTH,
                height,
                radius: 0.0,
                fill: Some(ZEBRA),
                stroke: None,
            }));
        }

        let text_y = y + (height - size) / 2.0;
        let description = match item.description.trim() {
            "" => "-",
            d => d,
        };
        let mut run = text(description, DESCRIPTION_X, text_y, size, FontWeight::Regular, TEXT);
        run.max_width = Some(DESCRIPTION_WIDTH);
        flow.push(DrawOp::Text(run));

        let cells = [
            (format_quantity(item.quantity()), QTY_CENTER, Align::Center, FontWeight::Regular, MUTED),
            (format_currency(item.rate().unwrap_or(0.0)), RATE_RIGHT, Align::Right, FontWeight::Regular, MUTED),
            (format_currency(item.amount()), AMOUNT_RIGHT, Align::Right, FontWeight::Bold, TEXT),
        ];
        for (value, x, align, weight, color) in cells {
            let mut run = text(&value, x, text_y, size, weight, color);
            run.align = align;
            flow.push(DrawOp::Text(run));
        }
    }

    fn summary(&self, flow: &mut Flow, data: &InvoiceData) {
        let totals = compute_totals(data);
        flow.y += SUMMARY_GAP;
        if flow.y > SUMMARY_BREAK {
            debug!("summary moved to a new page");
            flow.new_page();
        }

        let x = CONTENT_RIGHT - SUMMARY_WIDTH;
        summary_row(flow, x, "Subtotal", &format_currency(totals.subtotal));
        if let Some(rate) = data.tax.filter(|rate| *rate > 0.0) {
            let label = format!("Tax ({}%)", format_percent(rate));
            summary_row(flow, x, &label, &format_currency(totals.tax_amount));
        }

        flow.y += 8.0;
        let y = flow.y;
        flow.push(DrawOp::Gradient(GradientOp {
            x: MARGIN,
            y,
            width: CONTENT_WIDTH,
            height: TOTAL_PILL_HEIGHT,
            radius: 10.0,
            from: (MARGIN, y),
            to: (CONTENT_RIGHT, y),
            stops: brand_gradient(),
        }));
        let text_y = y + (TOTAL_PILL_HEIGHT - 13.0) / 2.0;
        flow.push(text("Total", MARGIN + 16.0, text_y, 12.0, FontWeight::Bold, Color::WHITE));
        let mut amount = text(
            &format_currency(totals.total),
            CONTENT_RIGHT - 16.0,
            text_y,
            13.0,
            FontWeight::Bold,
            Color::WHITE,
        );
        amount.align = Align::Right;
        flow.push(DrawOp::Text(amount));
        flow.y = y + TOTAL_PILL_HEIGHT;
    }

    /// The panel moves to a new page when it does not fit below the summary.
    /// A panel taller than a page continues on the next one, line by line.
    fn notes(&self, flow: &mut Flow, notes: &str) {
        let width = CONTENT_WIDTH - 2.0 * NOTES_PADDING;
        let lines = wrap_lines(self.measure, notes, FontWeight::Regular, 10.0, width);
        let height = notes_panel_height(lines.len(), true);

        flow.y += NOTES_GAP;
        if flow.y + height > NOTES_BOTTOM {
            debug!("notes panel moved to a new page");
            flow.new_page();
        }
        if flow.y + height <= NOTES_BOTTOM {
            self.notes_panel(flow, notes, lines.len(), true);
            return;
        }

        let mut remaining = lines.as_slice();
        let mut first = true;
        while !remaining.is_empty() {
            let room = NOTES_BOTTOM - flow.y - notes_panel_height(0, first);
            let fits = ((room / NOTES_LINE_HEIGHT).floor() as usize).max(1);
            let (chunk, rest) = remaining.split_at(fits.min(remaining.len()));
            self.notes_panel(flow, &chunk.join("\n"), chunk.len(), first);
            remaining = rest;
            first = false;
            if !remaining.is_empty() {
                debug!("notes continue on a new page");
                flow.new_page();
            }
        }
    }

    fn notes_panel(&self, flow: &mut Flow, body: &str, lines: usize, labelled: bool) {
        let y = flow.y;
        let height = notes_panel_height(lines, labelled);
        flow.push(DrawOp::Rect(RectOp {
            x: MARGIN,
            y,
            width: CONTENT_WIDTH,
            height,
            radius: 8.0,
            fill: Some(NOTES_FILL),
            stroke: Some((NOTES_BORDER, 0.75)),
        }));

        let x = MARGIN + NOTES_PADDING;
        let mut body_y = y + NOTES_PADDING;
        if labelled {
            flow.push(text("NOTES", x, body_y, 8.0, FontWeight::Bold, NOTES_LABEL));
            body_y += NOTES_LABEL_HEIGHT;
        }
        let mut run = text(body, x, body_y, 10.0, FontWeight::Regular, NOTES_TEXT);
        run.max_width = Some(CONTENT_WIDTH - 2.0 * NOTES_PADDING);
        run.wrap = true;
        run.line_height = NOTES_LINE_HEIGHT;
        flow.push(run);
        flow.y = y + height;
    }

    /// The closing line only appears on single-page invoices with room left.
    fn footer(&self, flow: &mut Flow) {
        if !flow.pages.is_empty() || flow.y > FOOTER_Y - 24.0 {
            return;
        }
        flow.push(rule(MARGIN, CONTENT_RIGHT, FOOTER_Y - 12.0, 0.75));
        let mut run = text(
            "Thank you for your business!",
            MARGIN + CONTENT_WIDTH / 2.0,
            FOOTER_Y,
            10.0,
            FontWeight::Regular,
            FAINT,
        );
        run.align = Align::Center;
        flow.push(DrawOp::Text(run));
    }

    /// Pushes a wrapped block and returns its height.
    #[allow(clippy::too_many_arguments)]
    fn wrapped(
        &self,
        flow: &mut Flow,
        content: &str,
        x: f32,
        y: f32,
        size: f32,
        line_height: f32,
        width: f32,
        weight: FontWeight,
        color: Color,
    ) -> f32 {
        let lines = wrap_lines(self.measure, content, weight, size, width).len().max(1);
        let mut run = text(content, x, y, size, weight, color);
        run.max_width = Some(width);
        run.wrap = true;
        run.line_height = line_height;
        flow.push(DrawOp::Text(run));
        lines as f32 * line_height
    }
}

/// Pages built so far plus the one being filled.
#[derive(Default)]
struct Flow {
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl Flow {
    fn push(&mut self, op: impl Into<DrawOp>) {
        self.current.ops.push(op.into());
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = MARGIN;
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.current);
        self.pages
    }
}

fn text(content: &str, x: f32, y: f32, size: f32, weight: FontWeight, color: Color) -> TextRun {
    TextRun {
        text: content.to_string(),
        x,
        y,
        size,
        weight,
        color,
        align: Align::Left,
        max_width: None,
        wrap: false,
        line_height: size * 1.25,
    }
}

fn notes_panel_height(lines: usize, labelled: bool) -> f32 {
    let label = if labelled { NOTES_LABEL_HEIGHT } else { 0.0 };
    2.0 * NOTES_PADDING + label + lines as f32 * NOTES_LINE_HEIGHT
}

fn rule(x1: f32, x2: f32, y: f32, width: f32) -> DrawOp {
    DrawOp::Line(LineOp {
        x1,
        y1: y,
        x2,
        y2: y,
        color: RULE,
        width,
    })
}

fn summary_row(flow: &mut Flow, x: f32, label: &str, value: &str) {
    let y = flow.y;
    flow.push(text(label, x, y + 6.0, 10.0, FontWeight::Regular, MUTED));
    let mut amount = text(value, CONTENT_RIGHT, y + 6.0, 10.0, FontWeight::Bold, TEXT);
    amount.align = Align::Right;
    flow.push(DrawOp::Text(amount));
    flow.push(rule(x, CONTENT_RIGHT, y + SUMMARY_ROW_HEIGHT - 2.0, 0.75));
    flow.y = y + SUMMARY_ROW_HEIGHT;
}

/// A small white page outline inside the logo placeholder.
fn document_mark(flow: &mut Flow, cx: f32, cy: f32) {
    let (w, h) = (18.0, 23.0);
    flow.push(DrawOp::Rect(RectOp {
        x: cx - w / 2.0,
        y: cy - h / 2.0,
        width: w,
        height: h,
        radius: 2.5,
        fill: None,
        stroke: Some((Color::WHITE, 1.5)),
    }));
    for (i, len) in [10.0, 10.0, 6.0].into_iter().enumerate() {
        let y = cy - 4.0 + i as f32 * 4.5;
        flow.push(DrawOp::Line(LineOp {
            x1: cx - 5.0,
            y1: y,
            x2: cx - 5.0 + len,
            y2: y,
            color: Color::WHITE,
            width: 1.2,
        }));
    }
}
