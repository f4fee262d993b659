//! Page geometry and the ink/navy/brass palette.

use super::ops::{Color, GradientStop, PageSize};

/// A4 portrait.
pub const PAGE: PageSize = PageSize {
    width: 595.28,
    height: 841.89,
};
pub const MARGIN: f32 = 40.0;
pub const CONTENT_WIDTH: f32 = PAGE.width - 2.0 * MARGIN;
pub const CONTENT_RIGHT: f32 = MARGIN + CONTENT_WIDTH;

pub const HEADER_HEIGHT: f32 = 56.0;
pub const LOGO_RADIUS: f32 = 12.0;

pub const PARTIES_TOP: f32 = MARGIN + HEADER_HEIGHT + 28.0;
pub const COLUMN_GAP: f32 = 16.0;

pub const DATES_MIN_TOP: f32 = 220.0;
pub const DATES_GAP: f32 = 18.0;
pub const DATES_HEIGHT: f32 = 46.0;

pub const TABLE_GAP: f32 = 22.0;
pub const TABLE_HEADER_HEIGHT: f32 = 24.0;
pub const ROW_HEIGHT: f32 = 24.0;
pub const COMPACT_ROW_HEIGHT: f32 = 18.0;
/// Above this many items rows switch to the compact height.
pub const COMPACT_ROW_THRESHOLD: usize = 24;

/// A row that would end below this line goes to the next page.
pub const SAFE_BOTTOM: f32 = 750.0;
/// The summary starts on a new page when the cursor is already past this.
pub const SUMMARY_BREAK: f32 = 700.0;
pub const SUMMARY_GAP: f32 = 18.0;
pub const SUMMARY_WIDTH: f32 = 220.0;
pub const SUMMARY_ROW_HEIGHT: f32 = 24.0;
pub const TOTAL_PILL_HEIGHT: f32 = 34.0;

pub const NOTES_GAP: f32 = 18.0;
pub const NOTES_PADDING: f32 = 14.0;
pub const NOTES_LINE_HEIGHT: f32 = 13.0;
pub const NOTES_LABEL_HEIGHT: f32 = 16.0;
/// Notes panels end above this line.
pub const NOTES_BOTTOM: f32 = PAGE.height - MARGIN;

pub const FOOTER_Y: f32 = PAGE.height - 52.0;

pub const INK: Color = Color::hex(0x0f172a);
pub const NAVY: Color = Color::hex(0x1e3a8a);
pub const BRASS: Color = Color::hex(0xb08d57);
pub const TEXT: Color = Color::hex(0x111827);
pub const MUTED: Color = Color::hex(0x6b7280);
pub const FAINT: Color = Color::hex(0x9ca3af);
pub const PANEL: Color = Color::hex(0xf8fafc);
pub const ZEBRA: Color = Color::hex(0xf9fafb);
pub const RULE: Color = Color::hex(0xe5e7eb);
pub const NOTES_FILL: Color = Color::hex(0xfef3c7);
pub const NOTES_BORDER: Color = Color::hex(0xfde68a);
pub const NOTES_LABEL: Color = Color::hex(0xb45309);
pub const NOTES_TEXT: Color = Color::hex(0x374151);

pub fn brand_gradient() -> Vec<GradientStop> {
    vec![
        GradientStop {
            offset: 0.0,
            color: INK,
        },
        GradientStop {
            offset: 0.55,
            color: NAVY,
        },
        GradientStop {
            offset: 1.0,
            color: BRASS,
        },
    ]
}
