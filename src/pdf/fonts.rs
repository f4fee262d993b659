//! Regular and bold fonts for the PDF backend.
//!
//! Without configured fonts the standard Helvetica pair is used; it is not
//! embedded, so only its width tables live here. Configured TrueType fonts
//! are read from disk (or fetched from a URL) and embedded whole.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use ttf_parser::name::name_id;
use ttf_parser::{Face, GlyphId};
use ureq::Agent;

use crate::error::{InvoiceError, Result};
use crate::layout::{FontWeight, TextMeasure};

pub(crate) const FIRST_CHAR: u8 = 32;
pub(crate) const LAST_CHAR: u8 = 255;

const REMOTE_FONT_LIMIT: u64 = 32 * 1024 * 1024;

/// Where one font weight comes from. A local path wins over the URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontSource {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

impl FontSource {
    pub fn is_configured(&self) -> bool {
        self.path.is_some() || self.url.is_some()
    }

    /// Raw font bytes, or `None` when nothing is configured.
    fn fetch(&self, name: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let fail = |reason: String| InvoiceError::FontFetch {
            name: name.to_string(),
            reason,
        };

        if let Some(path) = &self.path {
            match std::fs::read(path) {
                Ok(bytes) => {
                    debug!("{name} font loaded from {}", path.display());
                    return Ok(Some(bytes));
                }
                Err(e) if self.url.is_some() => {
                    warn!("{name} font not readable at {}: {e}; trying URL", path.display());
                }
                Err(e) => return Err(fail(format!("{}: {e}", path.display()))),
            }
        }

        let Some(url) = &self.url else {
            return Ok(None);
        };
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        let bytes = agent
            .get(url)
            .call()
            .map_err(|e| fail(format!("{url}: {e}")))?
            .body_mut()
            .with_config()
            .limit(REMOTE_FONT_LIMIT)
            .read_to_vec()
            .map_err(|e| fail(format!("{url}: {e}")))?;
        debug!("{name} font fetched from {url} ({} bytes)", bytes.len());
        Ok(Some(bytes))
    }
}

/// Descriptor values in 1000-unit glyph space.
#[derive(Debug, Clone)]
pub(crate) struct FontDescriptor {
    pub ascent: i64,
    pub descent: i64,
    pub cap_height: i64,
    pub bbox: [i64; 4],
    pub italic_angle: i64,
    pub fixed_pitch: bool,
    pub missing_width: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct EmbeddedFont {
    pub data: Vec<u8>,
    pub descriptor: FontDescriptor,
}

/// One font weight: its PDF name, WinAnsi widths and, for TrueType, the
/// program to embed.
#[derive(Debug, Clone)]
pub struct FontProgram {
    base_font: String,
    /// Widths for bytes `FIRST_CHAR..=LAST_CHAR`, in 1000-unit glyph space.
    widths: Vec<i64>,
    embedded: Option<EmbeddedFont>,
}

impl FontProgram {
    pub fn helvetica(weight: FontWeight) -> Self {
        let (base_font, ascii) = match weight {
            FontWeight::Regular => ("Helvetica", &HELVETICA_WIDTHS),
            FontWeight::Bold => ("Helvetica-Bold", &HELVETICA_BOLD_WIDTHS),
        };
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|byte| match byte {
                32..=126 => ascii[(byte - 32) as usize] as i64,
                160 => 278,
                _ => 556,
            })
            .collect();
        Self {
            base_font: base_font.to_string(),
            widths,
            embedded: None,
        }
    }

    /// Parses a TrueType program. `fallback_name` is used when the font
    /// carries no PostScript name.
    ///
    /// Only `glyf` outlines can be embedded as `FontFile2`; CFF-flavoured
    /// OpenType fonts are rejected with [`InvoiceError::FontParse`].
    pub fn from_truetype(data: Vec<u8>, fallback_name: &str) -> Result<Self> {
        let (base_font, widths, descriptor) = {
            let face = Face::parse(&data, 0)
                .map_err(|e| InvoiceError::FontParse(format!("{fallback_name}: {e}")))?;
            if face.tables().glyf.is_none() {
                return Err(InvoiceError::FontParse(format!(
                    "{fallback_name}: no TrueType outlines (CFF-based OpenType fonts are not supported)"
                )));
            }
            let scale = 1000.0 / face.units_per_em().max(1) as f32;
            let scaled = |value: i16| (value as f32 * scale).round() as i64;

            let advance = |ch: char| {
                face.glyph_index(ch)
                    .and_then(|id| face.glyph_hor_advance(id))
                    .map(|adv| (adv as f32 * scale).round() as i64)
            };
            let missing_width = advance(' ')
                .or_else(|| {
                    face.glyph_hor_advance(GlyphId(0))
                        .map(|adv| (adv as f32 * scale).round() as i64)
                })
                .unwrap_or(0);
            let widths = (FIRST_CHAR..=LAST_CHAR)
                .map(|byte| {
                    decode_win_ansi(byte)
                        .and_then(advance)
                        .unwrap_or(missing_width)
                })
                .collect();

            let ascent = scaled(face.ascender());
            let bbox = face.global_bounding_box();
            let descriptor = FontDescriptor {
                ascent,
                descent: scaled(face.descender()),
                cap_height: face.capital_height().map(scaled).unwrap_or(ascent),
                bbox: [
                    scaled(bbox.x_min),
                    scaled(bbox.y_min),
                    scaled(bbox.x_max),
                    scaled(bbox.y_max),
                ],
                italic_angle: face.italic_angle().map(|a| a.round() as i64).unwrap_or(0),
                fixed_pitch: face.is_monospaced(),
                missing_width,
            };
            let name = postscript_name(&face).unwrap_or_else(|| sanitize_name(fallback_name));
            (name, widths, descriptor)
        };

        Ok(Self {
            base_font,
            widths,
            embedded: Some(EmbeddedFont { data, descriptor }),
        })
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    pub(crate) fn widths(&self) -> &[i64] {
        &self.widths
    }

    pub(crate) fn embedded(&self) -> Option<&EmbeddedFont> {
        self.embedded.as_ref()
    }

    /// Width of `text` in points at `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: i64 = encode_win_ansi(text)
            .into_iter()
            .filter(|byte| *byte >= FIRST_CHAR)
            .map(|byte| self.widths[(byte - FIRST_CHAR) as usize])
            .sum();
        units as f32 * size / 1000.0
    }
}

/// The two weights every invoice uses.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontProgram,
    pub bold: FontProgram,
}

impl FontSet {
    pub fn builtin() -> Self {
        Self {
            regular: FontProgram::helvetica(FontWeight::Regular),
            bold: FontProgram::helvetica(FontWeight::Bold),
        }
    }

    /// Loads both weights in parallel. Either one failing fails the set;
    /// an unconfigured weight falls back to Helvetica.
    pub fn load(regular: &FontSource, bold: &FontSource, timeout: Duration) -> Result<Self> {
        if !regular.is_configured() && !bold.is_configured() {
            return Ok(Self::builtin());
        }

        let (regular_bytes, bold_bytes) = thread::scope(|scope| {
            let regular_job = scope.spawn(|| regular.fetch("regular", timeout));
            let bold_job = scope.spawn(|| bold.fetch("bold", timeout));
            (join(regular_job, "regular"), join(bold_job, "bold"))
        });

        let program = |bytes: Option<Vec<u8>>, weight: FontWeight, name: &str| match bytes {
            Some(bytes) => FontProgram::from_truetype(bytes, name),
            None => Ok(FontProgram::helvetica(weight)),
        };
        let set = Self {
            regular: program(regular_bytes?, FontWeight::Regular, "InvoiceRegular")?,
            bold: program(bold_bytes?, FontWeight::Bold, "InvoiceBold")?,
        };
        for font in [&set.regular, &set.bold] {
            let kind = if font.is_embedded() { "embedded" } else { "built-in" };
            debug!("using {kind} font {}", font.base_font());
        }
        Ok(set)
    }

    pub fn get(&self, weight: FontWeight) -> &FontProgram {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TextMeasure for FontSet {
    fn text_width(&self, text: &str, weight: FontWeight, size: f32) -> f32 {
        self.get(weight).text_width(text, size)
    }
}

fn join(
    handle: thread::ScopedJoinHandle<'_, Result<Option<Vec<u8>>>>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    handle.join().unwrap_or_else(|_| {
        Err(InvoiceError::FontFetch {
            name: name.to_string(),
            reason: "loader thread panicked".to_string(),
        })
    })
}

fn postscript_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|entry| entry.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|entry| entry.to_string())
        .map(|name| sanitize_name(&name))
        .filter(|name| !name.is_empty())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Windows-1252 code points that differ from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20ac}'),
    (0x82, '\u{201a}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201e}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02c6}'),
    (0x89, '\u{2030}'),
    (0x8a, '\u{0160}'),
    (0x8b, '\u{2039}'),
    (0x8c, '\u{0152}'),
    (0x8e, '\u{017d}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201c}'),
    (0x94, '\u{201d}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02dc}'),
    (0x99, '\u{2122}'),
    (0x9a, '\u{0161}'),
    (0x9b, '\u{203a}'),
    (0x9c, '\u{0153}'),
    (0x9e, '\u{017e}'),
    (0x9f, '\u{0178}'),
];

/// Encodes text for a WinAnsi font. Unmappable characters become `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7e | 0xa0..=0xff => ch as u8,
            0x09 => b' ',
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(_, mapped)| *mapped == ch)
                .map(|(byte, _)| *byte)
                .unwrap_or(b'?'),
        })
        .collect()
}

fn decode_win_ansi(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7e | 0xa0..=0xff => Some(byte as char),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(code, _)| *code == byte)
            .map(|(_, ch)| *ch),
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_afm() {
        let regular = FontProgram::helvetica(FontWeight::Regular);
        // "Ab" = 667 + 556
        assert!((regular.text_width("Ab", 10.0) - 12.23).abs() < 1e-3);
        let bold = FontProgram::helvetica(FontWeight::Bold);
        assert!(bold.text_width("Ab", 10.0) > regular.text_width("Ab", 10.0));
    }

    #[test]
    fn win_ansi_maps_typographic_quotes_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("caf\u{e9}"), b"caf\xe9".to_vec());
        assert_eq!(encode_win_ansi("\u{201c}x\u{201d}"), vec![0x93, b'x', 0x94]);
        assert_eq!(encode_win_ansi("\u{4e2d}"), b"?".to_vec());
    }

    #[test]
    fn unconfigured_sources_use_builtin_fonts() {
        let set = FontSet::load(
            &FontSource::default(),
            &FontSource::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(set.regular.base_font(), "Helvetica");
        assert!(!set.bold.is_embedded());
    }

    #[test]
    fn missing_local_font_is_a_fetch_error() {
        let source = FontSource {
            path: Some(PathBuf::from("/definitely/not/here.ttf")),
            url: None,
        };
        let err = FontSet::load(&source, &FontSource::default(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, InvoiceError::FontFetch { .. }));
    }

    #[test]
    fn truetype_widths_come_from_hmtx() {
        let data = std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/demo.ttf"))
            .unwrap();
        let font = FontProgram::from_truetype(data, "Demo Sans").unwrap();
        assert!(font.is_embedded());
        assert_eq!(font.base_font(), "DemoSans");
        assert_eq!(font.widths()[(b'A' - FIRST_CHAR) as usize], 540);
        // No space glyph: unmapped characters take the .notdef advance.
        assert_eq!(font.widths()[0], 600);
        assert!((font.text_width("AA", 10.0) - 10.8).abs() < 1e-3);
    }

    #[test]
    fn font_without_glyf_outlines_is_rejected() {
        let data = std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/demo.ttf"))
            .unwrap();
        let without_glyf = rename_table(&data, b"glyf", b"CFF ");
        let err = FontProgram::from_truetype(without_glyf, "Demo").unwrap_err();
        assert!(matches!(err, InvoiceError::FontParse(reason) if reason.contains("CFF")));
    }

    /// Renames one table directory entry, leaving the table bytes alone.
    fn rename_table(data: &[u8], from: &[u8; 4], to: &[u8; 4]) -> Vec<u8> {
        let mut out = data.to_vec();
        let tables = u16::from_be_bytes([data[4], data[5]]) as usize;
        for i in 0..tables {
            let at = 12 + i * 16;
            if &out[at..at + 4] == from {
                out[at..at + 4].copy_from_slice(to);
            }
        }
        out
    }

    #[test]
    fn garbage_font_is_a_parse_error() {
        let err = FontProgram::from_truetype(vec![0, 1, 2, 3], "Broken").unwrap_err();
        assert!(matches!(err, InvoiceError::FontParse(_)));
    }
}
