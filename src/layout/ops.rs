//! Positioned drawing instructions produced by the layout engine.
//!
//! Coordinates are PDF points with the origin at the top-left corner of the
//! page and y growing downward. Backends flip to their own space.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::hex(0xffffff);

    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Which point of the text box `x` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A run of text. `y` is the top of the first line.
///
/// With `max_width` set, the backend either wraps the text onto several
/// lines (`wrap`) or cuts it to one line ending in `...`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub weight: FontWeight,
    pub color: Color,
    pub align: Align,
    pub max_width: Option<f32>,
    pub wrap: bool,
    pub line_height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectOp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineOp {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

/// A rounded rectangle filled with a linear gradient running from `from`
/// to `to` (page coordinates).
#[derive(Debug, Clone, PartialEq)]
pub struct GradientOp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub stops: Vec<GradientStop>,
}

/// A raster image (a `data:` URI) scaled to cover the box and clipped to
/// its rounded outline.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    Rect(RectOp),
    Line(LineOp),
    Gradient(GradientOp),
    Image(ImageOp),
}

impl From<TextRun> for DrawOp {
    fn from(run: TextRun) -> Self {
        DrawOp::Text(run)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text content of the page in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run.text.as_str()),
            _ => None,
        })
    }
}
