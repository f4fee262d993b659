//! Drawing surfaces. [`paint`] replays laid-out pages onto any [`Surface`];
//! [`PdfSurface`] is the lopdf implementation.

use std::collections::HashMap;

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::fonts::{encode_win_ansi, FontProgram, FontSet, FIRST_CHAR, LAST_CHAR};
use super::logo::decode_logo;
use crate::error::{InvoiceError, Result};
use crate::layout::{
    truncate_to_width, wrap_lines, Align, Color, DrawOp, FontWeight, GradientOp, ImageOp, LineOp,
    Page, PageSize, RectOp, TextRun,
};

/// Control point distance for a quarter circle drawn as a cubic bezier.
const KAPPA: f32 = 0.5523;

/// Something laid-out pages can be drawn onto.
pub trait Surface {
    fn begin_page(&mut self, size: PageSize) -> Result<()>;
    fn text(&mut self, run: &TextRun) -> Result<()>;
    fn rect(&mut self, rect: &RectOp) -> Result<()>;
    fn line(&mut self, line: &LineOp) -> Result<()>;
    fn gradient(&mut self, gradient: &GradientOp) -> Result<()>;
    fn image(&mut self, image: &ImageOp) -> Result<()>;
    fn end_page(&mut self) -> Result<()>;
}

pub fn paint(surface: &mut dyn Surface, pages: &[Page], size: PageSize) -> Result<()> {
    for page in pages {
        surface.begin_page(size)?;
        for op in &page.ops {
            match op {
                DrawOp::Text(run) => surface.text(run)?,
                DrawOp::Rect(rect) => surface.rect(rect)?,
                DrawOp::Line(line) => surface.line(line)?,
                DrawOp::Gradient(gradient) => surface.gradient(gradient)?,
                DrawOp::Image(image) => surface.image(image)?,
            }
        }
        surface.end_page()?;
    }
    Ok(())
}

struct PageState {
    size: PageSize,
    operations: Vec<Operation>,
    shadings: Dictionary,
    xobjects: Dictionary,
}

impl PageState {
    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// Converts a top-down y coordinate into PDF user space.
    fn flip(&self, y: f32) -> f32 {
        self.size.height - y
    }
}

pub struct PdfSurface<'f> {
    fonts: &'f FontSet,
    document: Document,
    pages_id: ObjectId,
    font_dict: Dictionary,
    page_ids: Vec<ObjectId>,
    images: HashMap<String, ObjectId>,
    shading_count: usize,
    current: Option<PageState>,
}

impl<'f> PdfSurface<'f> {
    pub fn new(fonts: &'f FontSet, title: &str) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let regular = add_font(&mut document, &fonts.regular);
        let bold = add_font(&mut document, &fonts.bold);
        let font_dict = dictionary! { "F1" => regular, "F2" => bold };

        let info_id = document.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal("invoice-studio"),
        });
        document.trailer.set("Info", info_id);

        Self {
            fonts,
            document,
            pages_id,
            font_dict,
            page_ids: Vec::new(),
            images: HashMap::new(),
            shading_count: 0,
            current: None,
        }
    }

    fn page(&mut self) -> Result<&mut PageState> {
        self.current
            .as_mut()
            .ok_or_else(|| InvoiceError::PdfGeneration("drawing outside of a page".to_string()))
    }

    /// Serializes the document. Consumes the surface so a half-built
    /// document can never be written.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.current.is_some() {
            return Err(InvoiceError::PdfGeneration(
                "last page was never closed".to_string(),
            ));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
        debug!("pdf finished: {} page(s), {} bytes", self.page_ids.len(), bytes.len());
        Ok(bytes)
    }

    fn font_for(&self, weight: FontWeight) -> (&'static [u8], &FontProgram) {
        match weight {
            FontWeight::Regular => (b"F1", &self.fonts.regular),
            FontWeight::Bold => (b"F2", &self.fonts.bold),
        }
    }

    fn add_shading(&mut self, gradient: &GradientOp, height: f32) -> ObjectId {
        let segments: Vec<Object> = gradient
            .stops
            .windows(2)
            .map(|pair| {
                let id = self.document.add_object(dictionary! {
                    "FunctionType" => 2,
                    "Domain" => vec![0.into(), 1.into()],
                    "C0" => color_array(pair[0].color),
                    "C1" => color_array(pair[1].color),
                    "N" => 1,
                });
                Object::from(id)
            })
            .collect();

        let function = match segments.as_slice() {
            [single] => single.clone(),
            _ => {
                let inner = &gradient.stops[1..gradient.stops.len().saturating_sub(1)];
                let bounds: Vec<Object> = inner.iter().map(|stop| stop.offset.into()).collect();
                let encode: Vec<Object> = segments
                    .iter()
                    .flat_map(|_| [Object::Integer(0), Object::Integer(1)])
                    .collect();
                let id = self.document.add_object(dictionary! {
                    "FunctionType" => 3,
                    "Domain" => vec![0.into(), 1.into()],
                    "Functions" => segments,
                    "Bounds" => bounds,
                    "Encode" => encode,
                });
                Object::from(id)
            }
        };

        let (x0, y0) = gradient.from;
        let (x1, y1) = gradient.to;
        self.document.add_object(dictionary! {
            "ShadingType" => 2,
            "ColorSpace" => "DeviceRGB",
            "Coords" => vec![x0.into(), (height - y0).into(), x1.into(), (height - y1).into()],
            "Function" => function,
            "Extend" => vec![Object::Boolean(true), Object::Boolean(true)],
        })
    }

    fn image_object(&mut self, source: &str) -> Result<ObjectId> {
        if let Some(id) = self.images.get(source) {
            return Ok(*id);
        }
        let logo = decode_logo(source)?;
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => logo.width as i64,
            "Height" => logo.height as i64,
            "ColorSpace" => logo.color_space,
            "BitsPerComponent" => 8,
        };
        if let Some(filter) = logo.filter {
            dict.set("Filter", filter);
        }
        let id = self.document.add_object(Stream::new(dict, logo.data));
        self.images.insert(source.to_string(), id);
        Ok(id)
    }
}

impl Surface for PdfSurface<'_> {
    fn begin_page(&mut self, size: PageSize) -> Result<()> {
        if self.current.is_some() {
            return Err(InvoiceError::PdfGeneration(
                "page started before the previous one ended".to_string(),
            ));
        }
        self.current = Some(PageState {
            size,
            operations: Vec::new(),
            shadings: Dictionary::new(),
            xobjects: Dictionary::new(),
        });
        Ok(())
    }

    fn text(&mut self, run: &TextRun) -> Result<()> {
        let fonts = self.fonts;
        let lines = match run.max_width {
            Some(width) if run.wrap => wrap_lines(fonts, &run.text, run.weight, run.size, width),
            Some(width) => vec![truncate_to_width(fonts, &run.text, run.weight, run.size, width)],
            None => run.text.lines().map(str::to_string).collect(),
        };
        let (font_name, font) = self.font_for(run.weight);
        let widths: Vec<f32> = lines
            .iter()
            .map(|line| font.text_width(line, run.size))
            .collect();

        let page = self.page()?;
        for (i, (line, width)) in lines.iter().zip(widths).enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let x = match run.align {
                Align::Left => run.x,
                Align::Center => run.x - width / 2.0,
                Align::Right => run.x - width,
            };
            let baseline = run.y + run.size * 0.8 + i as f32 * run.line_height;
            page.push("BT", vec![]);
            page.push("Tf", vec![Object::Name(font_name.to_vec()), run.size.into()]);
            page.push("rg", color_array(run.color));
            page.push("Td", vec![x.into(), page.flip(baseline).into()]);
            page.push(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            );
            page.push("ET", vec![]);
        }
        Ok(())
    }

    fn rect(&mut self, rect: &RectOp) -> Result<()> {
        let page = self.page()?;
        let painter = match (rect.fill, rect.stroke) {
            (None, None) => return Ok(()),
            (Some(_), None) => "f",
            (None, Some(_)) => "S",
            (Some(_), Some(_)) => "B",
        };
        page.push("q", vec![]);
        if let Some(fill) = rect.fill {
            page.push("rg", color_array(fill));
        }
        if let Some((stroke, width)) = rect.stroke {
            page.push("RG", color_array(stroke));
            page.push("w", vec![width.into()]);
        }
        rounded_rect(page, rect.x, rect.y, rect.width, rect.height, rect.radius);
        page.push(painter, vec![]);
        page.push("Q", vec![]);
        Ok(())
    }

    fn line(&mut self, line: &LineOp) -> Result<()> {
        let page = self.page()?;
        page.push("q", vec![]);
        page.push("RG", color_array(line.color));
        page.push("w", vec![line.width.into()]);
        page.push("m", vec![line.x1.into(), page.flip(line.y1).into()]);
        page.push("l", vec![line.x2.into(), page.flip(line.y2).into()]);
        page.push("S", vec![]);
        page.push("Q", vec![]);
        Ok(())
    }

    fn gradient(&mut self, gradient: &GradientOp) -> Result<()> {
        let height = self.page()?.size.height;
        if gradient.stops.is_empty() {
            return Ok(());
        }
        let shading_id = if gradient.stops.len() == 1 {
            None
        } else {
            Some(self.add_shading(gradient, height))
        };
        self.shading_count += 1;
        let name = format!("Sh{}", self.shading_count);

        let page = self.page()?;
        page.push("q", vec![]);
        rounded_rect(
            page,
            gradient.x,
            gradient.y,
            gradient.width,
            gradient.height,
            gradient.radius,
        );
        match shading_id {
            Some(id) => {
                page.shadings.set(name.as_bytes(), id);
                page.push("W", vec![]);
                page.push("n", vec![]);
                page.push("sh", vec![Object::Name(name.into_bytes())]);
            }
            None => {
                page.push("rg", color_array(gradient.stops[0].color));
                page.push("f", vec![]);
            }
        }
        page.push("Q", vec![]);
        Ok(())
    }

    fn image(&mut self, image: &ImageOp) -> Result<()> {
        let id = self.image_object(&image.source)?;
        let (pixel_width, pixel_height) = match self.document.get_object(id) {
            Ok(Object::Stream(stream)) => (
                stream.dict.get(b"Width").and_then(Object::as_i64).unwrap_or(1),
                stream.dict.get(b"Height").and_then(Object::as_i64).unwrap_or(1),
            ),
            _ => (1, 1),
        };
        let name = format!("Im{}", id.0);

        // Scale to cover the box, centred, then clip to its outline.
        let scale = (image.width / pixel_width.max(1) as f32)
            .max(image.height / pixel_height.max(1) as f32);
        let draw_width = pixel_width as f32 * scale;
        let draw_height = pixel_height as f32 * scale;
        let x = image.x + (image.width - draw_width) / 2.0;
        let top = image.y + (image.height - draw_height) / 2.0;

        let page = self.page()?;
        page.xobjects.set(name.as_bytes(), id);
        page.push("q", vec![]);
        rounded_rect(page, image.x, image.y, image.width, image.height, image.radius);
        page.push("W", vec![]);
        page.push("n", vec![]);
        page.push(
            "cm",
            vec![
                draw_width.into(),
                0.into(),
                0.into(),
                draw_height.into(),
                x.into(),
                page.flip(top + draw_height).into(),
            ],
        );
        page.push("Do", vec![Object::Name(name.into_bytes())]);
        page.push("Q", vec![]);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let page = self
            .current
            .take()
            .ok_or_else(|| InvoiceError::PdfGeneration("no page to end".to_string()))?;

        let content = Content {
            operations: page.operations,
        };
        let encoded = content
            .encode()
            .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
        let content_id = self.document.add_object(Stream::new(Dictionary::new(), encoded));

        let mut resources = dictionary! { "Font" => self.font_dict.clone() };
        if !page.shadings.is_empty() {
            resources.set("Shading", page.shadings);
        }
        if !page.xobjects.is_empty() {
            resources.set("XObject", page.xobjects);
        }

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page.size.width.into(), page.size.height.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        Ok(())
    }
}

fn add_font(document: &mut Document, font: &FontProgram) -> ObjectId {
    let Some(embedded) = font.embedded() else {
        return document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
    };

    let file_id = document.add_object(Stream::new(
        dictionary! { "Length1" => embedded.data.len() as i64 },
        embedded.data.clone(),
    ));
    let metrics = &embedded.descriptor;
    let flags = if metrics.fixed_pitch { 32 | 1 } else { 32 };
    let descriptor_id = document.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => font.base_font(),
        "Flags" => flags,
        "FontBBox" => metrics.bbox.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
        "ItalicAngle" => metrics.italic_angle,
        "Ascent" => metrics.ascent,
        "Descent" => metrics.descent,
        "CapHeight" => metrics.cap_height,
        "StemV" => 80,
        "MissingWidth" => metrics.missing_width,
        "FontFile2" => file_id,
    });
    let widths: Vec<Object> = font.widths().iter().map(|w| Object::from(*w)).collect();
    document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => font.base_font(),
        "FirstChar" => FIRST_CHAR as i64,
        "LastChar" => LAST_CHAR as i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn color_array(color: Color) -> Vec<Object> {
    color.unit().into_iter().map(Object::from).collect()
}

/// Appends a (possibly rounded) rectangle path given in top-down coordinates.
fn rounded_rect(page: &mut PageState, x: f32, top: f32, width: f32, height: f32, radius: f32) {
    let y = page.flip(top + height);
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r == 0.0 {
        page.push("re", vec![x.into(), y.into(), width.into(), height.into()]);
        return;
    }

    let c = r * KAPPA;
    let (right, upper) = (x + width, y + height);
    let pt = |values: [f32; 6]| values.into_iter().map(Object::from).collect::<Vec<_>>();
    page.push("m", vec![(x + r).into(), y.into()]);
    page.push("l", vec![(right - r).into(), y.into()]);
    page.push("c", pt([right - r + c, y, right, y + r - c, right, y + r]));
    page.push("l", vec![right.into(), (upper - r).into()]);
    page.push("c", pt([right, upper - r + c, right - r + c, upper, right - r, upper]));
    page.push("l", vec![(x + r).into(), upper.into()]);
    page.push("c", pt([x + r - c, upper, x, upper - r + c, x, upper - r]));
    page.push("l", vec![x.into(), (y + r).into()]);
    page.push("c", pt([x, y + r - c, x + r - c, y, x + r, y]));
    page.push("h", vec![]);
}
