use base64::Engine;
use image::{GenericImageView, ImageFormat};

use crate::error::{InvoiceError, Result};

/// Pixel data ready to become an image XObject.
pub(crate) struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    /// `Some("DCTDecode")` for JPEG passed through unchanged.
    pub filter: Option<&'static str>,
    pub data: Vec<u8>,
}

/// Decodes a `data:` URI (`data:image/png;base64,...`).
pub(crate) fn decode_logo(uri: &str) -> Result<LogoImage> {
    let bytes = data_uri_bytes(uri)?;
    let format = image::guess_format(&bytes).ok();
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| InvoiceError::InvalidLogo(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    if format == Some(ImageFormat::Jpeg) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        return Ok(LogoImage {
            width,
            height,
            color_space,
            filter: Some("DCTDecode"),
            data: bytes,
        });
    }

    // Transparent pixels are flattened onto the white page.
    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        for channel in [r, g, b] {
            rgb.push(((channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    Ok(LogoImage {
        width,
        height,
        color_space: "DeviceRGB",
        filter: None,
        data: rgb,
    })
}

/// Reads an image file into a `data:` URI suitable for `InvoiceData::logo`.
pub fn logo_data_uri(bytes: &[u8]) -> Result<String> {
    let mime = match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => {
            return Err(InvoiceError::InvalidLogo(
                "only PNG and JPEG logos are supported".to_string(),
            ))
        }
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn data_uri_bytes(uri: &str) -> Result<Vec<u8>> {
    let invalid = |reason: &str| InvoiceError::InvalidLogo(reason.to_string());
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("expected a data: URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("data URI has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(invalid("data URI is not base64 encoded"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| InvoiceError::InvalidLogo(format!("bad base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(2, 2, Rgba([255u8, 0, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_logo_is_flattened_to_rgb() {
        let uri = logo_data_uri(&png_bytes()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let logo = decode_logo(&uri).unwrap();
        assert_eq!((logo.width, logo.height), (2, 2));
        assert_eq!(logo.filter, None);
        // Fully transparent red ends up white.
        assert_eq!(&logo.data[..3], &[255, 255, 255]);
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(decode_logo("https://example.com/logo.png").is_err());
        assert!(decode_logo("data:image/png,plain").is_err());
    }
}
