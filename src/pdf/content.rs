//! PDF content stream generation for card graphics, images and text.
//!
//! This module provides:
//! - Vector drawing (colours, rounded rectangles, frames, lines)
//! - Image XObject creation and placement
//! - Centred text with standard and CID fonts
//! - String encoding for PDF (ASCII and UTF-16BE)

use anyhow::Result;
use image::DynamicImage;
use log::warn;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use super::fonts::{CID_FONT_RESOURCE, CidFont, StandardFont};

/// Control point offset for approximating a quarter circle with a cubic Bezier
const KAPPA: f64 = 0.552_284_75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

pub struct TextStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: Rgb,
}

/// Builder for generating PDF content streams and associated XObjects
pub struct ContentBuilder<'a> {
    pub content_parts: Vec<String>,
    pub xobjects: Dictionary,
    cid_font: Option<&'a CidFont>,
}

fn num(v: f64) -> String {
    format!("{:.2}", v)
}

impl<'a> ContentBuilder<'a> {
    pub fn new() -> Self {
        Self {
            content_parts: Vec::new(),
            xobjects: Dictionary::new(),
            cid_font: None,
        }
    }

    /// Create a new ContentBuilder that draws non-ASCII text with a CID font
    pub fn new_with_cid_font(cid_font: Option<&'a CidFont>) -> Self {
        Self {
            cid_font,
            ..Self::new()
        }
    }

    /// Make an image XObject drawable from this content stream
    pub fn register_image(&mut self, name: &str, id: ObjectId) {
        self.xobjects.set(name, Object::Reference(id));
    }

    pub fn set_fill_color(&mut self, Rgb(r, g, b): Rgb) {
        self.content_parts.push(format!("{} {} {} rg ", num(r), num(g), num(b)));
    }

    pub fn set_stroke_color(&mut self, Rgb(r, g, b): Rgb) {
        self.content_parts.push(format!("{} {} {} RG ", num(r), num(g), num(b)));
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.content_parts.push(format!("{} w ", num(width)));
    }

    /// Rounded rectangle with its bottom-left corner at (x, y)
    pub fn round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, radius: f64, fill: bool) {
        let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        let k = r * KAPPA;
        let (x1, y1) = (x + w, y + h);
        let paint = if fill { "f" } else { "S" };

        self.content_parts.push(format!(
            "{} {} m {} {} l {} {} {} {} {} {} c {} {} l {} {} {} {} {} {} c {} {} l {} {} {} {} {} {} c {} {} l {} {} {} {} {} {} c h {} ",
            num(x + r), num(y),
            num(x1 - r), num(y),
            num(x1 - r + k), num(y), num(x1), num(y + r - k), num(x1), num(y + r),
            num(x1), num(y1 - r),
            num(x1), num(y1 - r + k), num(x1 - r + k), num(y1), num(x1 - r), num(y1),
            num(x + r), num(y1),
            num(x + r - k), num(y1), num(x), num(y1 - r + k), num(x), num(y1 - r),
            num(x), num(y + r),
            num(x), num(y + r - k), num(x + r - k), num(y), num(x + r), num(y),
            paint
        ));
    }

    /// Stroked rectangle outline
    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.content_parts.push(format!("{} {} {} {} re S ", num(x), num(y), num(w), num(h)));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.content_parts.push(format!(
            "{} {} m {} {} l S ",
            num(x1), num(y1), num(x2), num(y2)
        ));
    }

    /// Draw a registered image scaled into the given box
    pub fn draw_image(&mut self, name: &str, x: f64, y: f64, w: f64, h: f64) {
        self.content_parts.push(format!(
            "q {} 0 0 {} {} {} cm /{} Do Q ",
            num(w), num(h), num(x), num(y), name
        ));
    }

    /// Draw a single line of text centred on `cx` with its baseline at `y`
    pub fn add_centered_text(&mut self, value: &str, style: &TextStyle, cx: f64, y: f64) {
        let Rgb(r, g, b) = style.color;
        let needs_cid = value.chars().any(|c| c > '\u{7F}');

        match (needs_cid, self.cid_font) {
            (true, Some(cid_font)) => {
                let value: String = value
                    .chars()
                    .map(|c| if cid_font.supports(c) || c.is_ascii() { c } else { '?' })
                    .collect();
                let width = cid_font.text_width(&value, style.size);
                self.content_parts.push(format!(
                    "q BT {} {} {} rg /{} {} Tf {} {} Td <{}> Tj ET Q ",
                    num(r), num(g), num(b),
                    CID_FONT_RESOURCE, num(style.size),
                    num(cx - width / 2.0), num(y),
                    encode_cid_text(&value)
                ));
            }
            _ => {
                let value = if needs_cid {
                    warn!("No font available for non-ASCII text {:?}; replacing with '?'", value);
                    value.chars().map(|c| if c.is_ascii() { c } else { '?' }).collect()
                } else {
                    value.to_string()
                };
                let width = style.font.text_width(&value, style.size);
                self.content_parts.push(format!(
                    "q BT {} {} {} rg /{} {} Tf {} {} Td ({}) Tj ET Q ",
                    num(r), num(g), num(b),
                    style.font.resource_name(), num(style.size),
                    num(cx - width / 2.0), num(y),
                    escape_pdf_string(&value)
                ));
            }
        }
    }

    /// Build the final content bytes
    pub fn build_content_bytes(&self) -> Vec<u8> {
        self.content_parts.join("").into_bytes()
    }
}

impl Default for ContentBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape special characters in PDF strings
pub fn escape_pdf_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '(' => result.push_str(r"\("),
            ')' => result.push_str(r"\)"),
            '\\' => result.push_str(r"\\"),
            '\n' => result.push_str(r"\n"),
            '\r' => result.push_str(r"\r"),
            '\t' => result.push_str(r"\t"),
            _ => result.push(c),
        }
    }
    result
}

/// Encode text for a CID font (Identity-H encoding)
///
/// Each character becomes its two-byte BMP code point in hex. Characters
/// outside the BMP have no CID in the font and are written as '?'.
pub fn encode_cid_text(s: &str) -> String {
    s.chars()
        .map(|c| {
            let code = if (c as u32) <= 0xFFFF { c as u32 } else { '?' as u32 };
            format!("{:04X}", code)
        })
        .collect()
}

/// Compress data using zlib/flate2
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn image_stream(width: u32, height: u32, color_space: &str, raw: &[u8]) -> Result<Stream> {
    let mut img_dict = Dictionary::new();
    img_dict.set("Type", "XObject");
    img_dict.set("Subtype", "Image");
    img_dict.set("Width", width as i64);
    img_dict.set("Height", height as i64);
    img_dict.set("ColorSpace", color_space);
    img_dict.set("BitsPerComponent", 8_i64);
    img_dict.set("Filter", "FlateDecode");
    Ok(Stream::new(img_dict, compress_data(raw)?))
}

/// Add a raster image to the document as an image XObject
///
/// Grayscale images stay DeviceGray, everything else becomes DeviceRGB.
/// An alpha channel is carried over as a soft mask.
pub fn add_image_xobject(doc: &mut Document, img: &DynamicImage) -> Result<ObjectId> {
    let (width, height) = (img.width(), img.height());

    let smask_id = if img.color().has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
        Some(doc.add_object(image_stream(width, height, "DeviceGray", &alpha)?))
    } else {
        None
    };

    let mut stream = match img {
        DynamicImage::ImageLuma8(gray) => image_stream(width, height, "DeviceGray", gray.as_raw())?,
        _ => image_stream(width, height, "DeviceRGB", img.to_rgb8().as_raw())?,
    };
    if let Some(id) = smask_id {
        stream.dict.set("SMask", Object::Reference(id));
    }

    Ok(doc.add_object(stream))
}
