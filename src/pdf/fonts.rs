//! Fonts for card text: the standard Helvetica pair, plus an embedded
//! TrueType fallback for characters they cannot draw.

use anyhow::{Context, Result, anyhow};
use fontdb::Database;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use ttf_parser::Face;

use super::metrics::{self, HELVETICA, HELVETICA_BOLD};

/// Standard PDF Type1 fonts used on the cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// Get the PDF BaseFont name for this font
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name of the font in page resource dictionaries
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    /// Width of `text` in points when set at `size`
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA,
            StandardFont::HelveticaBold => &HELVETICA_BOLD,
        };
        let units: u32 = text.chars().map(|c| metrics::char_width(table, c) as u32).sum();
        units as f64 * size / 1000.0
    }
}

/// Resource name of the embedded fallback font
pub const CID_FONT_RESOURCE: &str = "F3";

/// Create a font in the PDF document
pub fn create_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", "Font");
    font_dict.set("Subtype", "Type1");
    font_dict.set("BaseFont", font.base_font_name());
    font_dict.set("Encoding", "WinAnsiEncoding");
    doc.add_object(Object::Dictionary(font_dict))
}

/// Raw TrueType font program used for text the standard fonts cannot show
#[derive(Debug, Clone)]
pub struct FontData {
    pub data: Vec<u8>,
    pub index: u32,
    pub name: String,
}

impl FontData {
    /// Whether every character in `chars` has a glyph in this font
    pub fn covers(&self, chars: &BTreeSet<char>) -> bool {
        Face::parse(&self.data, self.index)
            .map(|face| chars.iter().all(|&c| face.glyph_index(c).is_some()))
            .unwrap_or(false)
    }
}

/// Read a TrueType font file chosen by the user
pub fn load_font_file(path: &Path) -> Result<FontData> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read font file: {:?}", path))?;
    // FontFile2 holds a single face
    if let Some(count) = ttf_parser::fonts_in_collection(&data) {
        return Err(anyhow!(
            "Font {:?} is a collection of {} fonts; pass a single .ttf file",
            path,
            count
        ));
    }
    let face = Face::parse(&data, 0)
        .map_err(|e| anyhow!("Failed to parse font file {:?}: {}", path, e))?;
    if face.tables().glyf.is_none() {
        return Err(anyhow!("Font {:?} has no TrueType outlines", path));
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Fallback")
        .to_string();
    Ok(FontData { data, index: 0, name })
}

/// An embedded Type0 font with the widths of the characters it will draw
#[derive(Debug, Clone)]
pub struct CidFont {
    pub id: ObjectId,
    widths: HashMap<char, u16>,
}

impl CidFont {
    pub fn supports(&self, c: char) -> bool {
        self.widths.contains_key(&c)
    }

    /// Width of `text` in points when set at `size`
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: u32 = text
            .chars()
            .map(|c| self.widths.get(&c).copied().unwrap_or(metrics::DEFAULT_WIDTH) as u32)
            .sum();
        units as f64 * size / 1000.0
    }
}

/// Build a CIDToGIDMap stream from font's cmap table
///
/// CIDs are Unicode code points (Identity-H), so the map has one big-endian
/// glyph ID for every BMP code point.
fn build_cidtogid_map(face: &Face) -> Vec<u8> {
    const MAX_CID: u16 = 0xFFFF;
    let mut gid_map: Vec<u8> = Vec::with_capacity((MAX_CID as usize + 1) * 2);

    for cid in 0..=MAX_CID {
        let gid = char::from_u32(cid as u32)
            .and_then(|ch| face.glyph_index(ch))
            .map(|g| g.0)
            .unwrap_or(0);
        gid_map.extend_from_slice(&gid.to_be_bytes());
    }

    gid_map
}

/// Embed a CID-keyed TrueType font covering `chars`
///
/// Creates a Type0 font with a CIDFontType2 descendant, a CIDToGIDMap and a
/// /W array for the characters that will be drawn. Characters outside the
/// BMP or missing from the font are left out.
pub fn embed_cid_font(
    doc: &mut Document,
    font: &FontData,
    chars: &BTreeSet<char>,
) -> Result<CidFont> {
    let face = Face::parse(&font.data, font.index)
        .map_err(|e| anyhow!("Failed to parse font {}: {}", font.name, e))?;
    let scale = 1000.0 / face.units_per_em() as f64;
    let to_pdf_units = |v: i16| (v as f64 * scale).round() as i64;

    let mut widths = HashMap::new();
    let mut w_array = Vec::new();
    for &c in chars {
        if c as u32 > 0xFFFF {
            continue;
        }
        if let Some(gid) = face.glyph_index(c) {
            let advance = face.glyph_hor_advance(gid).unwrap_or(0);
            let width = (advance as f64 * scale).round() as u16;
            widths.insert(c, width);
            w_array.push(Object::Integer(c as i64));
            w_array.push(Object::Array(vec![Object::Integer(width as i64)]));
        }
    }

    let base_font = font.name.replace(' ', "-");

    let mut cid_font = Dictionary::new();
    cid_font.set("Type", "Font");
    cid_font.set("Subtype", "CIDFontType2");
    cid_font.set("BaseFont", base_font.as_str());
    cid_font.set("CIDSystemInfo", {
        let mut cid_system = Dictionary::new();
        cid_system.set("Registry", Object::String("Adobe".into(), StringFormat::Literal));
        cid_system.set("Ordering", Object::String("Identity".into(), StringFormat::Literal));
        cid_system.set("Supplement", 0i64);
        Object::Dictionary(cid_system)
    });
    cid_font.set("DW", metrics::DEFAULT_WIDTH as i64);
    cid_font.set("W", w_array);

    let cidtogid_stream = Stream::new(Dictionary::new(), build_cidtogid_map(&face));
    let cidtogid_id = doc.add_object(cidtogid_stream);
    cid_font.set("CIDToGIDMap", Object::Reference(cidtogid_id));

    let bbox = face.global_bounding_box();
    let mut font_descriptor = Dictionary::new();
    font_descriptor.set("Type", "FontDescriptor");
    font_descriptor.set("FontName", base_font.as_str());
    font_descriptor.set("Flags", 4i64); // Symbolic
    font_descriptor.set(
        "FontBBox",
        [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max]
            .into_iter()
            .map(|v| Object::Integer(to_pdf_units(v)))
            .collect::<Vec<_>>(),
    );
    font_descriptor.set("ItalicAngle", 0i64);
    font_descriptor.set("Ascent", to_pdf_units(face.ascender()));
    font_descriptor.set("Descent", to_pdf_units(face.descender()));
    let cap_height = face.capital_height().unwrap_or(face.ascender());
    font_descriptor.set("CapHeight", to_pdf_units(cap_height));
    font_descriptor.set("StemV", 80i64);

    let mut font_stream_dict = Dictionary::new();
    font_stream_dict.set("Length1", font.data.len() as i64);
    let font_stream_id = doc.add_object(Stream::new(font_stream_dict, font.data.clone()));
    font_descriptor.set("FontFile2", Object::Reference(font_stream_id));

    let descriptor_id = doc.add_object(Object::Dictionary(font_descriptor));
    cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
    let cid_font_id = doc.add_object(Object::Dictionary(cid_font));

    let mut type0_font = Dictionary::new();
    type0_font.set("Type", "Font");
    type0_font.set("Subtype", "Type0");
    type0_font.set("BaseFont", base_font.as_str());
    type0_font.set("Encoding", "Identity-H");
    type0_font.set("DescendantFonts", vec![Object::Reference(cid_font_id)]);

    let id = doc.add_object(Object::Dictionary(type0_font));
    Ok(CidFont { id, widths })
}

/// Find a system font that has glyphs for every character in `chars`
///
/// Only single TrueType faces qualify: collections and CFF-flavoured
/// OpenType fonts cannot be embedded as FontFile2.
pub fn find_cid_font(chars: &BTreeSet<char>) -> Option<FontData> {
    let mut db = Database::new();
    db.load_system_fonts();

    let font_families = [
        "DejaVu Sans",
        "Noto Sans",
        "Liberation Sans",
        "Arial Unicode MS",
        "Arial",
        "Segoe UI Symbol",
        "Segoe UI",
        "FreeSans",
        "Noto Sans CJK JP",
        "IPA Gothic",
        "Meiryo",
    ];

    for family in &font_families {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..Default::default()
        };
        let Some(id) = db.query(&query) else {
            continue;
        };
        let candidate = db.with_face_data(id, |data, index| {
            let face = Face::parse(data, index).ok()?;
            if index != 0 || face.tables().glyf.is_none() {
                return None;
            }
            Some(FontData {
                data: data.to_vec(),
                index,
                name: family.to_string(),
            })
        });
        if let Some(font) = candidate.flatten() {
            if font.covers(chars) {
                return Some(font);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_font_names() {
        assert_eq!(StandardFont::Helvetica.base_font_name(), "Helvetica");
        assert_eq!(StandardFont::HelveticaBold.base_font_name(), "Helvetica-Bold");
        assert_ne!(
            StandardFont::Helvetica.resource_name(),
            StandardFont::HelveticaBold.resource_name()
        );
    }

    #[test]
    fn test_standard_text_width() {
        // "Hi" = 722 + 222 units in Helvetica
        let width = StandardFont::Helvetica.text_width("Hi", 10.0);
        assert!((width - 9.44).abs() < 1e-9);
        assert!(
            StandardFont::HelveticaBold.text_width("SCAN", 15.0)
                > StandardFont::Helvetica.text_width("SCAN", 15.0) - 1e-9
        );
        assert_eq!(StandardFont::Helvetica.text_width("", 12.0), 0.0);
    }

    #[test]
    fn test_create_font() {
        let mut doc = Document::with_version("1.5");
        let id = create_font(&mut doc, StandardFont::HelveticaBold);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica-Bold");
    }

    #[test]
    fn test_load_font_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(load_font_file(&path).is_err());
    }

    #[test]
    fn test_load_font_file_rejects_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fonts.ttc");
        // TTC header: tag, version 1.0, two fonts, their table directory offsets
        let mut header = b"ttcf".to_vec();
        header.extend_from_slice(&[0, 1, 0, 0]);
        header.extend_from_slice(&2u32.to_be_bytes());
        header.extend_from_slice(&20u32.to_be_bytes());
        header.extend_from_slice(&32u32.to_be_bytes());
        fs::write(&path, &header).unwrap();
        let err = load_font_file(&path).unwrap_err();
        assert!(err.to_string().contains("collection of 2 fonts"));
    }
}
