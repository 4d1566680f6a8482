//! Configuration loading and parsing.
//!
//! This module handles:
//! - Unit conversion for dimensions (mm, cm, in, pt)
//! - Card layout geometry, with optional overrides from a layout JSON file
//! - Contact text printed on every card
//! - Loading links (plain text or CSV) and the logo asset

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use image::DynamicImage;
use serde::{Deserialize, Deserializer};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::error::CardError;

/// PDF points per centimetre (1 inch = 72 points = 2.54 cm).
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// A4 page size in points.
pub const A4_WIDTH: f64 = 21.0 * POINTS_PER_CM;
pub const A4_HEIGHT: f64 = 29.7 * POINTS_PER_CM;

pub const DEFAULT_LOGO_FILE: &str = "static_logo.png";
pub const DEFAULT_OUTPUT_FILE: &str = "vehicle_qr_8x10cm_professional.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub fn cm_to_points(cm: f64) -> f64 {
    cm * POINTS_PER_CM
}

/// Dimension value that can be specified as:
/// - A number (interpreted as points)
/// - A string with unit: e.g., "100 mm", "10 cm", "1 in" (inches)
#[derive(Debug, Clone, Copy)]
pub struct Dimension(pub f64);

impl Dimension {
    /// Convert to points (internal PDF unit)
    pub fn as_points(&self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DimensionVisitor;

        impl serde::de::Visitor<'_> for DimensionVisitor {
            type Value = Dimension;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a number or a string with unit (e.g., \"80 mm\", \"8 cm\", \"1 in\")")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_dimension(value).map(Dimension).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(DimensionVisitor)
    }
}

fn parse_dimension(value: &str) -> Result<f64, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_alphabetic() || c.is_whitespace())
        .unwrap_or(value.len());
    let (num_str, unit) = value.split_at(split);
    let unit = unit.trim().to_lowercase();

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number in dimension: {}", num_str))?;

    match unit.as_str() {
        "" | "pt" | "point" | "points" => Ok(num),
        "mm" => Ok(cm_to_points(num / 10.0)),
        "cm" => Ok(cm_to_points(num)),
        "in" | "inch" | "inches" => Ok(num * 72.0),
        _ => Err(format!("unknown unit '{}'. Supported: mm, cm, in, pt", unit)),
    }
}

fn points<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Dimension::deserialize(deserializer).map(|d| d.as_points())
}

/// Geometry and fixed text of one card, in points.
///
/// Vertical offsets are measured up from the card's bottom edge unless the
/// field name says otherwise (`*_top` is measured down from the top edge).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardLayout {
    #[serde(deserialize_with = "points")]
    pub page_width: f64,
    #[serde(deserialize_with = "points")]
    pub page_height: f64,
    #[serde(deserialize_with = "points")]
    pub card_width: f64,
    #[serde(deserialize_with = "points")]
    pub card_height: f64,
    /// Left edge of every card.
    #[serde(deserialize_with = "points")]
    pub left: f64,
    /// Distance from the page top to the first card's top edge.
    #[serde(deserialize_with = "points")]
    pub top_margin: f64,
    #[serde(deserialize_with = "points")]
    pub gap: f64,
    /// A card whose bottom edge would fall below this starts a new page.
    #[serde(deserialize_with = "points")]
    pub min_bottom: f64,

    #[serde(deserialize_with = "points")]
    pub corner_radius: f64,
    #[serde(deserialize_with = "points")]
    pub border_inset: f64,
    #[serde(deserialize_with = "points")]
    pub border_radius: f64,
    #[serde(deserialize_with = "points")]
    pub border_width: f64,

    #[serde(deserialize_with = "points")]
    pub logo_width: f64,
    #[serde(deserialize_with = "points")]
    pub logo_height: f64,
    /// Logo x relative to the card's horizontal centre.
    #[serde(deserialize_with = "points")]
    pub logo_offset_x: f64,
    #[serde(deserialize_with = "points")]
    pub logo_top: f64,

    #[serde(deserialize_with = "points")]
    pub qr_size: f64,
    /// Distance from the card top to the QR image's bottom edge.
    #[serde(deserialize_with = "points")]
    pub qr_top: f64,
    #[serde(deserialize_with = "points")]
    pub qr_frame_padding: f64,
    #[serde(deserialize_with = "points")]
    pub qr_frame_width: f64,

    pub caption: String,
    #[serde(deserialize_with = "points")]
    pub caption_font_size: f64,
    /// Baseline distance below the QR image.
    #[serde(deserialize_with = "points")]
    pub caption_gap: f64,

    #[serde(deserialize_with = "points")]
    pub divider_y: f64,
    #[serde(deserialize_with = "points")]
    pub divider_inset: f64,

    #[serde(deserialize_with = "points")]
    pub contact_font_size: f64,
    #[serde(deserialize_with = "points")]
    pub url_y: f64,
    #[serde(deserialize_with = "points")]
    pub email_y: f64,
    #[serde(deserialize_with = "points")]
    pub instagram_y: f64,
    pub url_label: String,
    pub email_label: String,
    pub instagram_label: String,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            card_width: cm_to_points(8.0),
            card_height: cm_to_points(10.0),
            left: 40.0,
            top_margin: 40.0,
            gap: 20.0,
            min_bottom: 60.0,

            corner_radius: 14.0,
            border_inset: 3.0,
            border_radius: 12.0,
            border_width: 2.0,

            logo_width: 130.0,
            logo_height: 30.0,
            logo_offset_x: -60.0,
            logo_top: 45.0,

            qr_size: 138.0,
            qr_top: 200.0,
            qr_frame_padding: 8.0,
            qr_frame_width: 1.6,

            caption: "SCAN TO CONTACT OWNER".to_string(),
            caption_font_size: 15.0,
            caption_gap: 25.0,

            divider_y: 78.0,
            divider_inset: 30.0,

            contact_font_size: 9.5,
            url_y: 40.0,
            email_y: 25.0,
            instagram_y: 12.0,
            url_label: "Web".to_string(),
            email_label: "Email".to_string(),
            instagram_label: "Instagram".to_string(),
        }
    }
}

impl CardLayout {
    /// Bottom edge of the first card on every page.
    pub fn first_card_y(&self) -> f64 {
        self.page_height - self.card_height - self.top_margin
    }

    /// Vertical distance between the bottom edges of consecutive cards.
    pub fn pitch(&self) -> f64 {
        self.card_height + self.gap
    }

    /// Reject geometry that would make cards overlap or leave the page.
    pub fn validate(&self) -> Result<()> {
        if self.card_width <= 0.0 || self.card_height <= 0.0 {
            bail!(
                "Card size must be positive, got {} x {} pt",
                self.card_width,
                self.card_height
            );
        }
        if self.gap < 0.0 {
            bail!("Gap between cards must not be negative, got {} pt", self.gap);
        }
        if self.left < 0.0 || self.left + self.card_width > self.page_width {
            bail!(
                "Card of width {} pt at x = {} pt does not fit a page {} pt wide",
                self.card_width,
                self.left,
                self.page_width
            );
        }
        if self.first_card_y() < 0.0 {
            bail!(
                "Card of height {} pt with top margin {} pt does not fit a page {} pt high",
                self.card_height,
                self.top_margin,
                self.page_height
            );
        }
        Ok(())
    }
}

/// Contact details printed identically on every card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: String,
    pub url: String,
    pub instagram: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            email: "info@company.com".to_string(),
            url: "www.meripahchan.in".to_string(),
            instagram: "@meripahchanindia".to_string(),
        }
    }
}

/// Helper function to open a file with consistent error context
fn open_file_with_context(path: &Path, description: &str) -> Result<File> {
    File::open(path)
        .with_context(|| format!("Failed to open {} at {:?}", description, path))
}

/// Load the card layout, applying overrides from a JSON file when given.
pub fn load_layout(path: Option<&Path>) -> Result<CardLayout> {
    let Some(path) = path else {
        return Ok(CardLayout::default());
    };
    let file = open_file_with_context(path, "layout file")?;
    let reader = BufReader::new(file);
    let layout: CardLayout = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse layout file {:?}", path))?;
    layout
        .validate()
        .with_context(|| format!("Invalid layout in {:?}", path))?;
    Ok(layout)
}

/// Split newline-separated text into trimmed, non-empty links.
pub fn collect_links(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Load links from a file: a `.csv` file with a header row, or plain text with
/// one link per line.
pub fn load_links(path: &Path) -> Result<Vec<String>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        return load_csv_links(path);
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read links file at {:?}", path))?;
    Ok(collect_links(&text))
}

fn load_csv_links(path: &Path) -> Result<Vec<String>> {
    let file = open_file_with_context(path, "links CSV")?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = rdr.headers()?.clone();

    let column = ["link", "url"]
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name)))
        .unwrap_or(0);

    let mut links = Vec::new();
    for result in rdr.records() {
        let record = result.with_context(|| format!("Failed to read row in {:?}", path))?;
        if let Some(link) = record.get(column).map(str::trim).filter(|l| !l.is_empty()) {
            links.push(link.to_string());
        }
    }
    Ok(links)
}

/// Load the shared logo. Its absence is fatal for the whole run.
pub fn load_logo(path: &Path) -> Result<DynamicImage, CardError> {
    if !path.exists() {
        return Err(CardError::MissingLogo(path.to_path_buf()));
    }
    image::open(path).map_err(|source| CardError::LogoDecode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_cm_to_points() {
        assert!((cm_to_points(2.54) - 72.0).abs() < 1e-9);
        assert!((cm_to_points(8.0) - 226.77).abs() < 0.01);
        assert!((cm_to_points(10.0) - 283.46).abs() < 0.01);
    }

    #[test]
    fn test_a4_size() {
        assert!((A4_WIDTH - 595.28).abs() < 0.01);
        assert!((A4_HEIGHT - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_dimension_from_number() {
        let dim: Dimension = serde_json::from_value(json!(100)).unwrap();
        assert_eq!(dim.as_points(), 100.0);
        let dim: Dimension = serde_json::from_value(json!(12.5)).unwrap();
        assert_eq!(dim.as_points(), 12.5);
    }

    #[test]
    fn test_dimension_from_units() {
        let mm: Dimension = serde_json::from_value(json!("100 mm")).unwrap();
        assert!((mm.as_points() - 283.46).abs() < 0.01);
        let cm: Dimension = serde_json::from_value(json!("10cm")).unwrap();
        assert!((cm.as_points() - 283.46).abs() < 0.01);
        let inch: Dimension = serde_json::from_value(json!("1 inch")).unwrap();
        assert_eq!(inch.as_points(), 72.0);
        let pt: Dimension = serde_json::from_value(json!("  100  PT  ")).unwrap();
        assert_eq!(pt.as_points(), 100.0);
    }

    #[test]
    fn test_dimension_invalid() {
        assert!(serde_json::from_value::<Dimension>(json!("100 foo")).is_err());
        assert!(serde_json::from_value::<Dimension>(json!("abc mm")).is_err());
    }

    #[test]
    fn test_default_layout_geometry() {
        let layout = CardLayout::default();
        assert!((layout.first_card_y() - 518.43).abs() < 0.01);
        assert!((layout.pitch() - 303.46).abs() < 0.01);
    }

    #[test]
    fn test_layout_partial_override() {
        let layout: CardLayout = serde_json::from_value(json!({
            "card_height": "8 cm",
            "gap": 10,
            "caption": "SCAN ME"
        }))
        .unwrap();
        assert!((layout.card_height - cm_to_points(8.0)).abs() < 1e-9);
        assert_eq!(layout.gap, 10.0);
        assert_eq!(layout.caption, "SCAN ME");
        assert_eq!(layout.card_width, CardLayout::default().card_width);
    }

    #[test]
    fn test_layout_rejects_unknown_field() {
        let result: Result<CardLayout, _> = serde_json::from_value(json!({ "colums": 2 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_layout_without_file_is_default() {
        assert_eq!(load_layout(None).unwrap(), CardLayout::default());
    }

    fn layout_file(overrides: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", overrides).unwrap();
        file
    }

    #[test]
    fn test_load_layout_applies_valid_overrides() {
        let file = layout_file(json!({ "card_height": "8 cm", "gap": 0 }));
        let layout = load_layout(Some(file.path())).unwrap();
        assert!((layout.card_height - cm_to_points(8.0)).abs() < 1e-9);
        assert_eq!(layout.gap, 0.0);
    }

    #[test]
    fn test_load_layout_rejects_negative_gap() {
        let file = layout_file(json!({ "gap": -150 }));
        let err = load_layout(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("Gap"));
    }

    #[test]
    fn test_load_layout_rejects_zero_card_height() {
        let file = layout_file(json!({ "card_height": 0, "gap": 0 }));
        assert!(load_layout(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_layout_rejects_zero_card_width() {
        let file = layout_file(json!({ "card_width": "0 cm" }));
        assert!(load_layout(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_layout_rejects_card_taller_than_page() {
        let file = layout_file(json!({ "card_height": "30 cm" }));
        let err = load_layout(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("does not fit"));
    }

    #[test]
    fn test_load_layout_rejects_card_wider_than_page() {
        let file = layout_file(json!({ "left": 400 }));
        assert!(load_layout(Some(file.path())).is_err());
        let file = layout_file(json!({ "card_width": "20 cm" }));
        assert!(load_layout(Some(file.path())).is_err());
    }

    #[test]
    fn test_default_layout_is_valid() {
        assert!(CardLayout::default().validate().is_ok());
    }

    #[test]
    fn test_collect_links_skips_blank_lines() {
        let links = collect_links("https://a.example\n\n   \n  https://b.example  \r\n");
        assert_eq!(links, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_load_links_plain_text() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "https://one.example\n\nhttps://two.example").unwrap();
        let links = load_links(file.path()).unwrap();
        assert_eq!(links, vec!["https://one.example", "https://two.example"]);
    }

    #[test]
    fn test_load_links_csv_uses_link_column() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "plate,link").unwrap();
        writeln!(file, "KA01,https://one.example").unwrap();
        writeln!(file, "KA02,").unwrap();
        writeln!(file, "KA03, https://three.example ").unwrap();
        let links = load_links(file.path()).unwrap();
        assert_eq!(links, vec!["https://one.example", "https://three.example"]);
    }

    #[test]
    fn test_load_logo_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_logo(&dir.path().join(DEFAULT_LOGO_FILE)).unwrap_err();
        assert!(matches!(err, CardError::MissingLogo(_)));
    }

    #[test]
    fn test_load_logo_undecodable() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"not a png").unwrap();
        let err = load_logo(file.path()).unwrap_err();
        assert!(matches!(err, CardError::LogoDecode { .. }));
    }
}
