//! Card Layout Engine: pages of cards assembled into one PDF document.

use anyhow::{Result, bail};
use image::DynamicImage;
use log::{debug, info, warn};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::collections::BTreeSet;

use super::card::{LOGO_XOBJECT, contact_lines, draw_card};
use super::content::{ContentBuilder, add_image_xobject};
use super::fonts::{CidFont, FontData, StandardFont, create_font, embed_cid_font, find_cid_font};
use super::resources::{font_resources, page_resources};
use crate::config::{CardLayout, ContactInfo};
use crate::layout::plan;

pub const DOCUMENT_TITLE: &str = "Vehicle QR Cards";

fn card_texts(layout: &CardLayout, contact: &ContactInfo) -> Vec<String> {
    let mut texts = vec![layout.caption.clone()];
    texts.extend(contact_lines(layout, contact).into_iter().map(|(text, _)| text));
    texts
}

/// Characters in the card text that the standard fonts cannot draw
fn non_ascii_chars(layout: &CardLayout, contact: &ContactInfo) -> BTreeSet<char> {
    card_texts(layout, contact)
        .iter()
        .flat_map(|t| t.chars())
        .filter(|c| !c.is_ascii())
        .collect()
}

/// Embed a fallback font when the card text needs one
///
/// The font gets widths for every character on the card, so ASCII text
/// sharing a line with non-ASCII text is spaced correctly too.
fn prepare_cid_font(
    doc: &mut Document,
    layout: &CardLayout,
    contact: &ContactInfo,
    font: Option<&FontData>,
) -> Result<Option<CidFont>> {
    let missing = non_ascii_chars(layout, contact);
    if missing.is_empty() {
        return Ok(None);
    }
    let chars: BTreeSet<char> = card_texts(layout, contact)
        .iter()
        .flat_map(|t| t.chars())
        .collect();

    let font = match font {
        Some(font) => Some(font.clone()),
        None => find_cid_font(&missing),
    };
    match font {
        Some(font) => {
            info!("Using font {} for non-ASCII text", font.name);
            embed_cid_font(doc, &font, &chars).map(Some)
        }
        None => {
            warn!("No installed font covers {:?}; those characters will print as '?'", missing);
            Ok(None)
        }
    }
}

/// Lay out one card per QR image and build the complete PDF document
///
/// Cards fill each page top to bottom; a new page starts when the next
/// card would cross the bottom margin. The logo is embedded once and shared
/// by every card.
pub fn create_card_document(
    images: &[DynamicImage],
    logo: &DynamicImage,
    contact: &ContactInfo,
    layout: &CardLayout,
    font: Option<&FontData>,
) -> Result<Document> {
    if images.is_empty() {
        bail!("No QR images to render");
    }
    layout.validate()?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = create_font(&mut doc, StandardFont::Helvetica);
    let bold_id = create_font(&mut doc, StandardFont::HelveticaBold);
    let cid_font = prepare_cid_font(&mut doc, layout, contact, font)?;
    let fonts = font_resources(regular_id, bold_id, cid_font.as_ref().map(|f| f.id));

    let logo_id = add_image_xobject(&mut doc, logo)?;

    let pages = plan(images.len(), layout);
    let mut images = images.iter();
    let mut kids = Vec::with_capacity(pages.len());

    for slots in &pages {
        let mut builder = ContentBuilder::new_with_cid_font(cid_font.as_ref());
        builder.register_image(LOGO_XOBJECT, logo_id);

        for (slot, qr_img) in slots.iter().zip(images.by_ref()) {
            let qr_id = add_image_xobject(&mut doc, qr_img)?;
            let qr_name = format!("Qr{}", qr_id.0);
            builder.register_image(&qr_name, qr_id);
            draw_card(&mut builder, slot, layout, contact, &qr_name);
        }

        let content = Stream::new(Dictionary::new(), builder.build_content_bytes());
        let content_id = doc.add_object(content);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(layout.page_width as f32),
                Object::Real(layout.page_height as f32),
            ],
            "Contents" => content_id,
            "Resources" => page_resources(&fonts, &builder.xobjects),
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(DOCUMENT_TITLE),
        "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let cards: usize = pages.iter().map(Vec::len).sum();
    debug!("Laid out {} cards on {} pages", cards, page_count);
    Ok(doc)
}

/// A serialized card document
#[derive(Debug)]
pub struct RenderedCards {
    pub pdf: Vec<u8>,
    /// Pages in the document's page tree
    pub pages: usize,
}

/// Render the cards and serialize the document to PDF bytes
pub fn render(
    images: &[DynamicImage],
    logo: &DynamicImage,
    contact: &ContactInfo,
    layout: &CardLayout,
    font: Option<&FontData>,
) -> Result<RenderedCards> {
    let mut doc = create_card_document(images, logo, contact, layout, font)?;
    let pages = doc.get_pages().len();
    let mut pdf = Vec::new();
    doc.save_to(&mut pdf)?;
    Ok(RenderedCards { pdf, pages })
}
