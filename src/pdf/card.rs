//! Drawing of a single card.

use log::debug;

use super::content::{ContentBuilder, Rgb, TextStyle};
use super::fonts::StandardFont;
use crate::config::{CardLayout, ContactInfo};
use crate::layout::CardSlot;

const BACKGROUND: Rgb = Rgb(0.96, 0.97, 0.98);
const BORDER: Rgb = Rgb(0.1, 0.1, 0.1);
const QR_FRAME: Rgb = Rgb(0.15, 0.15, 0.15);
const CAPTION: Rgb = Rgb(0.05, 0.1, 0.2);
const DIVIDER: Rgb = Rgb(0.7, 0.7, 0.7);
const CONTACT: Rgb = Rgb(0.0, 0.0, 0.0);

/// XObject resource name of the shared logo
pub const LOGO_XOBJECT: &str = "Logo";

pub fn contact_lines(layout: &CardLayout, contact: &ContactInfo) -> [(String, f64); 3] {
    [
        (format!("{} : {}", layout.url_label, contact.url), layout.url_y),
        (format!("{} : {}", layout.email_label, contact.email), layout.email_y),
        (format!("{} : {}", layout.instagram_label, contact.instagram), layout.instagram_y),
    ]
}

/// Draw one card with its bottom-left corner at `slot`
///
/// `qr_xobject` must already be registered on the builder, as must the logo.
pub fn draw_card(
    builder: &mut ContentBuilder<'_>,
    slot: &CardSlot,
    layout: &CardLayout,
    contact: &ContactInfo,
    qr_xobject: &str,
) {
    let (x, y) = (slot.x, slot.y);
    let (w, h) = (layout.card_width, layout.card_height);
    let cx = x + w / 2.0;
    debug!("Card {} on page {} at ({:.2}, {:.2})", slot.index_on_page, slot.page + 1, x, y);

    builder.set_fill_color(BACKGROUND);
    builder.round_rect(x, y, w, h, layout.corner_radius, true);

    let inset = layout.border_inset;
    builder.set_stroke_color(BORDER);
    builder.set_line_width(layout.border_width);
    builder.round_rect(
        x + inset,
        y + inset,
        w - 2.0 * inset,
        h - 2.0 * inset,
        layout.border_radius,
        false,
    );

    builder.draw_image(
        LOGO_XOBJECT,
        cx + layout.logo_offset_x,
        y + h - layout.logo_top,
        layout.logo_width,
        layout.logo_height,
    );

    let qr_size = layout.qr_size;
    let qr_x = cx - qr_size / 2.0;
    let qr_y = y + h - layout.qr_top;
    let pad = layout.qr_frame_padding;
    builder.set_stroke_color(QR_FRAME);
    builder.set_line_width(layout.qr_frame_width);
    builder.stroke_rect(qr_x - pad, qr_y - pad, qr_size + 2.0 * pad, qr_size + 2.0 * pad);
    builder.draw_image(qr_xobject, qr_x, qr_y, qr_size, qr_size);

    let caption = TextStyle {
        font: StandardFont::HelveticaBold,
        size: layout.caption_font_size,
        color: CAPTION,
    };
    builder.add_centered_text(&layout.caption, &caption, cx, qr_y - layout.caption_gap);

    builder.set_stroke_color(DIVIDER);
    builder.line(
        x + layout.divider_inset,
        y + layout.divider_y,
        x + w - layout.divider_inset,
        y + layout.divider_y,
    );

    let contact_style = TextStyle {
        font: StandardFont::Helvetica,
        size: layout.contact_font_size,
        color: CONTACT,
    };
    for (text, offset) in contact_lines(layout, contact) {
        builder.add_centered_text(&text, &contact_style, cx, y + offset);
    }
}
