//! One generation run: collect QR images, check the logo, render the cards.

use anyhow::Result;
use log::{debug, info};
use std::path::PathBuf;

use crate::config::{CardLayout, ContactInfo, load_logo};
use crate::layout::cards_per_page;
use crate::pdf::{self, FontData};
use crate::qr::{images_from_files, images_from_links};

/// Where the QR codes come from. The two modes are exclusive.
#[derive(Debug, Clone)]
pub enum QrSource {
    Links(Vec<String>),
    Images(Vec<PathBuf>),
}

impl QrSource {
    pub fn is_empty(&self) -> bool {
        match self {
            QrSource::Links(links) => links.is_empty(),
            QrSource::Images(paths) => paths.is_empty(),
        }
    }
}

pub struct Request {
    pub source: QrSource,
    pub contact: ContactInfo,
    pub layout: CardLayout,
    pub logo_path: PathBuf,
    pub font: Option<FontData>,
    /// Leave out undecodable images instead of aborting.
    pub skip_bad_images: bool,
}

#[derive(Debug)]
pub enum Outcome {
    /// No links and no images: nothing was rendered.
    NothingToDo,
    Document {
        pdf: Vec<u8>,
        cards: usize,
        pages: usize,
    },
}

pub fn generate(request: &Request) -> Result<Outcome> {
    if request.source.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    let logo = load_logo(&request.logo_path)?;

    let images = match &request.source {
        QrSource::Links(links) => {
            info!("Encoding {} links", links.len());
            images_from_links(links)?
        }
        QrSource::Images(paths) => {
            info!("Decoding {} images", paths.len());
            images_from_files(paths, request.skip_bad_images)?
        }
    };
    if images.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    debug!("Up to {} cards per page", cards_per_page(&request.layout));
    let rendered = pdf::render(
        &images,
        &logo,
        &request.contact,
        &request.layout,
        request.font.as_ref(),
    )?;

    let cards = images.len();
    info!("Rendered {} cards on {} pages", cards, rendered.pages);
    Ok(Outcome::Document {
        pdf: rendered.pdf,
        cards,
        pages: rendered.pages,
    })
}
