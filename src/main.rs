mod config;
mod error;
mod generate;
mod layout;
mod pdf;
mod qr;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};
use std::fs;
use std::path::PathBuf;

use config::{
    ContactInfo, DEFAULT_LOGO_FILE, DEFAULT_OUTPUT_FILE, PDF_MIME_TYPE, load_layout, load_links,
};
use generate::{Outcome, QrSource, Request, generate};
use pdf::load_font_file;

/// Generate a print-ready PDF of 8x10cm vehicle QR cards.
#[derive(Parser, Debug)]
#[command(name = "qr_card_print")]
#[command(about = "Generate a print-ready PDF of 8x10cm vehicle QR cards.", long_about = None)]
struct Args {
    /// File with one link per line, or a CSV file with a `link` column
    #[arg(short, long, conflicts_with = "images")]
    links: Option<PathBuf>,

    /// A link to encode; may be repeated
    #[arg(long, conflicts_with = "images")]
    link: Vec<String>,

    /// Pre-rendered QR images (PNG or JPEG)
    #[arg(short, long, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Leave out images that cannot be decoded instead of aborting
    #[arg(long, requires = "images")]
    skip_bad_images: bool,

    #[arg(long, default_value = "info@company.com")]
    email: String,

    #[arg(long, default_value = "www.meripahchan.in")]
    url: String,

    #[arg(long, default_value = "@meripahchanindia")]
    instagram: String,

    /// Logo printed at the top of every card
    #[arg(long, default_value = DEFAULT_LOGO_FILE)]
    logo: PathBuf,

    /// JSON file overriding the card layout
    #[arg(long)]
    layout: Option<PathBuf>,

    /// TrueType font for text the built-in fonts cannot print
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn build_request(args: &Args) -> Result<Request> {
    let source = if args.images.is_empty() {
        let mut links = match &args.links {
            Some(path) => load_links(path)?,
            None => Vec::new(),
        };
        links.extend(config::collect_links(&args.link.join("\n")));
        QrSource::Links(links)
    } else {
        QrSource::Images(args.images.clone())
    };

    let font = args.font.as_deref().map(load_font_file).transpose()?;

    Ok(Request {
        source,
        contact: ContactInfo {
            email: args.email.clone(),
            url: args.url.clone(),
            instagram: args.instagram.clone(),
        },
        layout: load_layout(args.layout.as_deref())?,
        logo_path: args.logo.clone(),
        font,
        skip_bad_images: args.skip_bad_images,
    })
}

fn run(args: Args) -> Result<()> {
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(anyhow!("Output directory not found: {:?}", parent));
        }
    }

    let request = build_request(&args)?;

    match generate(&request)? {
        Outcome::NothingToDo => {
            info!("No QR input given; nothing to generate");
            println!("Add QR links (--links / --link) or QR images (--images) to continue.");
        }
        Outcome::Document { pdf, cards, pages } => {
            fs::write(&args.output, &pdf)
                .with_context(|| format!("Failed to write {:?}", args.output))?;
            println!(
                "Saved {:?} ({}) with {} cards on {} pages",
                args.output, PDF_MIME_TYPE, cards, pages
            );
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
