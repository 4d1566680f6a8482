//! QR image sources: encode a link, or decode an image file.

use image::{DynamicImage, Luma};
use log::{debug, warn};
use qrcode::QrCode;
use std::path::{Path, PathBuf};

use crate::error::CardError;

/// Minimum edge length of a rendered QR raster, in pixels.
const QR_MIN_PIXELS: u32 = 400;

/// Encode a link as a black-on-white QR raster with a quiet zone.
pub fn generate_qr_image(link: &str) -> Result<DynamicImage, CardError> {
    let qr_code = QrCode::new(link.as_bytes()).map_err(|source| CardError::QrEncode {
        link: link.to_string(),
        source,
    })?;

    let img = qr_code
        .render::<Luma<u8>>()
        .light_color(Luma([255u8]))
        .dark_color(Luma([0u8]))
        .quiet_zone(true)
        .min_dimensions(QR_MIN_PIXELS, QR_MIN_PIXELS)
        .build();

    debug!("Encoded {:?} as {}x{} QR image", link, img.width(), img.height());
    Ok(DynamicImage::ImageLuma8(img))
}

/// Decode an uploaded QR image and convert it to RGB.
pub fn load_qr_image(path: &Path) -> Result<DynamicImage, CardError> {
    let img = image::open(path).map_err(|source| CardError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {:?} ({}x{})", path, img.width(), img.height());
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

pub fn images_from_links(links: &[String]) -> Result<Vec<DynamicImage>, CardError> {
    links.iter().map(|link| generate_qr_image(link)).collect()
}

/// Decode every file in order. Bad files abort the run unless `skip_bad` is
/// set, in which case they are logged and left out.
pub fn images_from_files(
    paths: &[PathBuf],
    skip_bad: bool,
) -> Result<Vec<DynamicImage>, CardError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        match load_qr_image(path) {
            Ok(img) => images.push(img),
            Err(e) if skip_bad => warn!("Skipping {:?}: {}", path, e),
            Err(e) => return Err(e),
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Write;

    #[test]
    fn test_generate_qr_image_is_square_and_large_enough() {
        let img = generate_qr_image("https://example.com/vehicle/42").unwrap();
        assert_eq!(img.width(), img.height());
        assert!(img.width() >= QR_MIN_PIXELS);
    }

    #[test]
    fn test_generate_qr_image_has_white_quiet_zone() {
        let img = generate_qr_image("https://example.com").unwrap().to_luma8();
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert!(img.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn test_generate_qr_image_is_deterministic() {
        let a = generate_qr_image("https://example.com/a").unwrap();
        let b = generate_qr_image("https://example.com/a").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_generate_qr_image_too_long() {
        let link = "x".repeat(8000);
        let err = generate_qr_image(&link).unwrap_err();
        assert!(matches!(err, CardError::QrEncode { .. }));
    }

    #[test]
    fn test_load_qr_image_converts_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.png");
        RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let img = load_qr_image(&path).unwrap();
        assert!(matches!(img, DynamicImage::ImageRgb8(_)));
        assert_eq!(img.width(), 20);
    }

    #[test]
    fn test_images_from_files_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::new(10, 10).save_with_format(&good, ImageFormat::Png).unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::File::create(&bad).unwrap().write_all(b"garbage").unwrap();

        let paths = vec![good.clone(), bad.clone()];
        let err = images_from_files(&paths, false).unwrap_err();
        assert!(matches!(err, CardError::ImageDecode { ref path, .. } if path == &bad));

        let images = images_from_files(&paths, true).unwrap();
        assert_eq!(images.len(), 1);
    }
}
