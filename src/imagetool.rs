use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops::FilterType};
use tracing::{debug, trace};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Default edge length when only one target dimension is configured.
pub const DEFAULT_EDGE: u32 = 1024;

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .inspect_err(|e| trace!(%e, "unrecognised image bytes"))
        .ok()
        .map(|format| format.to_mime_type())
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_SIGNATURE)
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Pass PNG bytes through untouched, re-encode anything else as PNG.
pub fn ensure_png(bytes: Vec<u8>) -> Result<Vec<u8>, image::ImageError> {
    if is_png(&bytes) {
        return Ok(bytes);
    }
    let image = decode(&bytes)?;
    debug!(
        width = image.width(),
        height = image.height(),
        "re-encoding generated image as png"
    );
    encode_png(&image)
}

/// Scale `image` to fit inside `width`x`height` keeping its aspect ratio and
/// center it on a white canvas of exactly that size.
pub fn letterbox(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let resized = image.resize(width, height, FilterType::Lanczos3).to_rgba8();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let x = (width - resized.width()) / 2;
    let y = (height - resized.height()) / 2;
    image::imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    DynamicImage::ImageRgba8(canvas)
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView as _, Rgb, RgbImage};

    use super::*;

    #[test]
    fn letterbox_pads_with_white() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let boxed = letterbox(&source, 100, 100);
        assert_eq!(boxed.dimensions(), (100, 100));
        // 40x20 scales to 100x50, leaving 25px bands above and below
        assert_eq!(boxed.get_pixel(50, 5), Rgba([255, 255, 255, 255]));
        assert_eq!(boxed.get_pixel(50, 94), Rgba([255, 255, 255, 255]));
        assert_eq!(boxed.get_pixel(50, 50), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn ensure_png_converts_other_encodings() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 100, 50])));
        let mut jpeg = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        assert!(!is_png(&jpeg));
        assert_eq!(sniff_mime(&jpeg), Some("image/jpeg"));

        let png = ensure_png(jpeg).unwrap();
        assert!(is_png(&png));
        assert_eq!(decode(&png).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn ensure_png_keeps_png_bytes() {
        let png = crate::tests::png_bytes(3, 3);
        assert_eq!(ensure_png(png.clone()).unwrap(), png);
    }
}
