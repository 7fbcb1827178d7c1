//! Source image decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, ImageFormat, ImageRaster, Orientation};

/// Decode a PNG, JPEG or WEBP image identified by its mime type.
///
/// EXIF orientation is applied so the raster matches what a browser would
/// draw for the same file.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` for any other mime type and
/// `DecodeError::CorruptedFile` if the bytes do not decode.
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<ImageRaster, DecodeError> {
    let orientation = extract_orientation(bytes);
    let (img, format) = read(bytes, mime)?;
    let oriented = apply_orientation(img, orientation);
    Ok(ImageRaster::from_rgba_image(oriented.into_rgba8(), format))
}

/// Decode without applying EXIF orientation.
pub fn decode_image_no_orientation(bytes: &[u8], mime: &str) -> Result<ImageRaster, DecodeError> {
    let (img, format) = read(bytes, mime)?;
    Ok(ImageRaster::from_rgba_image(img.into_rgba8(), format))
}

/// Extract EXIF orientation from image bytes (for external use).
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn read(bytes: &[u8], mime: &str) -> Result<(DynamicImage, ImageFormat), DecodeError> {
    let format = ImageFormat::from_mime(mime)
        .ok_or_else(|| DecodeError::UnsupportedFormat(mime.to_string()))?;

    let img = ImageReader::with_format(Cursor::new(bytes), format.to_image_format())
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: img.width(),
            height: img.height(),
        });
    }

    log::debug!(
        "decoded {} image {}x{}",
        format.mime_type(),
        img.width(),
        img.height()
    );
    Ok((img, format))
}

/// Returns `Orientation::Normal` if no EXIF data is found.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
