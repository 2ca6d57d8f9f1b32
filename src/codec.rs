//! Decoding and encoding through the `image` crate.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

use crate::error::{EditorError, EditorResult};

/// Extension used when the MIME subtype is missing.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Formats the export path writes natively. Anything else is encoded as PNG.
const WRITABLE: [ImageFormat; 6] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Encoded output bytes together with the MIME type actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Returns true for `image/*` MIME types.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Derives a file extension from the MIME subtype (`image/png` -> `png`,
/// `image/svg+xml` -> `svg`). Falls back to [`DEFAULT_EXTENSION`].
pub fn extension_for_mime(mime: &str) -> String {
    let subtype = mime
        .split_once('/')
        .map(|(_, sub)| sub)
        .unwrap_or_default();
    let subtype = subtype.split(';').next().unwrap_or_default();
    let subtype = subtype.split('+').next().unwrap_or_default().trim();

    if subtype.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        subtype.to_ascii_lowercase()
    }
}

/// `<stem>.<ext>` for the given MIME type.
pub fn export_file_name(stem: &str, mime: &str) -> String {
    format!("{}.{}", stem, extension_for_mime(mime))
}

/// Decodes encoded image bytes into an RGBA buffer at natural resolution.
///
/// The container format is sniffed from the bytes, so a mislabeled MIME type
/// does not prevent decoding.
pub fn decode(bytes: &[u8]) -> EditorResult<RgbaImage> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(decoded.to_rgba8())
}

/// Decodes on a helper thread and gives up after `timeout`.
///
/// With `timeout == None` this is a plain [`decode`] on the calling thread.
/// A timed-out decode keeps running to completion in the background; its
/// result is discarded.
pub fn decode_with_timeout(bytes: Arc<[u8]>, timeout: Option<Duration>) -> EditorResult<RgbaImage> {
    let Some(timeout) = timeout else {
        return decode(&bytes);
    };

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(decode(&bytes));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "decode timed out");
            Err(EditorError::DecodeTimeout(timeout.as_millis() as u64))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(EditorError::surface("decoder thread exited without a result"))
        }
    }
}

/// Encodes `image` for the requested MIME type.
///
/// JPEG drops the alpha channel and uses `jpeg_quality`. Types the encoder
/// cannot write fall back to PNG; the returned [`Encoded::mime_type`] always
/// names the format actually written.
pub fn encode(image: &RgbaImage, mime: &str, jpeg_quality: u8) -> EditorResult<Encoded> {
    let format = ImageFormat::from_mime_type(mime.trim())
        .filter(|format| WRITABLE.contains(format))
        .unwrap_or_else(|| {
            tracing::warn!(mime, "no encoder for MIME type, writing PNG");
            ImageFormat::Png
        });

    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, jpeg_quality.clamp(1, 100))
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(|e| EditorError::encode(e.to_string()))?;
        }
        other => {
            DynamicImage::ImageRgba8(image.clone())
                .write_to(&mut Cursor::new(&mut bytes), other)
                .map_err(|e| EditorError::encode(e.to_string()))?;
        }
    }

    Ok(Encoded {
        bytes,
        mime_type: format.to_mime_type().to_string(),
    })
}
