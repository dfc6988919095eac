use std::{fs, path::Path};

use image::GenericImageView;

use crate::{
    document::{
        lowercase_extension,
        model::{ImageRef, ImageResource},
    },
    error::{NotepadError, Result},
    settings::EditorConfig,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImageAsset {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

impl LoadedImageAsset {
    pub fn image_ref(&self, key: impl Into<String>) -> ImageRef {
        ImageRef {
            key: key.into(),
            width: self.width,
            height: self.height,
        }
    }

    pub fn into_resource(self) -> ImageResource {
        ImageResource {
            bytes: self.bytes,
            mime: self.mime,
            width: self.width,
            height: self.height,
        }
    }
}

/// Reads an image file whose extension is in the configured image set.
pub fn load_supported_image(path: &Path, config: &EditorConfig) -> Result<LoadedImageAsset> {
    let ext = lowercase_extension(path)
        .ok_or_else(|| NotepadError::UnsupportedImage("missing file extension".to_string()))?;
    if !config.is_image_extension(&ext) {
        return Err(NotepadError::UnsupportedImage(ext));
    }

    let bytes = fs::read(path).map_err(|e| NotepadError::io(path, e))?;
    let (width, height) = image::load_from_memory(&bytes)?.dimensions();
    let mime = mime_for_extension(&ext)
        .map(str::to_string)
        .unwrap_or_else(|| sniff_mime(&bytes));

    Ok(LoadedImageAsset {
        bytes,
        mime,
        width,
        height,
    })
}

/// Decodes encoded image bytes taken from a clipboard or drop payload.
pub fn decode_image_bytes(bytes: Vec<u8>) -> Result<LoadedImageAsset> {
    let (width, height) = image::load_from_memory(&bytes)?.dimensions();
    let mime = sniff_mime(&bytes);
    Ok(LoadedImageAsset {
        bytes,
        mime,
        width,
        height,
    })
}

/// Keeps clipboard bytes that no decoder understands. The size is unknown.
pub fn undecoded_image(bytes: Vec<u8>) -> LoadedImageAsset {
    let mime = sniff_mime(&bytes);
    LoadedImageAsset {
        bytes,
        mime,
        width: 0,
        height: 0,
    }
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

fn sniff_mime(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}
