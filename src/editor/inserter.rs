use tracing::{debug, warn};
use url::Url;

use crate::{
    document::{
        html::fragment_from_html,
        lowercase_extension,
        model::Document,
    },
    editor::{
        EditEngine,
        clipboard::MimePayload,
        image_ops::{LoadedImageAsset, decode_image_bytes, load_supported_image, undecoded_image},
    },
    settings::EditorConfig,
};

const MAX_KEY_ATTEMPTS: usize = 8;

/// What a paste or drop ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Every URL was a local image; one image per URL was inserted.
    ImagesFromUrls(usize),
    /// Inline image data was stored under the returned key.
    ClipboardImage(String),
    /// The payload went to default text/HTML insertion.
    Fallback,
    Nothing,
}

/// Source of resource keys for pasted images.
pub trait KeyGenerator {
    fn next_key(&mut self) -> String;
}

/// Random v4 UUIDs in simple (hyphenless hex) form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidKeys;

impl KeyGenerator for UuidKeys {
    fn next_key(&mut self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// A widget that accepts pasted and dropped content.
pub trait TextSurface {
    fn can_accept_payload(&self, payload: &MimePayload) -> bool;
    fn insert_payload(&mut self, payload: &MimePayload) -> InsertOutcome;
}

pub struct ContentInserter {
    config: EditorConfig,
    keys: Box<dyn KeyGenerator>,
}

impl std::fmt::Debug for ContentInserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentInserter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentInserter {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_keys(config, Box::new(UuidKeys))
    }

    pub fn with_keys(config: EditorConfig, keys: Box<dyn KeyGenerator>) -> Self {
        Self { config, keys }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_accept_payload(&self, payload: &MimePayload) -> bool {
        payload.has_image() || payload.has_urls() || payload.has_html() || payload.has_text()
    }

    pub fn insert_payload(
        &mut self,
        doc: &mut Document,
        engine: &mut EditEngine,
        payload: &MimePayload,
    ) -> InsertOutcome {
        if payload.has_urls() {
            match self.load_url_images(&payload.urls) {
                Some(images) => {
                    let count = images.len();
                    for (url, image) in images {
                        let key = url.as_str().to_string();
                        let image_ref = image.image_ref(key.as_str());
                        doc.register_resource(key, image.into_resource());
                        engine.insert_image(doc, image_ref);
                    }
                    debug!(count, "inserted dropped images");
                    return InsertOutcome::ImagesFromUrls(count);
                }
                None => {
                    debug!(urls = payload.urls.len(), "url batch rejected, using default insertion");
                    return self.insert_default(doc, engine, payload);
                }
            }
        }

        if let Some(bytes) = payload.image.as_ref().filter(|bytes| !bytes.is_empty()) {
            let image = decode_image_bytes(bytes.clone()).unwrap_or_else(|err| {
                debug!(error = %err, "clipboard image could not be decoded, keeping raw bytes");
                undecoded_image(bytes.clone())
            });
            let Some(key) = self.fresh_key(doc) else {
                warn!("no unused resource key for clipboard image");
                return InsertOutcome::Nothing;
            };
            let image_ref = image.image_ref(key.as_str());
            doc.register_resource(key.clone(), image.into_resource());
            engine.insert_image(doc, image_ref);
            debug!(%key, "inserted clipboard image");
            return InsertOutcome::ClipboardImage(key);
        }

        self.insert_default(doc, engine, payload)
    }

    /// Loads every URL or none: a single non-qualifying entry rejects the batch.
    fn load_url_images(&self, urls: &[Url]) -> Option<Vec<(Url, LoadedImageAsset)>> {
        let mut loaded = Vec::with_capacity(urls.len());
        for url in urls {
            if url.scheme() != "file" {
                debug!(%url, "not a local file");
                return None;
            }
            let path = url.to_file_path().ok()?;
            let is_image = lowercase_extension(&path).is_some_and(|ext| self.config.is_image_extension(&ext));
            if !is_image {
                debug!(%url, "not an image extension");
                return None;
            }
            match load_supported_image(&path, &self.config) {
                Ok(image) => loaded.push((url.clone(), image)),
                Err(err) => {
                    debug!(%url, error = %err, "image could not be loaded");
                    return None;
                }
            }
        }
        Some(loaded)
    }

    fn fresh_key(&mut self, doc: &Document) -> Option<String> {
        (0..MAX_KEY_ATTEMPTS)
            .map(|_| self.keys.next_key())
            .find(|key| !key.is_empty() && doc.resource(key).is_none())
    }

    fn insert_default(&self, doc: &mut Document, engine: &mut EditEngine, payload: &MimePayload) -> InsertOutcome {
        let inserted = match (&payload.html, payload.plain_text()) {
            (Some(html), text) if payload.has_html() => {
                let fragment = fragment_from_html(html);
                if fragment.is_empty() {
                    text.is_some_and(|text| engine.insert_text(doc, text))
                } else {
                    engine.insert_fragment(doc, fragment)
                }
            }
            (_, Some(text)) => engine.insert_text(doc, text),
            _ => false,
        };

        if inserted {
            InsertOutcome::Fallback
        } else {
            InsertOutcome::Nothing
        }
    }
}
