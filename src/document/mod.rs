pub mod html;
pub mod model;
pub mod txt;

use std::{fs, path::Path};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{
    editor::image_ops::load_supported_image,
    error::{NotepadError, Result},
    settings::EditorConfig,
};
use model::{Document, Inline, RunStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    PlainText,
    Html,
}

/// Lowercased extension including the leading dot, e.g. `".png"`.
/// Dotfiles such as `.bashrc` have no extension.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

pub fn detect_format(path: &Path, config: &EditorConfig) -> DocumentFormat {
    match lowercase_extension(path) {
        Some(ext) if config.is_html_extension(&ext) => DocumentFormat::Html,
        _ => DocumentFormat::PlainText,
    }
}

pub fn serialize(doc: &Document, format: DocumentFormat) -> String {
    match format {
        DocumentFormat::PlainText => txt::to_plain_text(doc),
        DocumentFormat::Html => html::to_html(doc),
    }
}

/// Writes `doc` to `path`, choosing HTML or plain text from the extension.
/// The document itself is never touched; callers update their state only
/// once this returns `Ok`.
pub fn save_document(path: &Path, doc: &Document, config: &EditorConfig) -> Result<DocumentFormat> {
    let format = detect_format(path, config);
    let text = serialize(doc, format);
    fs::write(path, text).map_err(|e| NotepadError::io(path, e))?;
    info!(path = %path.display(), ?format, "document saved");
    Ok(format)
}

/// Reads and decodes `path`. Content that looks like HTML, or a file with an
/// HTML extension, is parsed as rich text.
pub fn load_document(path: &Path, config: &EditorConfig, base: &RunStyle) -> Result<Document> {
    let bytes = fs::read(path).map_err(|e| NotepadError::io(path, e))?;
    let decoded = txt::decode_text(&bytes);

    let format = if detect_format(path, config) == DocumentFormat::Html
        || html::might_be_rich_text(&decoded.text)
    {
        DocumentFormat::Html
    } else {
        DocumentFormat::PlainText
    };

    let mut doc = match format {
        DocumentFormat::Html => {
            let mut doc = html::from_html(&decoded.text, base);
            resolve_local_images(&mut doc, path, config);
            doc
        }
        DocumentFormat::PlainText => txt::from_plain_text(&decoded.text, base),
    };
    doc.metadata.file_path = Some(path.to_path_buf());
    doc.metadata.format = format;
    doc.metadata.modified = Some(Utc::now());
    info!(
        path = %path.display(),
        encoding = decoded.encoding_name,
        ?format,
        "document loaded"
    );
    Ok(doc)
}

/// Loads the bytes behind `file:` image sources so reopened pages carry
/// their resources. Relative sources resolve against the page's directory.
/// Images that cannot be loaded keep their reference without a resource.
fn resolve_local_images(doc: &mut Document, page: &Path, config: &EditorConfig) {
    let base = std::path::absolute(page).ok().and_then(|p| Url::from_file_path(p).ok());
    let keys: Vec<String> = doc
        .content
        .iter()
        .flat_map(|p| p.inlines.iter())
        .filter_map(|inline| match inline {
            Inline::Image(image) => Some(image.key.clone()),
            Inline::Text(_) => None,
        })
        .collect();

    for key in keys {
        if doc.resource(&key).is_some() {
            continue;
        }
        let url = match Url::parse(&key) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match base.as_ref().map(|b| b.join(&key)) {
                Some(Ok(url)) => url,
                _ => continue,
            },
            Err(_) => continue,
        };
        if url.scheme() != "file" {
            continue;
        }
        let Ok(image_path) = url.to_file_path() else {
            continue;
        };
        match load_supported_image(&image_path, config) {
            Ok(image) => {
                doc.register_resource(key, image.into_resource());
            }
            Err(err) => debug!(%url, error = %err, "image source not loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::document::model::{Fragment, Inline};

    fn bold_doc() -> Document {
        let style = RunStyle {
            bold: true,
            ..RunStyle::default()
        };
        Document::from_fragment(
            Fragment {
                paragraphs: vec![vec![Inline::text("hi", style)]],
            },
            RunStyle::default(),
        )
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(lowercase_extension(Path::new("a/B.PNG")).as_deref(), Some(".png"));
        assert_eq!(lowercase_extension(Path::new("x")), None);
        assert_eq!(lowercase_extension(Path::new(".bashrc")), None);
    }

    #[test]
    fn html_extensions_select_html_format() {
        let config = EditorConfig::default();
        assert_eq!(detect_format(Path::new("x.html"), &config), DocumentFormat::Html);
        assert_eq!(detect_format(Path::new("x.HTM"), &config), DocumentFormat::Html);
        assert_eq!(detect_format(Path::new("x.txt"), &config), DocumentFormat::PlainText);
        assert_eq!(detect_format(Path::new("x"), &config), DocumentFormat::PlainText);
    }

    #[test]
    fn save_writes_html_or_plain_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EditorConfig::default();
        let doc = bold_doc();

        let html_path = dir.path().join("x.html");
        assert_eq!(save_document(&html_path, &doc, &config).expect("save html"), DocumentFormat::Html);
        let html = fs::read_to_string(&html_path).expect("read html");
        assert!(html.contains("font-weight:bold"));

        for name in ["x.txt", "x"] {
            let path = dir.path().join(name);
            assert_eq!(save_document(&path, &doc, &config).expect("save"), DocumentFormat::PlainText);
            assert_eq!(fs::read_to_string(&path).expect("read"), "hi");
        }
    }

    #[test]
    fn save_to_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path: PathBuf = dir.path().join("missing").join("x.txt");
        let err = save_document(&path, &bold_doc(), &EditorConfig::default()).expect_err("must fail");
        assert!(matches!(err, NotepadError::Io { .. }));
    }

    #[test]
    fn load_html_reads_local_image_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let png = dir.path().join("pic.png");
        image::DynamicImage::new_rgb8(3, 2)
            .save_with_format(&png, image::ImageFormat::Png)
            .expect("write png");
        let absolute = Url::from_file_path(&png).expect("file url").to_string();

        let page = dir.path().join("page.html");
        fs::write(
            &page,
            format!(
                "<p><img src=\"{absolute}\" /><img src=\"pic.png\" /><img src=\"gone.png\" /><img src=\"https://example.com/x.png\" /></p>"
            ),
        )
        .expect("write page");

        let doc = load_document(&page, &EditorConfig::default(), &RunStyle::default()).expect("load");
        assert_eq!(doc.image_count(), 4);
        assert_eq!(doc.resources.len(), 2);
        let resource = doc.resource(&absolute).expect("absolute source");
        assert_eq!((resource.width, resource.height), (3, 2));
        assert_eq!(resource.mime, "image/png");
        assert_eq!(resource.bytes, fs::read(&png).expect("read png"));
        assert!(doc.resource("pic.png").is_some());
        assert!(doc.resource("gone.png").is_none());
        assert!(!doc.dirty);
    }

    #[test]
    fn load_sniffs_rich_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.txt");
        fs::write(&path, "<html><body><p><b>bold</b></p></body></html>").expect("write");

        let doc = load_document(&path, &EditorConfig::default(), &RunStyle::default()).expect("load");
        assert_eq!(doc.metadata.format, DocumentFormat::Html);
        assert_eq!(txt::to_plain_text(&doc), "bold");
        assert_eq!(doc.metadata.file_path.as_deref(), Some(path.as_path()));
    }
}
