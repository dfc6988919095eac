use std::path::Path;

use tracing::debug;
use url::Url;

use crate::document::{html::fragment_to_html, model::Fragment};

/// Data offered by a paste or a drop, keyed the way a mime container is:
/// a URL list, an encoded inline image, HTML and plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MimePayload {
    pub urls: Vec<Url>,
    pub image: Option<Vec<u8>>,
    pub html: Option<String>,
    pub text: Option<String>,
}

impl MimePayload {
    pub fn from_urls(urls: impl IntoIterator<Item = Url>) -> Self {
        Self {
            urls: urls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Builds a drop payload from local paths. Relative paths have no
    /// `file://` form and are skipped.
    pub fn from_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let urls = paths
            .into_iter()
            .filter_map(|path| {
                let path = path.as_ref();
                let url = Url::from_file_path(path).ok();
                if url.is_none() {
                    debug!(path = %path.display(), "dropped path has no file url");
                }
                url
            })
            .collect::<Vec<_>>();
        Self::from_urls(urls)
    }

    pub fn from_image(bytes: Vec<u8>) -> Self {
        Self {
            image: Some(bytes),
            ..Self::default()
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::default()
        }
    }

    /// Text and clipboard-style HTML for a copied selection.
    pub fn from_fragment(fragment: &Fragment) -> Self {
        if fragment.is_empty() {
            return Self::default();
        }
        Self {
            text: Some(fragment.plain_text()),
            html: Some(build_cf_html(&fragment_to_html(fragment))),
            ..Self::default()
        }
    }

    pub fn has_urls(&self) -> bool {
        !self.urls.is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.image.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }

    pub fn has_html(&self) -> bool {
        self.html.as_ref().is_some_and(|html| !html.is_empty())
    }

    pub fn has_text(&self) -> bool {
        self.text.as_ref().is_some_and(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !(self.has_urls() || self.has_image() || self.has_html() || self.has_text())
    }

    pub fn plain_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Process-local clipboard used by copy, cut and paste.
#[derive(Debug, Default)]
pub struct Clipboard {
    contents: Option<MimePayload>,
}

impl Clipboard {
    pub fn set(&mut self, payload: MimePayload) {
        if payload.is_empty() {
            return;
        }
        self.contents = Some(payload);
    }

    pub fn payload(&self) -> Option<&MimePayload> {
        self.contents.as_ref()
    }
}

/// Wraps an HTML fragment in the `Version:1.0` header used by desktop
/// clipboards. Offsets are byte positions into the returned string.
pub fn build_cf_html(fragment: &str) -> String {
    let html_body =
        format!("<html><body><!--StartFragment-->{fragment}<!--EndFragment--></body></html>");
    let header_template = "Version:1.0\r\nStartHTML:0000000000\r\nEndHTML:0000000000\r\nStartFragment:0000000000\r\nEndFragment:0000000000\r\n";
    let start_html = header_template.len();
    let start_fragment = start_html + "<html><body><!--StartFragment-->".len();
    let end_fragment = start_fragment + fragment.len();
    let end_html = start_html + html_body.len();

    let header = format!(
        "Version:1.0\r\nStartHTML:{start_html:010}\r\nEndHTML:{end_html:010}\r\nStartFragment:{start_fragment:010}\r\nEndFragment:{end_fragment:010}\r\n"
    );
    format!("{header}{html_body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        html::fragment_from_html,
        model::{Inline, RunStyle},
    };

    #[test]
    fn capability_queries() {
        let empty = MimePayload::default();
        assert!(empty.is_empty());
        assert!(!empty.has_urls());

        let text = MimePayload::from_text("hi");
        assert!(text.has_text() && !text.has_image());

        let image = MimePayload::from_image(vec![1, 2, 3]);
        assert!(image.has_image());
        assert!(!MimePayload::from_image(Vec::new()).has_image());
    }

    #[test]
    fn file_paths_become_file_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let absolute = dir.path().join("a.png");
        let payload = MimePayload::from_files([absolute.as_path(), Path::new("relative.png")]);

        assert_eq!(payload.urls.len(), 1);
        assert_eq!(payload.urls[0].scheme(), "file");
        assert_eq!(payload.urls[0].to_file_path().ok(), Some(absolute));
    }

    #[test]
    fn copied_fragment_round_trips_through_html() {
        let bold = RunStyle {
            bold: true,
            ..RunStyle::default()
        };
        let fragment = Fragment {
            paragraphs: vec![
                vec![Inline::text("plain ", RunStyle::default()), Inline::text("bold", bold.clone())],
                vec![Inline::text("next", RunStyle::default())],
            ],
        };

        let payload = MimePayload::from_fragment(&fragment);
        assert_eq!(payload.plain_text(), Some("plain bold\nnext"));
        let html = payload.html.expect("html");
        assert!(html.starts_with("Version:1.0"));

        let parsed = fragment_from_html(&html);
        assert_eq!(parsed.plain_text(), "plain bold\nnext");
        assert_eq!(parsed.paragraphs[0][1], Inline::text("bold", bold));
    }

    #[test]
    fn cf_html_offsets_point_at_fragment() {
        let html = build_cf_html("<b>x</b>");
        let start: usize = html
            .split("StartFragment:")
            .nth(1)
            .and_then(|rest| rest.get(..10))
            .and_then(|digits| digits.parse().ok())
            .expect("start offset");
        assert!(html[start..].starts_with("<b>x</b>"));
    }

    #[test]
    fn clipboard_ignores_empty_payloads() {
        let mut clipboard = Clipboard::default();
        clipboard.set(MimePayload::from_text("a"));
        clipboard.set(MimePayload::default());
        assert_eq!(clipboard.payload().and_then(|p| p.plain_text()), Some("a"));
        clipboard.set(MimePayload::from_text("b"));
        assert_eq!(clipboard.payload().and_then(|p| p.plain_text()), Some("b"));
    }
}
