use serde::{Deserialize, Serialize};

pub const SETTINGS_SCHEMA_VERSION: u32 = 1;
pub const MIN_FONT_SIZE: u32 = 1;
pub const MAX_FONT_SIZE: u32 = 288;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub schema_version: u32,
    pub editor: EditorSettings,
    pub files: FileSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SETTINGS_SCHEMA_VERSION,
            editor: EditorSettings::default(),
            files: FileSettings::default(),
        }
    }
}

impl Settings {
    pub fn migrate(mut self) -> Self {
        if self.schema_version > SETTINGS_SCHEMA_VERSION {
            return self;
        }

        self.editor.max_font_size = self.editor.max_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.editor.default_font_size = self
            .editor
            .default_font_size
            .clamp(MIN_FONT_SIZE as f32, self.editor.max_font_size as f32);
        self.files.image_extensions = normalize_extensions(&self.files.image_extensions);
        self.files.html_extensions = normalize_extensions(&self.files.html_extensions);
        self.schema_version = SETTINGS_SCHEMA_VERSION;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub default_font_family: String,
    pub default_font_size: f32,
    pub max_font_size: u32,
    pub word_wrap: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_font_family: "Times".to_string(),
            default_font_size: 14.0,
            max_font_size: MAX_FONT_SIZE,
            word_wrap: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileSettings {
    pub image_extensions: Vec<String>,
    pub html_extensions: Vec<String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            image_extensions: vec![".jpg".to_string(), ".png".to_string(), ".bmp".to_string()],
            html_extensions: vec![".htm".to_string(), ".html".to_string()],
        }
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let trimmed = ext.trim().to_ascii_lowercase();
        if trimmed.is_empty() || trimmed == "." {
            continue;
        }
        let dotted = if trimmed.starts_with('.') {
            trimmed
        } else {
            format!(".{trimmed}")
        };
        if !out.contains(&dotted) {
            out.push(dotted);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_normalizes_extensions() {
        let mut settings = Settings::default();
        settings.files.image_extensions = vec!["PNG".into(), ".Jpg".into(), "".into(), ".png".into()];

        let migrated = settings.migrate();
        assert_eq!(migrated.files.image_extensions, vec![".png", ".jpg"]);
    }

    #[test]
    fn migrate_clamps_font_sizes() {
        let mut settings = Settings::default();
        settings.editor.max_font_size = 10_000;
        settings.editor.default_font_size = 0.0;

        let migrated = settings.migrate();
        assert_eq!(migrated.editor.max_font_size, MAX_FONT_SIZE);
        assert_eq!(migrated.editor.default_font_size, 1.0);
    }

    #[test]
    fn unknown_and_missing_fields_fall_back_to_defaults() {
        let parsed: Settings =
            serde_json::from_str(r#"{"editor":{"word_wrap":false},"window":{"width":1}}"#).expect("parse");
        assert!(!parsed.editor.word_wrap);
        assert_eq!(parsed.editor.default_font_family, "Times");
        assert_eq!(parsed.files, FileSettings::default());
    }
}
