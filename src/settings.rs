use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SettingsError, StoreError};
use crate::labels::Lang;
use crate::persist::{write_json_atomic, SETTINGS_FILE};

pub const THEME_COLORS: &[&str] = &[
    "teal", "blue", "indigo", "violet", "purple", "fuchsia", "pink", "rose", "orange", "amber",
    "green", "emerald", "cyan", "sky",
];

pub const THEME_FONTS: &[&str] = &[
    "Inter",
    "Roboto",
    "Poppins",
    "Montserrat",
    "Oswald",
    "Playfair Display",
];

/// Values persisted next to the store, independent of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub authenticated: bool,
    #[serde(deserialize_with = "lenient_lang")]
    pub lang: Lang,
    pub theme: String,
    pub font: String,
    /// TrueType font embedded into PDF exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            authenticated: false,
            lang: Lang::default(),
            theme: THEME_COLORS[0].to_string(),
            font: THEME_FONTS[0].to_string(),
            pdf_font: None,
        }
    }
}

// An unrecognized language code falls back to the default instead of
// discarding the whole file.
fn lenient_lang<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Lang, D::Error> {
    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code
        .and_then(|code| Lang::parse(&code).ok())
        .unwrap_or_default())
}

impl Settings {
    pub fn set_theme(&mut self, color: &str) -> Result<(), SettingsError> {
        let color = color.trim();
        if !THEME_COLORS.contains(&color) {
            return Err(SettingsError::UnknownColor(color.to_string()));
        }
        self.theme = color.to_string();
        Ok(())
    }

    pub fn set_font(&mut self, font: &str) -> Result<(), SettingsError> {
        let font = font.trim();
        let known = THEME_FONTS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(font))
            .ok_or_else(|| SettingsError::UnknownFont(font.to_string()))?;
        self.font = known.to_string();
        Ok(())
    }

    pub fn set_lang(&mut self, code: &str) -> Result<(), SettingsError> {
        self.lang = Lang::parse(code)?;
        Ok(())
    }
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// Read settings, returning defaults if the file is missing or unreadable.
pub fn read_settings(data_dir: &Path) -> Settings {
    let path = settings_path(data_dir);
    match std::fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
            log::warn!("failed to parse '{}': {err}", path.display());
            Settings::default()
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            log::warn!("failed to read '{}': {err}", path.display());
            Settings::default()
        }
    }
}

/// Write settings via temp-file + rename.
pub fn write_settings(data_dir: &Path, settings: &Settings) -> Result<(), StoreError> {
    write_json_atomic(&settings_path(data_dir), settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::persist::tests::create_temp_dir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = create_temp_dir("ecorecycle-settings-missing");
        let settings = read_settings(&dir);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.theme, "teal");
        assert_eq!(settings.font, "Inter");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn written_settings_read_back() {
        let dir = create_temp_dir("ecorecycle-settings-roundtrip");
        let mut settings = Settings::default();
        settings.set_lang("tj").unwrap();
        settings.set_theme("rose").unwrap();
        settings.set_font("playfair display").unwrap();
        settings.pdf_font = Some(PathBuf::from("/usr/share/fonts/DejaVuSans.ttf"));
        write_settings(&dir, &settings).unwrap();

        let loaded = read_settings(&dir);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.font, "Playfair Display");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_or_odd_files_keep_known_fields() {
        let parsed: Settings =
            serde_json::from_str(r#"{"authenticated":true,"lang":"de","theme":"sky"}"#).unwrap();
        assert!(parsed.authenticated);
        assert_eq!(parsed.lang, Lang::Ru);
        assert_eq!(parsed.theme, "sky");
        assert_eq!(parsed.font, "Inter");
    }

    #[test]
    fn rejects_values_outside_the_palette() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_theme("magenta"),
            Err(SettingsError::UnknownColor(_))
        ));
        assert!(matches!(
            settings.set_font("Comic Sans"),
            Err(SettingsError::UnknownFont(_))
        ));
        assert_eq!(settings, Settings::default());
    }
}
