//! File-backed settings layer (`duebot.toml`).
//!
//! Settings are the durable defaults; environment variables override them at
//! resolve time. A missing file yields `Settings::default()` so a fresh
//! checkout works with zero setup.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_SETTINGS_FILE: &str = "duebot.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Path to the client table.
    pub store_path: String,
    pub merchant: MerchantSettings,
    pub reminder: ReminderSettings,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MerchantSettings {
    /// UPI virtual payment address, e.g. `9876543210@ybl`. No link is built
    /// when unset.
    pub upi_id: Option<String>,
    /// Display name inserted into the payment link.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReminderSettings {
    /// Gemini model id used for generateContent.
    pub model: String,
    /// Default phrasing style; any `Tone` value.
    pub tone: String,
    /// Word cap requested from the generator (requested, not enforced).
    pub max_words: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    /// `deep-link` or `automated`.
    pub mode: String,
    /// Seconds to wait for WhatsApp Web to load before sending.
    pub surface_load_secs: u64,
    /// Seconds to pause between consecutive automated sends.
    pub between_sends_secs: u64,
    /// Optional QR-code image attached during automated sends.
    pub qr_image: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: "clients.csv".to_string(),
            merchant: MerchantSettings::default(),
            reminder: ReminderSettings::default(),
            dispatch: DispatchSettings::default(),
        }
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            tone: "polite".to_string(),
            max_words: 20,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            mode: "deep-link".to_string(),
            surface_load_secs: 18,
            between_sends_secs: 6,
            qr_image: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key: path.display().to_string(),
                    message: format!("failed to read settings file: {e}"),
                });
            }
        };

        toml::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
            key: path.display().to_string(),
            message: format!("invalid settings TOML: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Settings;

    #[test]
    fn missing_file_yields_defaults() {
        let settings =
            Settings::load(std::path::Path::new("no/such/duebot.toml")).expect("defaults");
        assert_eq!(settings.store_path, "clients.csv");
        assert_eq!(settings.reminder.max_words, 20);
        assert_eq!(settings.dispatch.surface_load_secs, 18);
        assert_eq!(settings.dispatch.between_sends_secs, 6);
        assert_eq!(settings.merchant.upi_id, None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_sections() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "store_path = \"gym.csv\"\n\n[merchant]\nupi_id = \"9876543210@ybl\"\n"
        )
        .expect("write");

        let settings = Settings::load(file.path()).expect("parse");
        assert_eq!(settings.store_path, "gym.csv");
        assert_eq!(settings.merchant.upi_id.as_deref(), Some("9876543210@ybl"));
        assert_eq!(settings.reminder.model, "gemini-pro");
        assert_eq!(settings.dispatch.mode, "deep-link");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "store_pathh = \"typo.csv\"\n").expect("write");

        let err = Settings::load(file.path()).expect_err("must reject unknown key");
        assert!(err.to_string().contains("invalid settings TOML"));
    }
}
