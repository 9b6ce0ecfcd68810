//! Configuration resolution.
//!
//! The original tool held the API key, UPI id, and merchant name in
//! page-level widget state. Here everything lives in one resolved [`Config`]
//! built once at startup (settings file overridden by environment) and
//! passed explicitly into the pipeline components.

pub(crate) mod helpers;
pub mod settings;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_string_env, parse_u16_env, parse_u64_env};
use crate::config::settings::Settings;
use crate::dispatch::{DispatchMode, PacingConfig};
use crate::error::ConfigError;
use crate::reminder::Tone;

/// Merchant payment identity inserted into UPI links.
#[derive(Debug, Clone, Default)]
pub struct MerchantConfig {
    pub upi_id: Option<String>,
    pub name: Option<String>,
}

/// Dispatcher mode and pacing.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    pub pacing: PacingConfig,
    /// Attachment hint for automated sends; validated to exist at resolve
    /// time, nothing more.
    pub qr_image: Option<PathBuf>,
}

/// Fully resolved runtime configuration.
#[derive(Debug)]
pub struct Config {
    pub store_path: PathBuf,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub merchant: MerchantConfig,
    pub tone: Tone,
    pub max_words: u16,
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let store_path = PathBuf::from(parse_string_env(
            "DUEBOT_STORE",
            settings.store_path.clone(),
        )?);

        let api_key = optional_env("GEMINI_API_KEY")?.map(SecretString::from);
        let model = parse_string_env("DUEBOT_MODEL", settings.reminder.model.clone())?;

        let tone_raw = parse_string_env("DUEBOT_TONE", settings.reminder.tone.clone())?;
        let tone = Tone::from_value(&tone_raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "DUEBOT_TONE".to_string(),
            message: format!("unknown tone '{tone_raw}'"),
        })?;

        let max_words = parse_u16_env("DUEBOT_MAX_WORDS", settings.reminder.max_words)?;
        if !(5..=60).contains(&max_words) {
            return Err(ConfigError::InvalidValue {
                key: "DUEBOT_MAX_WORDS".to_string(),
                message: format!("word cap must be between 5 and 60, got {max_words}"),
            });
        }

        let merchant = MerchantConfig {
            upi_id: optional_env("DUEBOT_UPI_ID")?.or_else(|| settings.merchant.upi_id.clone()),
            name: optional_env("DUEBOT_MERCHANT_NAME")?.or_else(|| settings.merchant.name.clone()),
        };

        let mode_raw = parse_string_env("DUEBOT_DISPATCH_MODE", settings.dispatch.mode.clone())?;
        let mode = DispatchMode::from_value(&mode_raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "DUEBOT_DISPATCH_MODE".to_string(),
            message: format!("expected 'deep-link' or 'automated', got '{mode_raw}'"),
        })?;

        let pacing = PacingConfig {
            surface_load: Duration::from_secs(parse_u64_env(
                "DUEBOT_SURFACE_LOAD_SECS",
                settings.dispatch.surface_load_secs,
            )?),
            between_sends: Duration::from_secs(parse_u64_env(
                "DUEBOT_BETWEEN_SENDS_SECS",
                settings.dispatch.between_sends_secs,
            )?),
        };

        let qr_image = optional_env("DUEBOT_QR_IMAGE")?
            .or_else(|| settings.dispatch.qr_image.clone())
            .map(PathBuf::from);
        if let Some(ref path) = qr_image
            && !path.exists()
        {
            return Err(ConfigError::InvalidValue {
                key: "DUEBOT_QR_IMAGE".to_string(),
                message: format!("QR image '{}' does not exist", path.display()),
            });
        }

        Ok(Self {
            store_path,
            api_key,
            model,
            merchant,
            tone,
            max_words,
            dispatch: DispatchConfig {
                mode,
                pacing,
                qr_image,
            },
        })
    }

    /// The generation credential is a blocking precondition: callers take it
    /// before any record processing begins, and a missing key stops the run
    /// up front.
    pub fn take_api_key(&mut self) -> Result<SecretString, ConfigError> {
        self.api_key.take().ok_or_else(|| ConfigError::Missing {
            key: "GEMINI_API_KEY".to_string(),
            hint: "set it in the environment or a .env file".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::settings::Settings;
    use crate::dispatch::DispatchMode;
    use crate::reminder::Tone;

    use super::Config;

    #[test]
    fn resolve_uses_settings_defaults() {
        let config = Config::resolve(&Settings::default()).expect("config");
        assert_eq!(config.store_path.to_str(), Some("clients.csv"));
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.tone, Tone::Polite);
        assert_eq!(config.max_words, 20);
        assert_eq!(config.dispatch.mode, DispatchMode::DeepLink);
        assert_eq!(config.dispatch.pacing.surface_load.as_secs(), 18);
        assert_eq!(config.dispatch.pacing.between_sends.as_secs(), 6);
    }

    #[test]
    fn resolve_rejects_unknown_tone() {
        let mut settings = Settings::default();
        settings.reminder.tone = "sarcastic".to_string();

        let err = Config::resolve(&settings).expect_err("must reject tone");
        assert!(err.to_string().contains("unknown tone"));
    }

    #[test]
    fn resolve_rejects_word_cap_out_of_range() {
        let mut settings = Settings::default();
        settings.reminder.max_words = 500;

        let err = Config::resolve(&settings).expect_err("must reject cap");
        assert!(err.to_string().contains("between 5 and 60"));
    }

    #[test]
    fn resolve_rejects_missing_qr_image() {
        let mut settings = Settings::default();
        settings.dispatch.qr_image = Some("no/such/qr.png".to_string());

        let err = Config::resolve(&settings).expect_err("must reject path");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn take_api_key_is_a_blocking_precondition() {
        let mut config = Config::resolve(&Settings::default()).expect("config");
        config.api_key = None;

        let err = config.take_api_key().expect_err("missing key");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
