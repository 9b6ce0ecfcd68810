//! WhatsApp Web automation (CDP).
//!
//! Owns a Chrome process pointed at WhatsApp Web. The profile directory is
//! shared across runs so the operator's QR login survives between batches;
//! delete `~/.duebot/browser/profile/` to reset it.
//!
//! One session, one tab, sequential sends. The surface does not tolerate
//! parallel chats.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::dispatch::{PacingConfig, ReminderSender};
use crate::error::DispatchError;

/// WhatsApp Web renders this icon once a chat is open and ready to send.
const SEND_BUTTON_SELECTOR: &str = r#"span[data-icon="send"]"#;
const READINESS_POLL: Duration = Duration::from_millis(500);
/// Let the client hand the message to its queue before the next navigation.
const POST_CLICK_GRACE: Duration = Duration::from_secs(1);

/// A live Chrome session logged into WhatsApp Web.
pub struct WhatsAppSession {
    _browser: Browser,
    _handler_task: JoinHandle<()>,
    page: Page,
    pacing: PacingConfig,
}

impl WhatsAppSession {
    /// Launch Chrome with the persistent profile and open WhatsApp Web.
    ///
    /// The window is headful: on a fresh profile the operator must scan the
    /// QR code before any send can succeed.
    pub async fn launch(pacing: PacingConfig) -> Result<Self, DispatchError> {
        let chrome_path = find_chrome().ok_or_else(|| {
            DispatchError::Automation(
                "Chrome/Chromium not found. Install Chrome or set CHROME_PATH.".to_string(),
            )
        })?;

        let profile_dir = browser_profile_dir();
        std::fs::create_dir_all(&profile_dir).map_err(|e| {
            DispatchError::Automation(format!("failed to create browser profile dir: {e}"))
        })?;

        let config = BrowserConfig::builder()
            .chrome_executable(&chrome_path)
            .user_data_dir(&profile_dir)
            .window_size(1280, 900)
            .with_head()
            .build()
            .map_err(|e| DispatchError::Automation(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DispatchError::Automation(format!("failed to launch Chrome: {e}")))?;

        // The handler must be polled continuously or the CDP connection dies.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("browser handler error: {:?}", event);
                    break;
                }
            }
        });

        let page = browser
            .new_page("https://web.whatsapp.com")
            .await
            .map_err(|e| DispatchError::Automation(format!("failed to open WhatsApp Web: {e}")))?;

        Ok(Self {
            _browser: browser,
            _handler_task: handler_task,
            page,
            pacing,
        })
    }

    /// Poll for a selector until it appears or the window elapses.
    async fn wait_for(&self, selector: &str, window: Duration) -> Result<(), DispatchError> {
        let escaped = serde_json::to_string(selector)
            .map_err(|e| DispatchError::Automation(format!("invalid selector: {e}")))?;
        let js = format!("!!document.querySelector({escaped})");
        let start = Instant::now();

        loop {
            let found: bool = self
                .page
                .evaluate(js.as_str())
                .await
                .map_err(|e| DispatchError::Automation(format!("readiness poll failed: {e}")))?
                .into_value()
                .unwrap_or(false);

            if found {
                return Ok(());
            }
            if start.elapsed() >= window {
                return Err(DispatchError::SurfaceTimeout(window));
            }
            tokio::time::sleep(READINESS_POLL).await;
        }
    }

    async fn send_one(&self, phone: &str, text: &str) -> Result<(), DispatchError> {
        // The send URL pre-fills the chat; WhatsApp Web wants the number
        // without the leading '+'.
        let url = format!(
            "https://web.whatsapp.com/send?phone={}&text={}",
            phone.trim_start_matches('+'),
            urlencoding::encode(text)
        );

        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| DispatchError::Automation(format!("navigation failed: {e}")))?;

        self.wait_for(SEND_BUTTON_SELECTOR, self.pacing.surface_load)
            .await?;

        let button = self
            .page
            .find_element(SEND_BUTTON_SELECTOR)
            .await
            .map_err(|e| DispatchError::Automation(format!("send control not found: {e}")))?;
        button
            .click()
            .await
            .map_err(|e| DispatchError::Automation(format!("send click failed: {e}")))?;

        tokio::time::sleep(POST_CLICK_GRACE).await;
        Ok(())
    }
}

#[async_trait]
impl ReminderSender for WhatsAppSession {
    async fn send(&self, phone: &str, text: &str) -> Result<(), DispatchError> {
        self.send_one(phone, text).await
    }
}

/// Returns `~/.duebot/browser/profile/`.
fn browser_profile_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".duebot")
        .join("browser")
        .join("profile")
}

/// Search common locations for a Chrome/Chromium binary.
pub fn find_chrome() -> Option<PathBuf> {
    // Environment variable override.
    if let Ok(path) = std::env::var("CHROME_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let candidates = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    } else {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    };

    for candidate in candidates {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return Some(p);
        }
    }

    which_chrome_in_path()
}

fn which_chrome_in_path() -> Option<PathBuf> {
    let path_var = std::env::var("PATH").ok()?;
    let separator = if cfg!(windows) { ';' } else { ':' };
    for name in &["google-chrome", "chromium", "chromium-browser", "chrome"] {
        for dir in path_var.split(separator) {
            let candidate = PathBuf::from(dir).join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}
