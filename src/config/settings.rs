//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the remote text-to-speech service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the Gemini API (no trailing slash).
    pub base_url: String,
    /// TTS-capable model identifier.
    pub model: String,
    /// Prebuilt voice name sent in the speech config.
    pub voice: String,
    /// Prompt sent to the model; `{word}` is replaced with the clicked word.
    pub prompt_template: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.  `None` leaves timing to the transport.
    pub timeout_secs: Option<u64>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash-preview-tts".into(),
            voice: "Kore".into(),
            prompt_template: "Say the word: {word}".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Format of the PCM payload returned by the speech service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz of the returned audio (Gemini TTS: 24 000).
    pub sample_rate: u32,
    /// Interleaved channel count of the returned audio (Gemini TTS: mono).
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window and input-panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
    /// Words added by the "Try sample" button.
    pub sample_words: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (820.0, 680.0),
            sample_words: ["Apple", "Delicious", "Elephant", "Sunshine", "Future"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use word_sound::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote speech service settings.
    pub speech: SpeechConfig,
    /// Returned audio format.
    pub audio: AudioConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ApiCredential
// ---------------------------------------------------------------------------

/// The speech API key, read once at start-up.
///
/// A missing key is not an error here: the fetcher reports
/// `SpeechError::MissingCredential` on every request instead, so the window
/// still opens.
#[derive(Clone, Default)]
pub struct ApiCredential(Option<String>);

impl ApiCredential {
    /// Variable consulted when the configured one is unset.
    pub const FALLBACK_ENV: &'static str = "API_KEY";

    /// Read the key from `var`, falling back to [`Self::FALLBACK_ENV`].
    pub fn from_env(var: &str) -> Self {
        Self::from_lookup(var, |name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(var: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let key = [var, Self::FALLBACK_ENV]
            .into_iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());
        Self(key)
    }

    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(key))
        }
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn key(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.0.is_some() { "<redacted>" } else { "<missing>" };
        f.debug_tuple("ApiCredential").field(&shown).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
