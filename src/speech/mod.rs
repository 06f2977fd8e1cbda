//! Pronunciation fetching for WordSound.
//!
//! This module provides:
//! * [`PronunciationFetcher`]: async trait implemented by speech backends.
//! * [`GeminiFetcher`]: Gemini TTS implementation (24 kHz mono PCM).
//! * [`SpeechError`]: error variants surfaced to the word controller.
//! * request helpers for the `generateContent` wire format.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use word_sound::config::{ApiCredential, AppConfig};
//! use word_sound::speech::{GeminiFetcher, PronunciationFetcher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let credential = ApiCredential::from_env(&config.speech.api_key_env);
//!     let fetcher = GeminiFetcher::new(&config.speech, &config.audio, credential);
//!
//!     let buffer = fetcher.fetch("elephant").await.unwrap();
//!     println!("{} frames", buffer.frames());
//! }
//! ```

pub mod fetcher;
pub mod request;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use fetcher::{GeminiFetcher, PronunciationFetcher, SpeechError};
pub use request::{build_prompt, build_request_body, extract_inline_audio};
