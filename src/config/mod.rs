//! Configuration module for WordSound.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for the cross-platform config directory, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save`.
//!
//! The speech API key is deliberately *not* part of `AppConfig`; it is read
//! once from the environment with [`ApiCredential::from_env`].

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ApiCredential, AppConfig, AudioConfig, SpeechConfig, UiConfig};
