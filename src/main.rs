//! Application entry point: WordSound.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Read the API key from the environment (once).
//! 4. Create [`tokio`] runtime (multi-thread, 2 workers) for fetches.
//! 5. Build the fetcher, the lazy audio sink and the word controller.
//! 6. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use word_sound::{
    app::WordSoundApp,
    audio::SpeakerSink,
    config::{ApiCredential, AppConfig},
    speech::{GeminiFetcher, PronunciationFetcher},
    words::WordController,
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("WordSound")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 360.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("WordSound starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Credential (a missing key only fails individual fetches)
    let credential = ApiCredential::from_env(&config.speech.api_key_env);
    log::info!("API key: {credential:?}");

    // 4. Tokio runtime (fetches only; the UI stays on the main thread)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 5. Fetcher, sink, controller
    let fetcher: Arc<dyn PronunciationFetcher> =
        Arc::new(GeminiFetcher::new(&config.speech, &config.audio, credential));

    // The output device is opened on the first playback, not here.
    let sink = SpeakerSink::new(config.audio.sample_rate);

    let controller = WordController::new(fetcher, Box::new(sink), rt.handle().clone());

    // 6. Build the egui app and run it (blocks until the window is closed)
    let app = WordSoundApp::new(controller, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "WordSound",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
