//! Interaction controller: turns clicks into fetches and playback.
//!
//! [`WordController`] owns the [`WordCollection`], the single error message
//! and the two collaborators: a [`PronunciationFetcher`] and a
//! [`PlaybackSink`].  It lives on the UI thread.
//!
//! # Click flow
//!
//! ```text
//! activate(id)
//!   ├─ unknown id / is_loading      → Ignored
//!   ├─ cached_audio present         → sink.play, mark Heard       → Played
//!   └─ no cache                     → is_loading = true,
//!                                     spawn fetch on tokio        → Fetching
//!
//! fetch task ──FetchCompletion──▶ mpsc ──▶ poll_completions() (next frame)
//!   ├─ entry gone (cleared)         → dropped
//!   ├─ Ok(buffer)                   → cache, Heard, !loading, sink.play
//!   └─ Err(e)                       → !loading, error message set
//! ```
//!
//! All mutation happens in `activate` / `poll_completions` on the UI thread,
//! so no lock guards the collection.  The tokio task only sends its result.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::audio::{PcmBuffer, PlaybackSink};
use crate::speech::{PronunciationFetcher, SpeechError};

use super::collection::{WordCollection, WordId};
use super::input::split_words;

// ---------------------------------------------------------------------------
// Activation / FetchCompletion
// ---------------------------------------------------------------------------

/// What a call to [`WordController::activate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Unknown id, or a fetch for the entry is already in flight.
    Ignored,
    /// Cached audio was handed to the sink.
    Played,
    /// A fetch was started.
    Fetching,
}

/// Result of one fetch task, delivered back to the UI thread.
#[derive(Debug)]
pub struct FetchCompletion {
    pub id: WordId,
    pub word: String,
    pub result: Result<PcmBuffer, SpeechError>,
}

// ---------------------------------------------------------------------------
// WordController
// ---------------------------------------------------------------------------

/// Mediates user actions against the word list, the fetcher and the sink.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use word_sound::audio::SpeakerSink;
/// use word_sound::config::{ApiCredential, AppConfig};
/// use word_sound::speech::GeminiFetcher;
/// use word_sound::words::WordController;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let config = AppConfig::default();
/// let fetcher = GeminiFetcher::new(&config.speech, &config.audio, ApiCredential::missing());
///
/// let mut controller = WordController::new(
///     Arc::new(fetcher),
///     Box::new(SpeakerSink::new(config.audio.sample_rate)),
///     rt.handle().clone(),
/// );
/// let ids = controller.add_input("apple, banana");
/// controller.activate(ids[0]);
/// // …each UI frame:
/// controller.poll_completions();
/// ```
pub struct WordController {
    words: WordCollection,
    error: Option<String>,
    fetcher: Arc<dyn PronunciationFetcher>,
    sink: Box<dyn PlaybackSink>,
    runtime: Handle,
    completion_tx: mpsc::UnboundedSender<FetchCompletion>,
    completion_rx: mpsc::UnboundedReceiver<FetchCompletion>,
    in_flight: usize,
}

impl WordController {
    /// Create a controller.
    ///
    /// * `fetcher`: speech backend, shared with the spawned fetch tasks.
    /// * `sink`   : audio output, used only from the calling thread.
    /// * `runtime`: tokio runtime the fetch tasks are spawned on.
    pub fn new(
        fetcher: Arc<dyn PronunciationFetcher>,
        sink: Box<dyn PlaybackSink>,
        runtime: Handle,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            words: WordCollection::new(),
            error: None,
            fetcher,
            sink,
            runtime,
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn words(&self) -> &WordCollection {
        &self.words
    }

    /// The current user-facing error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` while at least one fetch task has not reported back.
    pub fn has_pending(&self) -> bool {
        self.in_flight > 0
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Add one entry per non-blank text and clear the error message.
    pub fn add_words<I, S>(&mut self, texts: I) -> Vec<WordId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = self.words.add(texts);
        self.error = None;
        log::debug!("words: added {} entries ({} total)", ids.len(), self.words.len());
        ids
    }

    /// Split free text with [`split_words`] and add the result.
    pub fn add_input(&mut self, input: &str) -> Vec<WordId> {
        self.add_words(split_words(input))
    }

    /// Remove every entry and clear the error message.
    ///
    /// Fetches still in flight complete later and are dropped.
    pub fn clear(&mut self) {
        log::debug!("words: cleared {} entries", self.words.len());
        self.words.clear();
        self.error = None;
    }

    /// Handle a click on the entry `id`.
    pub fn activate(&mut self, id: WordId) -> Activation {
        let Some(entry) = self.words.get(id) else {
            log::debug!("words: activate on unknown entry {id}");
            return Activation::Ignored;
        };

        if entry.is_loading() {
            log::debug!("words: {id} is already loading, click ignored");
            return Activation::Ignored;
        }

        if let Some(audio) = entry.cached_audio().cloned() {
            log::debug!(
                "words: cache hit for {id} {:?} ({})",
                entry.text(),
                entry.status().label()
            );
            self.play(&audio);
            self.words.mark_heard(id);
            return Activation::Played;
        }

        let word = entry.text().to_string();
        self.words.set_loading(id, true);
        self.error = None;
        self.spawn_fetch(id, word);
        Activation::Fetching
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Apply every finished fetch without blocking.  Call once per UI frame.
    ///
    /// Returns the number of completions processed.
    pub fn poll_completions(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion);
            processed += 1;
        }
        processed
    }

    /// Wait for the next finished fetch and apply it.
    ///
    /// Returns the id the completion was for (the entry may no longer exist).
    pub async fn next_completion(&mut self) -> Option<WordId> {
        let completion = self.completion_rx.recv().await?;
        let id = completion.id;
        self.apply_completion(completion);
        Some(id)
    }

    fn spawn_fetch(&mut self, id: WordId, word: String) {
        log::info!(
            "words: fetching pronunciation for {word:?} ({} loading)",
            self.words.loading_count()
        );
        self.in_flight += 1;

        let fetcher = Arc::clone(&self.fetcher);
        let task_word = word.clone();
        let fetch = self
            .runtime
            .spawn(async move { fetcher.fetch(&task_word).await });

        // Every spawned fetch reports back exactly once, even if it panics.
        let tx = self.completion_tx.clone();
        self.runtime.spawn(async move {
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => {
                    log::error!("words: fetch task for {word:?} ended abnormally: {e}");
                    Err(SpeechError::FetchFailed(format!("fetch task ended abnormally: {e}")))
                }
            };
            // The receiver lives as long as the controller.
            let _ = tx.send(FetchCompletion { id, word, result });
        });
    }

    fn apply_completion(&mut self, completion: FetchCompletion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let FetchCompletion { id, word, result } = completion;

        if self.words.get(id).is_none() {
            log::debug!("words: dropping completion for removed entry {id} {word:?}");
            return;
        }

        match result {
            Ok(buffer) => {
                let audio = Arc::new(buffer);
                self.words.store_audio(id, Arc::clone(&audio));
                self.words.mark_heard(id);
                self.words.set_loading(id, false);
                self.play(&audio);
            }
            Err(e) => {
                log::warn!("words: pronunciation for {word:?} failed: {e}");
                self.words.set_loading(id, false);
                self.error = Some(format!(
                    "Failed to load audio for \"{word}\": {e}. Check the API key or network connection."
                ));
            }
        }
    }

    fn play(&mut self, audio: &PcmBuffer) {
        if let Err(e) = self.sink.play(audio) {
            log::error!("playback failed: {e}");
            self.error = Some(format!("Playback failed: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
