//! Word entries and their lifecycle state.
//!
//! [`WordCollection`] is the single source of truth for the word list.  The
//! "unheard" and "heard" sections the UI shows are computed on demand by
//! filtering the one backing `Vec`, so they can never diverge from it and
//! always keep insertion order.
//!
//! Lifecycle of one entry:
//!
//! ```text
//! Unheard ──first successful playback──▶ Heard   (never reverts)
//!
//! is_loading: false ──fetch starts──▶ true ──fetch ends──▶ false
//! cached_audio: None ──fetch succeeds──▶ Some(buffer)  (kept until clear)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::audio::PcmBuffer;

// ---------------------------------------------------------------------------
// WordId
// ---------------------------------------------------------------------------

/// Opaque identifier of a [`WordEntry`].
///
/// Issued by the collection from a counter that survives [`WordCollection::clear`],
/// so an id is never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(u64);

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// WordStatus
// ---------------------------------------------------------------------------

/// Whether the word's pronunciation has been played yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordStatus {
    /// Not yet played.  Failed fetches leave the word here.
    #[default]
    Unheard,
    /// Played at least once.
    Heard,
}

impl WordStatus {
    /// A short label for logs and the UI.
    pub fn label(&self) -> &'static str {
        match self {
            WordStatus::Unheard => "Unheard",
            WordStatus::Heard => "Heard",
        }
    }
}

// ---------------------------------------------------------------------------
// WordEntry
// ---------------------------------------------------------------------------

/// One word and its lifecycle state.
#[derive(Debug, Clone)]
pub struct WordEntry {
    id: WordId,
    text: String,
    status: WordStatus,
    is_loading: bool,
    cached_audio: Option<Arc<PcmBuffer>>,
}

impl WordEntry {
    pub fn id(&self) -> WordId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> WordStatus {
        self.status
    }

    /// `true` while a fetch for this entry is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Decoded pronunciation, present after the first successful fetch.
    pub fn cached_audio(&self) -> Option<&Arc<PcmBuffer>> {
        self.cached_audio.as_ref()
    }
}

// ---------------------------------------------------------------------------
// WordCollection
// ---------------------------------------------------------------------------

/// Insertion-ordered list of [`WordEntry`]s.
#[derive(Debug, Default)]
pub struct WordCollection {
    entries: Vec<WordEntry>,
    next_id: u64,
}

impl WordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `Unheard` entry per non-blank text, trimming each.
    ///
    /// Returns the ids of the created entries in order.
    pub fn add<I, S>(&mut self, texts: I) -> Vec<WordId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        for text in texts {
            let text = text.as_ref().trim();
            if text.is_empty() {
                continue;
            }
            let id = WordId(self.next_id);
            self.next_id += 1;
            self.entries.push(WordEntry {
                id,
                text: text.to_string(),
                status: WordStatus::Unheard,
                is_loading: false,
                cached_audio: None,
            });
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, id: WordId) -> Option<&WordEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: WordId) -> Option<&mut WordEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Set the loading flag.  Returns `false` when `id` is unknown.
    pub fn set_loading(&mut self, id: WordId, loading: bool) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.is_loading = loading;
                true
            }
            None => false,
        }
    }

    /// Move the entry to `Heard`.  Returns `true` only on the transition.
    pub fn mark_heard(&mut self, id: WordId) -> bool {
        match self.get_mut(id) {
            Some(entry) if entry.status == WordStatus::Unheard => {
                entry.status = WordStatus::Heard;
                true
            }
            _ => false,
        }
    }

    /// Cache decoded audio on the entry.  Returns `false` when `id` is unknown.
    pub fn store_audio(&mut self, id: WordId, audio: Arc<PcmBuffer>) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.cached_audio = Some(audio);
                true
            }
            None => false,
        }
    }

    /// Remove every entry.  Ids keep counting up.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordEntry> {
        self.entries.iter()
    }

    /// Entries not yet heard, in insertion order.
    pub fn unheard(&self) -> impl Iterator<Item = &WordEntry> {
        self.with_status(WordStatus::Unheard)
    }

    /// Entries already heard, in insertion order.
    pub fn heard(&self) -> impl Iterator<Item = &WordEntry> {
        self.with_status(WordStatus::Heard)
    }

    fn with_status(&self, status: WordStatus) -> impl Iterator<Item = &WordEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with a fetch in flight.
    pub fn loading_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loading).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
