//! Word list, lifecycle state and click handling.
//!
//! * [`split_words`]: free text → word tokens.
//! * [`WordCollection`] / [`WordEntry`]: the ordered list and per-word state.
//! * [`WordController`]: click handling, fetch dispatch and playback.

pub mod collection;
pub mod controller;
pub mod input;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use collection::{WordCollection, WordEntry, WordId, WordStatus};
pub use controller::{Activation, FetchCompletion, WordController};
pub use input::split_words;
