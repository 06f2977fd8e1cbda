//! WordSound: click a word, hear it spoken.
//!
//! Words typed by the user become buttons.  The first click on a button
//! fetches a pronunciation from the Gemini text-to-speech API, caches the
//! decoded audio on the word and plays it; later clicks replay the cache.
//!
//! * [`audio`]: PCM decoding and speaker output.
//! * [`speech`]: the remote pronunciation fetcher.
//! * [`words`]: word list, lifecycle state and click handling.
//! * [`config`]: TOML settings and the API credential.
//! * [`app`]: the egui window.

pub mod app;
pub mod audio;
pub mod config;
pub mod speech;
pub mod words;
