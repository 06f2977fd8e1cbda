//! Audio pipeline: PCM decoding → speaker output.
//!
//! # Pipeline
//!
//! ```text
//! speech bytes (16-bit LE) → decode_pcm16 → PcmBuffer (cached on the word)
//!                          → SpeakerSink::play → rodio mixer → output device
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use word_sound::audio::{decode_pcm16, PlaybackSink, SpeakerSink};
//!
//! let buffer = decode_pcm16(&[0x00, 0x40, 0x00, 0xC0], 24_000, 1).unwrap();
//! let sink = SpeakerSink::new(24_000);
//! sink.play(&buffer).unwrap(); // opens the device on first use
//! ```

pub mod decode;
pub mod playback;

pub use decode::{decode_pcm16, DecodeError, PcmBuffer};
pub use playback::{
    choose_output_config, AudioOutput, ContextState, OutputContext, OutputOpener, PlaybackError,
    PlaybackSink, RodioOpener, SpeakerSink,
};
