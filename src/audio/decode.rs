//! Decoding of raw 16-bit PCM payloads into normalised `f32` buffers.
//!
//! The speech service returns little-endian signed 16-bit samples with no
//! container header.  [`decode_pcm16`] turns those bytes into a [`PcmBuffer`]
//! whose samples are stored per channel in the range `[-1.0, 1.0]`.
//!
//! # Example
//!
//! ```rust
//! use word_sound::audio::decode_pcm16;
//!
//! let buffer = decode_pcm16(&[0x00, 0x40, 0x00, 0xC0], 24_000, 1).unwrap();
//! assert_eq!(buffer.frames(), 2);
//! assert!((buffer.channel(0)[0] - 0.5).abs() < 1e-6);
//! assert!((buffer.channel(0)[1] + 0.5).abs() < 1e-6);
//! ```

use std::time::Duration;

use thiserror::Error;

/// Bytes per encoded sample.
const BYTES_PER_SAMPLE: usize = 2;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Reasons a PCM payload could not be decoded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The byte length is not a whole number of frames.
    #[error("malformed audio: {byte_len} bytes is not a multiple of {frame_bytes} ({channels} channel(s) × 16-bit)")]
    MalformedAudio {
        byte_len: usize,
        channels: u16,
        frame_bytes: usize,
    },

    /// A channel count of zero was requested.
    #[error("malformed audio: channel count must be at least 1")]
    ZeroChannels,
}

// ---------------------------------------------------------------------------
// PcmBuffer
// ---------------------------------------------------------------------------

/// Decoded audio held as one `Vec<f32>` per channel.
///
/// Every channel has exactly [`frames`](Self::frames) samples.  The buffer is
/// immutable once built; the word collection shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    /// Build a buffer from already de-interleaved channel data.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ZeroChannels`] when `channels` is empty and
    /// [`DecodeError::MalformedAudio`] when the channels differ in length.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, DecodeError> {
        let first_len = channels.first().ok_or(DecodeError::ZeroChannels)?.len();
        if channels.iter().any(|c| c.len() != first_len) {
            let total: usize = channels.iter().map(Vec::len).sum();
            let count = channels.len() as u16;
            return Err(DecodeError::MalformedAudio {
                byte_len: total * BYTES_PER_SAMPLE,
                channels: count,
                frame_bytes: BYTES_PER_SAMPLE * count as usize,
            });
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (always ≥ 1).
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Playback length of the buffer.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Re-interleave the channels (`L R L R …`) for a cpal output stream.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// decode_pcm16
// ---------------------------------------------------------------------------

/// Decode interleaved 16-bit little-endian signed PCM into a [`PcmBuffer`].
///
/// Each sample is normalised as `sample / 32768.0`; the frame count is
/// `bytes.len() / 2 / channels`.
///
/// # Errors
///
/// [`DecodeError::MalformedAudio`] when `bytes.len()` is not a multiple of
/// `2 × channels`, [`DecodeError::ZeroChannels`] when `channels == 0`.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<PcmBuffer, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::ZeroChannels);
    }

    let channel_count = channels as usize;
    let frame_bytes = BYTES_PER_SAMPLE * channel_count;
    if bytes.len() % frame_bytes != 0 {
        return Err(DecodeError::MalformedAudio {
            byte_len: bytes.len(),
            channels,
            frame_bytes,
        });
    }

    let frames = bytes.len() / frame_bytes;
    let mut data = vec![Vec::with_capacity(frames); channel_count];

    for frame in bytes.chunks_exact(frame_bytes) {
        for (channel, sample) in data.iter_mut().zip(frame.chunks_exact(BYTES_PER_SAMPLE)) {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            channel.push(value as f32 / 32768.0);
        }
    }

    PcmBuffer::from_channels(sample_rate, data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
