//! Speaker output via `rodio`.
//!
//! [`SpeakerSink`] owns the single output context for the whole process.  The
//! context is opened lazily on the first [`play`](PlaybackSink::play) and
//! reused afterwards; it is torn down only when the sink is dropped at exit.
//!
//! The device side sits behind two small traits so the lazy-open and
//! suspend/resume rules can be exercised without audio hardware:
//!
//! * [`OutputOpener`] picks a device and returns an [`AudioOutput`].
//! * [`AudioOutput`] starts the device stream and queues buffers on it.
//!
//! Every `play` hands the buffer to rodio's mixer as a new source, so
//! overlapping clicks sound at the same time and rodio converts the 24 kHz
//! speech to whatever rate and channel count the device runs at.

use std::cell::{Cell, OnceCell};

use cpal::traits::{DeviceTrait, HostTrait};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle};
use thiserror::Error;

use super::decode::PcmBuffer;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening the output device or starting playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to open output stream: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("failed to queue audio: {0}")]
    Play(#[from] rodio::PlayError),

    #[error("output stream is not running")]
    NotRunning,

    #[error("audio buffer has an invalid sample rate of {0} Hz")]
    InvalidSampleRate(u32),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Destination for decoded audio.
///
/// Called from the UI thread only, so no `Send`/`Sync` bound is required.
pub trait PlaybackSink {
    /// Start playing `buffer` immediately.  Returns once playback has been
    /// scheduled, not when it finishes.
    fn play(&self, buffer: &PcmBuffer) -> Result<(), PlaybackError>;
}

/// An opened output device.
pub trait AudioOutput {
    /// Start the device stream.  Called once, before the first `schedule`.
    fn resume(&self) -> Result<(), PlaybackError>;

    /// Queue `buffer` for immediate playback alongside anything already playing.
    fn schedule(&self, buffer: &PcmBuffer) -> Result<(), PlaybackError>;
}

/// Opens the output device on demand.
pub trait OutputOpener {
    fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError>;
}

// ---------------------------------------------------------------------------
// ContextState / OutputContext
// ---------------------------------------------------------------------------

/// Power state of the output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Device chosen but stream not started; the next `play` resumes it.
    Suspended,
    /// Stream is running.
    Running,
}

/// The process-wide output handle: an opened device plus its power state.
pub struct OutputContext {
    output: Box<dyn AudioOutput>,
    state: Cell<ContextState>,
}

impl OutputContext {
    /// Wrap a freshly opened device.  Contexts always start suspended.
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            state: Cell::new(ContextState::Suspended),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state.get()
    }

    /// Start the stream if it is suspended.  A failed start leaves the
    /// context suspended.
    pub fn resume(&self) -> Result<(), PlaybackError> {
        if self.state.get() == ContextState::Suspended {
            self.output.resume()?;
            self.state.set(ContextState::Running);
            log::debug!("audio output resumed");
        }
        Ok(())
    }

    pub fn schedule(&self, buffer: &PcmBuffer) -> Result<(), PlaybackError> {
        self.output.schedule(buffer)
    }
}

// ---------------------------------------------------------------------------
// Device format selection
// ---------------------------------------------------------------------------

/// Rank of the sample formats the output path accepts; lower is better.
fn format_rank(format: cpal::SampleFormat) -> Option<u8> {
    match format {
        cpal::SampleFormat::F32 => Some(0),
        cpal::SampleFormat::I16 => Some(1),
        cpal::SampleFormat::U16 => Some(2),
        _ => None,
    }
}

/// Pick a stream config running at `preferred_rate` Hz from `ranges`.
///
/// Only F32, I16 and U16 ranges qualify, F32 first; among equals the first
/// listed range wins.  `None` means the caller should use the device default.
pub fn choose_output_config<I>(ranges: I, preferred_rate: u32) -> Option<cpal::SupportedStreamConfig>
where
    I: IntoIterator<Item = cpal::SupportedStreamConfigRange>,
{
    let rate = cpal::SampleRate(preferred_rate);
    ranges
        .into_iter()
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter_map(|range| format_rank(range.sample_format()).map(|rank| (rank, range)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, range)| range.with_sample_rate(rate))
}

// ---------------------------------------------------------------------------
// Rodio backend
// ---------------------------------------------------------------------------

/// Opens the default output device of the default cpal host.
pub struct RodioOpener {
    preferred_rate: u32,
}

impl RodioOpener {
    pub fn new(preferred_rate: u32) -> Self {
        Self { preferred_rate }
    }
}

impl OutputOpener for RodioOpener {
    fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let config = match device.supported_output_configs() {
            Ok(ranges) => choose_output_config(ranges, self.preferred_rate),
            Err(e) => {
                log::warn!("could not list output configs ({e}); using the device default");
                None
            }
        };

        let name = device.name().unwrap_or_else(|_| "unknown".into());
        match &config {
            Some(c) => log::info!(
                "Audio output: {name} ({} Hz, {} ch, {:?})",
                c.sample_rate().0,
                c.channels(),
                c.sample_format()
            ),
            None => log::info!("Audio output: {name} (device default config)"),
        }

        Ok(Box::new(RodioOutput {
            device,
            config,
            stream: OnceCell::new(),
        }))
    }
}

/// A rodio output stream on a chosen device, built on `resume`.
pub struct RodioOutput {
    device: cpal::Device,
    config: Option<cpal::SupportedStreamConfig>,
    // The stream must outlive the handle; dropping it silences the device.
    stream: OnceCell<(OutputStream, OutputStreamHandle)>,
}

impl AudioOutput for RodioOutput {
    fn resume(&self) -> Result<(), PlaybackError> {
        if self.stream.get().is_some() {
            return Ok(());
        }
        let opened = match &self.config {
            Some(config) => OutputStream::try_from_device_config(&self.device, config.clone())?,
            None => OutputStream::try_from_device(&self.device)?,
        };
        let _ = self.stream.set(opened);
        Ok(())
    }

    fn schedule(&self, buffer: &PcmBuffer) -> Result<(), PlaybackError> {
        if buffer.frames() == 0 {
            return Ok(());
        }
        if buffer.sample_rate() == 0 {
            return Err(PlaybackError::InvalidSampleRate(0));
        }
        let (_, handle) = self.stream.get().ok_or(PlaybackError::NotRunning)?;
        let source = SamplesBuffer::new(
            buffer.channel_count(),
            buffer.sample_rate(),
            buffer.interleaved(),
        );
        handle.play_raw(source)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SpeakerSink
// ---------------------------------------------------------------------------

/// [`PlaybackSink`] backed by a lazily opened [`OutputContext`].
pub struct SpeakerSink {
    opener: Box<dyn OutputOpener>,
    context: OnceCell<OutputContext>,
}

impl SpeakerSink {
    /// Sink on the default device, preferring `preferred_rate` Hz.  No device
    /// is touched here.
    pub fn new(preferred_rate: u32) -> Self {
        Self::with_opener(Box::new(RodioOpener::new(preferred_rate)))
    }

    pub fn with_opener(opener: Box<dyn OutputOpener>) -> Self {
        Self {
            opener,
            context: OnceCell::new(),
        }
    }

    /// Return the output context, opening it if this is the first call.
    ///
    /// A failed open is not cached; the next call tries again.
    pub fn context(&self) -> Result<&OutputContext, PlaybackError> {
        if let Some(ctx) = self.context.get() {
            return Ok(ctx);
        }
        let ctx = OutputContext::new(self.opener.open()?);
        Ok(self.context.get_or_init(|| ctx))
    }

    /// `None` until the context has been opened.
    pub fn state(&self) -> Option<ContextState> {
        self.context.get().map(OutputContext::state)
    }
}

impl PlaybackSink for SpeakerSink {
    fn play(&self, buffer: &PcmBuffer) -> Result<(), PlaybackError> {
        let ctx = self.context()?;
        ctx.resume()?;
        ctx.schedule(buffer)?;
        log::debug!(
            "playing {} frames ({:.2}s)",
            buffer.frames(),
            buffer.duration().as_secs_f32()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::audio::decode_pcm16;

    // ---- test doubles ------------------------------------------------------

    #[derive(Default)]
    struct Calls {
        opens: Cell<usize>,
        resumes: Cell<usize>,
        scheduled: Cell<usize>,
        /// Number of upcoming `open` calls that fail.
        failing_opens: Cell<usize>,
    }

    struct FakeOpener(Rc<Calls>);

    impl OutputOpener for FakeOpener {
        fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError> {
            let calls = &self.0;
            calls.opens.set(calls.opens.get() + 1);
            if calls.failing_opens.get() > 0 {
                calls.failing_opens.set(calls.failing_opens.get() - 1);
                return Err(PlaybackError::NoDevice);
            }
            Ok(Box::new(FakeOutput(Rc::clone(calls))))
        }
    }

    struct FakeOutput(Rc<Calls>);

    impl AudioOutput for FakeOutput {
        fn resume(&self) -> Result<(), PlaybackError> {
            self.0.resumes.set(self.0.resumes.get() + 1);
            Ok(())
        }

        fn schedule(&self, _buffer: &PcmBuffer) -> Result<(), PlaybackError> {
            self.0.scheduled.set(self.0.scheduled.get() + 1);
            Ok(())
        }
    }

    fn fake_sink() -> (SpeakerSink, Rc<Calls>) {
        let calls = Rc::new(Calls::default());
        let sink = SpeakerSink::with_opener(Box::new(FakeOpener(Rc::clone(&calls))));
        (sink, calls)
    }

    fn buffer() -> PcmBuffer {
        decode_pcm16(&[0x00, 0x40, 0x00, 0xC0], 24_000, 1).unwrap()
    }

    fn range(format: cpal::SampleFormat, min: u32, max: u32) -> cpal::SupportedStreamConfigRange {
        cpal::SupportedStreamConfigRange::new(
            2,
            cpal::SampleRate(min),
            cpal::SampleRate(max),
            cpal::SupportedBufferSize::Unknown,
            format,
        )
    }

    // ---- SpeakerSink -------------------------------------------------------

    #[test]
    fn new_sink_does_not_open_device() {
        let (sink, calls) = fake_sink();
        assert!(sink.state().is_none());
        assert_eq!(calls.opens.get(), 0);
    }

    #[test]
    fn context_is_opened_once_and_reused() {
        let (sink, calls) = fake_sink();
        sink.play(&buffer()).unwrap();
        sink.play(&buffer()).unwrap();

        assert_eq!(calls.opens.get(), 1);
        assert_eq!(calls.resumes.get(), 1);
        assert_eq!(calls.scheduled.get(), 2);
    }

    #[test]
    fn context_starts_suspended_and_first_play_resumes() {
        let (sink, _calls) = fake_sink();
        let ctx = sink.context().unwrap();
        assert_eq!(ctx.state(), ContextState::Suspended);

        sink.play(&buffer()).unwrap();
        assert_eq!(sink.state(), Some(ContextState::Running));
    }

    #[test]
    fn failed_open_is_retried_on_next_play() {
        let (sink, calls) = fake_sink();
        calls.failing_opens.set(1);

        assert!(matches!(sink.play(&buffer()), Err(PlaybackError::NoDevice)));
        assert!(sink.state().is_none());

        sink.play(&buffer()).unwrap();
        assert_eq!(calls.opens.get(), 2);
        assert_eq!(calls.scheduled.get(), 1);
        assert_eq!(sink.state(), Some(ContextState::Running));
    }

    // ---- choose_output_config ----------------------------------------------

    #[test]
    fn unsupported_formats_listed_first_are_skipped() {
        let ranges = vec![
            range(cpal::SampleFormat::I8, 8_000, 192_000),
            range(cpal::SampleFormat::U8, 8_000, 192_000),
            range(cpal::SampleFormat::I16, 8_000, 192_000),
            range(cpal::SampleFormat::I32, 8_000, 192_000),
        ];
        let config = choose_output_config(ranges, 24_000).unwrap();
        assert_eq!(config.sample_format(), cpal::SampleFormat::I16);
        assert_eq!(config.sample_rate().0, 24_000);
    }

    #[test]
    fn f32_is_preferred_over_integer_formats() {
        let ranges = vec![
            range(cpal::SampleFormat::U16, 8_000, 48_000),
            range(cpal::SampleFormat::I16, 8_000, 48_000),
            range(cpal::SampleFormat::F32, 8_000, 48_000),
        ];
        let config = choose_output_config(ranges, 24_000).unwrap();
        assert_eq!(config.sample_format(), cpal::SampleFormat::F32);
    }

    #[test]
    fn no_range_at_preferred_rate_falls_back_to_default() {
        let ranges = vec![
            range(cpal::SampleFormat::F32, 44_100, 48_000),
            range(cpal::SampleFormat::I8, 8_000, 192_000),
        ];
        assert!(choose_output_config(ranges, 24_000).is_none());
    }
}
