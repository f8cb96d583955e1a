//! Playback transport: owns the decoded source, the play/pause/seek state
//! and the single live band graph.

use std::sync::{Arc, Mutex, PoisonError};

use super::bands::{BandDecomposer, BandTaps, FrequencyBand, StereoTaps};
use super::clock::HostClock;
use super::decode::Decoder;
use super::voice::{PlaybackVoice, SharedVoice};
use super::AudioSource;
use crate::error::{DecodeError, EngineError};
use crate::params::AnalysisConfig;

/// Identifies one load request; only the most recent may commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Playback clock and analysis fan-out.
///
/// Every `play()` tears down the previous graph before building a new one,
/// so at most one set of taps is ever live.
pub struct PlaybackEngine {
    config: AnalysisConfig,
    clock: Box<dyn HostClock>,
    decoder: Arc<dyn Decoder>,
    decomposer: BandDecomposer,

    source: Option<Arc<AudioSource>>,
    voice: SharedVoice,
    taps: Option<BandTaps>,

    playing: bool,
    start_reference: f64,
    paused_offset: f64,

    latest_load: u64,
}

impl PlaybackEngine {
    /// Create an engine whose band graph runs at `output_rate_hz`
    pub fn new(
        config: AnalysisConfig,
        clock: Box<dyn HostClock>,
        decoder: Arc<dyn Decoder>,
        output_rate_hz: u32,
    ) -> Result<Self, EngineError> {
        Self::with_voice(config, clock, decoder, output_rate_hz, Arc::new(Mutex::new(None)))
    }

    /// Like [`PlaybackEngine::new`], rendering into an existing voice slot
    /// (one already handed to an [`AudioOutput`](super::AudioOutput))
    pub fn with_voice(
        config: AnalysisConfig,
        clock: Box<dyn HostClock>,
        decoder: Arc<dyn Decoder>,
        output_rate_hz: u32,
        voice: SharedVoice,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        if output_rate_hz == 0 {
            return Err(EngineError::Config("output rate must be > 0".to_string()));
        }

        Ok(Self {
            decomposer: BandDecomposer::new(config.clone(), output_rate_hz),
            config,
            clock,
            decoder,
            source: None,
            voice,
            taps: None,
            playing: false,
            start_reference: 0.0,
            paused_offset: 0.0,
            latest_load: 0,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Decoder for running a load on another thread
    pub fn decoder(&self) -> Arc<dyn Decoder> {
        Arc::clone(&self.decoder)
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_deref()
    }

    pub fn duration(&self) -> f64 {
        self.source.as_ref().map_or(0.0, |s| s.duration())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // === Loading ===

    /// Start a load request; any earlier outstanding request becomes stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_load += 1;
        LoadTicket(self.latest_load)
    }

    /// Invalidate any outstanding load without starting a new one
    pub fn cancel_load(&mut self) {
        self.latest_load += 1;
    }

    /// Install a decode result if its request is still the latest.
    ///
    /// Returns the new duration, `None` for a stale result, or the decode
    /// error (the previous source stays loaded).
    pub fn commit_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<AudioSource, DecodeError>,
    ) -> Result<Option<f64>, EngineError> {
        if ticket.0 != self.latest_load {
            log::debug!("Discarding stale load result (ticket {})", ticket.0);
            return Ok(None);
        }

        let source = result?;
        self.halt();
        self.taps = None;

        let duration = source.duration();
        log::info!(
            "Loaded '{}': {} ch @ {}Hz, {:.2}s",
            source.name(),
            source.channel_count(),
            source.sample_rate(),
            duration
        );
        self.source = Some(Arc::new(source));
        Ok(Some(duration))
    }

    /// Decode and install in one step
    pub fn load(&mut self, bytes: Vec<u8>, name: &str) -> Result<f64, EngineError> {
        let ticket = self.begin_load();
        let result = self.decoder.decode(bytes, name);
        match self.commit_load(ticket, result)? {
            Some(duration) => Ok(duration),
            None => Err(EngineError::InvalidState("load superseded")),
        }
    }

    /// Install an already-decoded source (e.g. a synthesized demo tone)
    pub fn load_source(&mut self, source: AudioSource) -> Result<f64, EngineError> {
        let ticket = self.begin_load();
        match self.commit_load(ticket, Ok(source))? {
            Some(duration) => Ok(duration),
            None => Err(EngineError::InvalidState("load superseded")),
        }
    }

    // === Transport ===

    /// Start (or restart) playback from the paused offset.
    ///
    /// Rebuilds the band graph; if already playing, the running graph is
    /// torn down first and playback continues from the current position.
    /// A source that already played to its end starts over.
    pub fn play(&mut self) -> Result<(), EngineError> {
        if self.playing {
            self.pause();
        }
        if self.paused_offset >= self.duration() {
            self.paused_offset = 0.0;
        }
        self.start(self.paused_offset)
    }

    /// Build a fresh graph and run it from `offset`
    fn start(&mut self, offset: f64) -> Result<(), EngineError> {
        let source = self
            .source
            .clone()
            .ok_or(EngineError::InvalidState("no source loaded"))?;

        // Old graph (and its taps) must be gone before the new one exists
        self.teardown_voice();

        let (graph, taps) = self.decomposer.build()?;
        let voice = PlaybackVoice::new(source, graph, offset, self.output_rate_hz());
        *self.lock_voice() = Some(voice);
        self.taps = Some(taps);

        self.paused_offset = offset;
        self.start_reference = self.clock.now() - offset;
        self.playing = true;
        log::info!("Play from {:.2}s", offset);
        Ok(())
    }

    /// Freeze elapsed time and halt the graph; taps keep their last window
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.paused_offset = self.elapsed();
        self.playing = false;
        self.teardown_voice();
        log::info!("Pause at {:.2}s", self.paused_offset);
    }

    /// Pause and rewind to the start; a decode still in flight is dropped
    pub fn stop(&mut self) {
        self.cancel_load();
        self.halt();
    }

    fn halt(&mut self) {
        self.pause();
        self.paused_offset = 0.0;
    }

    /// Jump to `seconds` (clamped to the source); keeps playing if it was
    pub fn seek(&mut self, seconds: f64) -> Result<(), EngineError> {
        let target = seconds.clamp(0.0, self.duration());
        let was_playing = self.playing;

        log::debug!("Seek to {:.2}s", target);

        if was_playing {
            // Restart exactly at the target, even at the very end;
            // `tick` stops the transport there
            self.pause();
            self.start(target)
        } else {
            self.paused_offset = target;
            Ok(())
        }
    }

    /// Seconds into the source
    pub fn elapsed(&self) -> f64 {
        if self.playing {
            (self.clock.now() - self.start_reference).clamp(0.0, self.duration())
        } else {
            self.paused_offset
        }
    }

    /// Per-frame housekeeping: stops the transport at the end of the source
    pub fn tick(&mut self) {
        if self.playing && self.elapsed() >= self.duration() {
            log::info!("Reached end of '{}'", self.source().map_or("", |s| s.name()));
            self.halt();
        }
    }

    // === Analysis ===

    /// Left/right taps of a band, if a graph has been built
    pub fn band_taps(&self, band: FrequencyBand) -> Option<&StereoTaps> {
        self.taps.as_ref().and_then(|taps| taps.get(band))
    }

    /// Taps attached to the live graph (0 when nothing is playing)
    pub fn live_tap_count(&self) -> usize {
        self.lock_voice()
            .as_ref()
            .map_or(0, |voice| voice.graph().taps().count())
    }

    /// Render the live voice without an audio device.
    ///
    /// Returns false (and leaves `data` untouched) when nothing is playing.
    pub fn render_offline(&self, data: &mut [f32], channels: usize) -> bool {
        match self.lock_voice().as_mut() {
            Some(voice) => {
                voice.render(data, channels);
                true
            }
            None => false,
        }
    }

    fn output_rate_hz(&self) -> u32 {
        self.decomposer.sample_rate_hz()
    }

    fn teardown_voice(&self) {
        // Dropped outside the audio callback's view, graph and all
        let old = self.lock_voice().take();
        drop(old);
    }

    fn lock_voice(&self) -> std::sync::MutexGuard<'_, Option<PlaybackVoice>> {
        self.voice.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
