//! Audio output device: pulls rendered frames from the shared voice slot.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::PoisonError;

use super::voice::SharedVoice;
use crate::error::EngineError;

/// Open output stream on the default device.
///
/// The stream is built once and lives for the whole session; transport
/// changes swap the voice in the slot instead of rebuilding the stream.
pub struct AudioOutput {
    sample_rate_hz: u32,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioOutput {
    /// Open the default output device and start pulling from `voice`
    pub fn open(voice: SharedVoice) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Output("No audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| EngineError::Output(format!("Failed to get audio config: {}", e)))?;

        let sample_rate_hz = config.sample_rate().0;
        let channels = config.channels() as usize;
        log::info!(
            "Audio: {} @ {}Hz, {} ch",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            channels
        );

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut slot = voice.lock().unwrap_or_else(PoisonError::into_inner);
                    match slot.as_mut() {
                        Some(voice) => {
                            voice.render(data, channels);
                            // Safety limiter: hard clip to ±1
                            for sample in data.iter_mut() {
                                *sample = sample.clamp(-1.0, 1.0);
                            }
                        }
                        None => data.fill(0.0),
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::Output(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| EngineError::Output(format!("Failed to start audio stream: {}", e)))?;

        Ok(Self {
            sample_rate_hz,
            _stream: stream,
        })
    }

    /// Device rate the band graph must run at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }
}
