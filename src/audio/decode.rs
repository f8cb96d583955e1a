//! Audio decoding into in-memory sample buffers.
//!
//! Decoding is delegated to Symphonia; the engine only sees the
//! [`Decoder`] trait so hosts and tests can substitute their own.

use std::io::Cursor;

use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use super::AudioSource;
use crate::error::DecodeError;

/// Host decoding capability: bytes in, de-interleaved samples out
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: Vec<u8>, name: &str) -> Result<AudioSource, DecodeError>;
}

/// Decoder backed by Symphonia's default codec and format registry
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>, name: &str) -> Result<AudioSource, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
        {
            hint.with_extension(ext);
        }

        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format.default_track().ok_or(DecodeError::NoDefaultTrack)?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::MissingSampleRate)?;

        let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(err) => return Err(DecodeError::Unsupported(err)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let audio_buf = match decoder.decode(&packet) {
                Ok(buf) => buf,
                Err(SymphoniaError::DecodeError(msg)) => {
                    // Corrupt packet: drop it and keep going
                    log::warn!("Skipping undecodable packet in {}: {}", name, msg);
                    continue;
                }
                Err(err) => return Err(DecodeError::Unsupported(err)),
            };

            let spec = *audio_buf.spec();
            let channel_count = spec.channels.count();
            if channel_count == 0 {
                return Err(DecodeError::MissingChannels);
            }
            if channels.is_empty() {
                channels = vec![Vec::new(); channel_count];
            }

            let mut sample_buf =
                SymphoniaSampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(audio_buf);

            for frame in sample_buf.samples().chunks_exact(channel_count) {
                for (channel, sample) in channels.iter_mut().zip(frame) {
                    channel.push(*sample);
                }
            }
        }

        if channels.is_empty() {
            return Err(DecodeError::Empty);
        }

        let source = AudioSource::new(name, sample_rate, channels)?;
        log::debug!(
            "Decoded {}: {} ch @ {}Hz, {:.2}s",
            name,
            source.channel_count(),
            source.sample_rate(),
            source.duration()
        );
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16_wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for sample in samples {
                writer.write_sample(*sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_wav() {
        let samples = [0i16, 16_384, -16_384, 32_767, 100, -100];
        let bytes = pcm16_wav_bytes(2, 44_100, &samples);

        let source = SymphoniaDecoder.decode(bytes, "clip.wav").unwrap();
        assert_eq!(source.channel_count(), 2);
        assert_eq!(source.frames(), 3);
        assert_eq!(source.sample_rate(), 44_100);

        let left = source.channel(0).unwrap();
        let right = source.channel(1).unwrap();
        assert!(left[0].abs() < 1e-4);
        assert!((right[0] - 0.5).abs() < 1e-3);
        assert!((left[1] + 0.5).abs() < 1e-3);
        assert!(left.iter().chain(right).all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_decode_duration() {
        let bytes = pcm16_wav_bytes(1, 8_000, &vec![0i16; 4_000]);
        let source = SymphoniaDecoder.decode(bytes, "half-second.wav").unwrap();
        assert!((source.duration() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = SymphoniaDecoder.decode(b"definitely not audio".to_vec(), "noise.bin");
        assert!(result.is_err());
    }
}
