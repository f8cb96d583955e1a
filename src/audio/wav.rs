//! 16-bit PCM WAV export.

use std::io::Cursor;
use std::path::Path;

use super::AudioSource;
use crate::error::WavError;

/// Header size for plain PCM (mono or stereo) files
pub const WAV_HEADER_LEN: usize = 44;

/// Clamp to [-1, 1] and scale asymmetrically so both extremes are reachable
pub fn sample_to_i16(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32768.0) as i16
    } else {
        (sample * 32767.0) as i16
    }
}

/// Encode a source as interleaved 16-bit little-endian PCM
pub fn encode_wav(source: &AudioSource) -> Result<Vec<u8>, WavError> {
    let channels = source.channel_count();
    // More channels switch hound to the extensible header
    if channels > 2 {
        return Err(WavError::UnsupportedChannels(channels));
    }

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: source.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let data: Vec<&[f32]> = (0..channels).filter_map(|c| source.channel(c)).collect();
    let mut cursor = Cursor::new(Vec::with_capacity(
        WAV_HEADER_LEN + source.frames() * channels * 2,
    ));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for frame in 0..source.frames() {
            for channel in &data {
                writer.write_sample(sample_to_i16(channel[frame]))?;
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Encode and write to disk
pub fn write_wav(path: impl AsRef<Path>, source: &AudioSource) -> Result<(), WavError> {
    let bytes = encode_wav(source)?;
    std::fs::write(path.as_ref(), bytes)?;
    log::info!(
        "Wrote {} ({:.2}s)",
        path.as_ref().display(),
        source.duration()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extremes() -> AudioSource {
        AudioSource::new("extremes", 44_100, vec![vec![1.0, -1.0], vec![0.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_pcm_body_scaling() {
        let bytes = encode_wav(&extremes()).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 8);
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(
            &bytes[WAV_HEADER_LEN..],
            &[0xff, 0x7f, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn test_sample_clamping() {
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-3.0), i16::MIN);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn test_rejects_more_than_two_channels() {
        let source = AudioSource::new("quad", 44_100, vec![vec![0.0]; 4]).unwrap();
        assert!(matches!(
            encode_wav(&source),
            Err(WavError::UnsupportedChannels(4))
        ));
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extremes.wav");
        write_wav(&path, &extremes()).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, 0, i16::MIN, 0]);
    }
}
