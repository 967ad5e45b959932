//! In-memory WAV encoding.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tts_core::{TtsError, TtsResult, WavAudio};

/// Size of a canonical PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

/// Encode mono f32 samples as a 16-bit PCM WAV file in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> TtsResult<WavAudio> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    let mut writer =
        WavWriter::new(&mut cursor, spec).map_err(|e| TtsError::audio_encode(e.to_string()))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| TtsError::audio_encode(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| TtsError::audio_encode(e.to_string()))?;

    Ok(WavAudio::new(cursor.into_inner(), sample_rate))
}

/// Read the sample rate from a WAV header.
pub fn read_sample_rate(bytes: &[u8]) -> TtsResult<u32> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| TtsError::audio_encode(format!("not a WAV file: {e}")))?;
    Ok(reader.spec().sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header() {
        let audio = encode_wav(&[0.0, 0.5, -0.5], 24000).unwrap();
        let bytes = audio.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), WAV_HEADER_LEN + 3 * 2);
        assert_eq!(audio.sample_rate(), 24000);
        assert_eq!(read_sample_rate(bytes).unwrap(), 24000);
    }

    #[test]
    fn test_sample_clamping() {
        let audio = encode_wav(&[2.0, -2.0], 16000).unwrap();
        let mut reader = WavReader::new(Cursor::new(audio.as_bytes())).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();

        assert_eq!(samples[0], i16::MAX);
        assert!(samples[1] < -30000);
    }

    #[test]
    fn test_read_sample_rate_rejects_garbage() {
        assert!(read_sample_rate(b"definitely not audio").is_err());
    }
}
