//! WAV encoding/decoding between audio frames and provider payloads

use std::io::Cursor;

use docvoice_core::{AudioFrame, Channels, SampleRate};

use crate::PipelineError;

/// Encode a frame as 16-bit PCM WAV bytes
pub fn encode_wav(frame: &AudioFrame) -> Result<Vec<u8>, PipelineError> {
    let spec = hound::WavSpec {
        channels: frame.channels.count() as u16,
        sample_rate: frame.sample_rate.as_u32(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut buffer, spec)
            .map_err(|e| PipelineError::Audio(format!("WAV writer failed: {}", e)))?;
        for sample in frame.samples.iter() {
            let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(clamped)
                .map_err(|e| PipelineError::Audio(format!("WAV write failed: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| PipelineError::Audio(format!("WAV finalize failed: {}", e)))?;
    }

    Ok(buffer.into_inner())
}

/// Decode WAV bytes into a single frame
pub fn decode_wav(bytes: &[u8]) -> Result<AudioFrame, PipelineError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Audio(format!("WAV parse failed: {}", e)))?;
    let spec = reader.spec();

    let sample_rate = SampleRate::from_u32(spec.sample_rate)
        .ok_or_else(|| PipelineError::Audio(format!("Unsupported sample rate: {}", spec.sample_rate)))?;
    let channels = match spec.channels {
        1 => Channels::Mono,
        2 => Channels::Stereo,
        n => return Err(PipelineError::Audio(format!("Unsupported channel count: {}", n))),
    };

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::Audio(format!("WAV read failed: {}", e)))?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::Audio(format!("WAV read failed: {}", e)))?,
    };

    Ok(AudioFrame::new(samples, sample_rate, channels, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_shape() {
        let samples: Vec<f32> = (0..320).map(|i| (i as f32 / 320.0).sin() * 0.5).collect();
        let frame = AudioFrame::new(samples, SampleRate::Hz16000, Channels::Mono, 7);

        let bytes = encode_wav(&frame).unwrap();
        let decoded = decode_wav(&bytes).unwrap();

        assert_eq!(decoded.samples.len(), frame.samples.len());
        assert_eq!(decoded.sample_rate, frame.sample_rate);
        assert_eq!(decoded.channels, frame.channels);
        // 16-bit quantization keeps samples close
        for (a, b) in frame.samples.iter().zip(decoded.samples.iter()) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(decode_wav(&[0u8; 16]).is_err());
    }
}
