//! Audio decoding and resampling for the local speech backend.
//!
//! Whisper-class models require 16kHz mono f32 PCM audio. Captured buffers
//! arrive as WAV bytes; this module decodes them with `hound` and resamples
//! with `rubato`.

use anyhow::{Context, Result};
use std::io::Cursor;

/// Target sample rate for whisper-class models
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Decode WAV bytes to f32 samples plus source rate and channel count.
pub fn decode_wav(data: &[u8]) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(data)).context("Failed to parse WAV data")?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read float samples")?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read integer samples")?
        }
    };

    if samples.is_empty() {
        anyhow::bail!("Recording is empty: no audio data captured");
    }

    Ok((samples, spec.sample_rate, spec.channels))
}

/// Decode WAV bytes straight to 16kHz mono f32, ready for a speech model.
pub fn wav_to_whisper_samples(data: &[u8]) -> Result<Vec<f32>> {
    let (samples, rate, channels) = decode_wav(data)?;
    resample_to_16k(&samples, rate, channels)
}

/// Resample audio to 16kHz mono.
///
/// # Arguments
/// * `samples` - Input samples (any sample rate, any channel count)
/// * `source_rate` - Source sample rate in Hz
/// * `channels` - Number of channels in input
pub fn resample_to_16k(samples: &[f32], source_rate: u32, channels: u16) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    // Convert to mono first if stereo/multichannel
    let mono_samples = if channels > 1 {
        to_mono(samples, channels)
    } else {
        samples.to_vec()
    };

    // If already 16kHz, return as-is
    if source_rate == WHISPER_SAMPLE_RATE {
        return Ok(mono_samples);
    }

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        WHISPER_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub-chunks
        1,    // channels (mono)
    )
    .context("Failed to create resampler")?;

    let mut output = Vec::new();
    let chunk_size = resampler.input_frames_max();

    for chunk in mono_samples.chunks(chunk_size) {
        let mut padded = chunk.to_vec();
        if padded.len() < chunk_size {
            padded.resize(chunk_size, 0.0);
        }

        let result = resampler
            .process(&[padded], None)
            .context("Resampling failed")?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output)
}

/// Convert multichannel audio to mono by averaging all channels
fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
