//! Whole-cue sample rate conversion on load.

use crate::error::{CueMixError, Result};
use rubato::{FftFixedIn, Resampler};

/// Input frames fed to the FFT resampler per call.
const CHUNK_FRAMES: usize = 1024;

/// Converts a complete interleaved cue from `source_rate` to `target_rate`.
///
/// The output is aligned with the input: the resampler's delay is trimmed off the
/// front, its tail is flushed, and the result is exactly
/// `ceil(frames * target_rate / source_rate)` frames long.
pub(crate) fn resample_interleaved(
    samples: &[f32],
    channels: u16,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 || channels == 0 {
        return Err(CueMixError::AudioFormat(format!(
            "Cannot resample {} ch from {} Hz to {} Hz",
            channels, source_rate, target_rate
        )));
    }
    let channels = channels as usize;
    let frames = samples.len() / channels;
    if source_rate == target_rate || frames == 0 {
        return Ok(samples[..frames * channels].to_vec());
    }

    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
        .collect();

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_FRAMES,
        2,
        channels,
    )
    .map_err(|e| CueMixError::Resample(format!("Failed to create resampler: {}", e)))?;

    let expected = (frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(delay + expected); channels];

    let mut position = 0;
    while position < frames {
        let needed = resampler.input_frames_next();
        let end = (position + needed).min(frames);
        let chunk: Vec<&[f32]> = planar.iter().map(|ch| &ch[position..end]).collect();

        let waves = if end - position == needed {
            resampler.process(chunk.as_slice(), None)
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)
        }
        .map_err(|e| CueMixError::Resample(e.to_string()))?;
        append_planar(&mut output, waves);
        position = end;
    }

    // Flush whatever is still inside the filter
    while output[0].len() < delay + expected {
        let waves = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| CueMixError::Resample(e.to_string()))?;
        if waves.first().is_none_or(Vec::is_empty) {
            break;
        }
        append_planar(&mut output, waves);
    }

    let available = output[0].len().saturating_sub(delay).min(expected);
    let mut interleaved = Vec::with_capacity(available * channels);
    for frame in delay..delay + available {
        interleaved.extend(output.iter().map(|ch| ch[frame]));
    }
    Ok(interleaved)
}

fn append_planar(output: &mut [Vec<f32>], waves: Vec<Vec<f32>>) {
    for (out, wave) in output.iter_mut().zip(waves) {
        out.extend_from_slice(&wave);
    }
}
