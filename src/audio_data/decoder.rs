use crate::{
    audio_data::CueData,
    error::{CueMixError, Result},
};
use std::io::Cursor;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Decodes a complete encoded audio file into interleaved f32 samples.
///
/// Any container/codec enabled in symphonia's default feature set is accepted
/// (WAV, OGG/Vorbis, FLAC, ...). Corrupt packets are skipped.
pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<CueData> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CueMixError::Decode(format!("Failed to probe audio format: {:?}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| CueMixError::Decode("No default audio track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| CueMixError::Decode("Sample rate not found".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| CueMixError::Decode("Channel count not found".to_string()))?
        .count() as u16;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CueMixError::Decode(format!("Failed to create decoder: {:?}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end-of-stream
            Err(e) => {
                return Err(CueMixError::Decode(format!(
                    "Error reading packet: {:?}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break,
            Err(Error::DecodeError(e)) => {
                log::debug!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(CueMixError::Decode(format!(
                    "Error decoding packet: {:?}",
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        tmp.copy_interleaved_ref(decoded);
        samples.extend_from_slice(tmp.samples());
    }

    if samples.is_empty() {
        return Err(CueMixError::Decode("Stream contains no audio".to_string()));
    }

    CueData::from_interleaved(samples, sample_rate, channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sine_wav, wav_bytes};

    #[test]
    fn decodes_pcm_wav() {
        let bytes = sine_wav(48_000, 1, 480);
        let data = decode(bytes, Some("wav")).unwrap();
        assert_eq!(data.sample_rate(), 48_000);
        assert_eq!(data.channels(), 1);
        assert_eq!(data.total_frames(), 480);
    }

    #[test]
    fn keeps_stereo_layout() {
        let frames: Vec<i16> = vec![i16::MAX, 0, 0, i16::MIN];
        let data = decode(wav_bytes(44_100, 2, &frames), None).unwrap();
        assert_eq!(data.channels(), 2);
        assert_eq!(data.total_frames(), 2);
        assert!(data.samples()[0] > 0.99);
        assert!(data.samples()[3] < -0.99);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = decode(b"definitely not audio".to_vec(), Some("wav"));
        assert!(matches!(result, Err(CueMixError::Decode(_))));
    }
}
