//! WAV synthesis and log capture for tests, so nothing depends on files or an
//! audio device.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::OnceLock;

/// Encodes interleaved 16-bit PCM as a canonical RIFF/WAVE file.
pub fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (samples.len() * 2) as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// A 440 Hz tone at half scale, `frames` long.
pub fn sine_wav(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    let samples: Vec<i16> = (0..frames)
        .flat_map(|i| {
            let t = i as f32 / sample_rate as f32;
            let value = ((t * 440.0 * std::f32::consts::TAU).sin() * 16_000.0) as i16;
            std::iter::repeat_n(value, channels as usize)
        })
        .collect();
    wav_bytes(sample_rate, channels, &samples)
}

/// Forwards to env_logger and keeps a per-thread copy of every record.
struct CaptureLogger {
    inner: env_logger::Logger,
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()));
        });
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

pub fn init_logging() {
    let logger = LOGGER.get_or_init(|| CaptureLogger {
        inner: env_logger::Builder::from_default_env().is_test(true).build(),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Runs `f` and returns the log records it produced on this thread.
pub fn capture_logs(f: impl FnOnce()) -> Vec<(Level, String)> {
    init_logging();
    CAPTURED.with(|captured| captured.borrow_mut().clear());
    f();
    CAPTURED.with(|captured| captured.take())
}

/// Messages of the error records in `records`.
pub fn errors(records: &[(Level, String)]) -> Vec<&str> {
    records
        .iter()
        .filter(|(level, _)| *level == Level::Error)
        .map(|(_, message)| message.as_str())
        .collect()
}
