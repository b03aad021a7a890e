//! WAV file export functionality
//!
//! Mono PCM only, so hound emits the plain 44-byte header: RIFF size is
//! `36 + L` and the data chunk size is `L` for `L` bytes of samples.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use log::debug;

use crate::{Result, WolfSoundsError};

fn spec(sample_rate: u32, bits_per_sample: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    }
}

fn audio_err(context: &str, e: hound::Error) -> WolfSoundsError {
    WolfSoundsError::AudioFileError(format!("{}: {}", context, e))
}

/// Write unsigned 8-bit PCM as a WAV stream
///
/// hound takes 8-bit samples as `i8` and stores them offset by 128, so the
/// bytes on disk equal the input.
pub fn write_pcm8<W: Write + Seek>(writer: W, samples: &[u8], sample_rate: u32) -> Result<()> {
    let mut wav = hound::WavWriter::new(writer, spec(sample_rate, 8))
        .map_err(|e| audio_err("Failed to start WAV stream", e))?;

    for &sample in samples {
        wav.write_sample((sample as i16 - 128) as i8)
            .map_err(|e| audio_err("Failed to write sample", e))?;
    }

    wav.finalize()
        .map_err(|e| audio_err("Failed to finalize WAV stream", e))
}

/// Write signed 16-bit PCM as a WAV stream
pub fn write_pcm16<W: Write + Seek>(writer: W, samples: &[i16], sample_rate: u32) -> Result<()> {
    let mut wav = hound::WavWriter::new(writer, spec(sample_rate, 16))
        .map_err(|e| audio_err("Failed to start WAV stream", e))?;

    for &sample in samples {
        wav.write_sample(sample)
            .map_err(|e| audio_err("Failed to write sample", e))?;
    }

    wav.finalize()
        .map_err(|e| audio_err("Failed to finalize WAV stream", e))
}

/// Save unsigned 8-bit PCM to a WAV file
pub fn export_pcm8<P: AsRef<Path>>(path: P, samples: &[u8], sample_rate: u32) -> Result<()> {
    debug!(
        "writing {} ({} samples, 8-bit)",
        path.as_ref().display(),
        samples.len()
    );
    let file = BufWriter::new(File::create(path.as_ref())?);
    write_pcm8(file, samples, sample_rate)
}

/// Save signed 16-bit PCM to a WAV file
pub fn export_pcm16<P: AsRef<Path>>(path: P, samples: &[i16], sample_rate: u32) -> Result<()> {
    debug!(
        "writing {} ({} samples, 16-bit)",
        path.as_ref().display(),
        samples.len()
    );
    let file = BufWriter::new(File::create(path.as_ref())?);
    write_pcm16(file, samples, sample_rate)
}
