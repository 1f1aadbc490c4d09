// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Writing rendered audio to disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};

use crate::error::{Result, SoundError};

/// Fails with `FileExists` when `path` exists and may not be replaced.
pub fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(SoundError::FileExists(path.to_path_buf()));
    }
    Ok(())
}

/// Writes mono 16-bit PCM.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    info!(path = ?path, samples = samples.len(), sample_rate, "Wrote WAV");
    Ok(())
}

/// Turns a WAV file into an MP3.
pub trait Mp3Encoder: Send + Sync {
    fn encode(&self, wav: &Path, mp3: &Path, min_bitrate: u32) -> Result<()>;
}

/// Runs the `lame` command line encoder (or anything taking the same flags).
#[derive(Debug, Clone)]
pub struct LameEncoder {
    command: PathBuf,
}

impl LameEncoder {
    pub fn new(command: impl Into<PathBuf>) -> LameEncoder {
        LameEncoder {
            command: command.into(),
        }
    }

    fn args(wav: &Path, mp3: &Path, min_bitrate: u32) -> Vec<String> {
        let mut args = vec!["--quiet".to_string()];
        if min_bitrate > 0 {
            args.push("-b".to_string());
            args.push(min_bitrate.to_string());
        }
        args.push(wav.display().to_string());
        args.push(mp3.display().to_string());
        args
    }
}

impl Mp3Encoder for LameEncoder {
    fn encode(&self, wav: &Path, mp3: &Path, min_bitrate: u32) -> Result<()> {
        let args = LameEncoder::args(wav, mp3, min_bitrate);
        debug!(command = ?self.command, ?args, "Running encoder");
        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|e| SoundError::Encoder(format!("{}: {}", self.command.display(), e)))?;
        if !output.status.success() {
            return Err(SoundError::Encoder(format!(
                "{} exited with {}: {}",
                self.command.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Where the intermediate WAV of an MP3 export goes: next to the target.
pub fn intermediate_wav(mp3: &Path) -> PathBuf {
    mp3.with_extension("wav")
}

/// Writes `samples` as a WAV next to `mp3`, encodes it, and removes the WAV
/// unless `keep_wav` is set.
pub fn write_mp3(
    encoder: &dyn Mp3Encoder,
    mp3: &Path,
    samples: &[i16],
    sample_rate: u32,
    min_bitrate: u32,
    keep_wav: bool,
) -> Result<()> {
    let wav = intermediate_wav(mp3);
    write_wav(&wav, samples, sample_rate)?;
    let encoded = encoder.encode(&wav, mp3, min_bitrate);
    if !keep_wav {
        std::fs::remove_file(&wav)?;
    }
    encoded?;
    info!(path = ?mp3, min_bitrate, "Wrote MP3");
    Ok(())
}
