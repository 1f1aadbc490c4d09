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
use std::{fmt, path::Path, sync::Arc, time::Duration};

use hound::{SampleFormat, WavReader};

use crate::error::Result;

/// Immutable 16-bit PCM data shared between the pool, voices and renders.
#[derive(Clone)]
pub struct SampleBuffer {
    name: String,
    data: Arc<[i16]>,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    pub fn new(name: &str, data: Vec<i16>, sample_rate: u32, channels: u16) -> SampleBuffer {
        SampleBuffer {
            name: name.to_string(),
            data: data.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Decodes a WAV file into 16-bit samples. Other integer depths are
    /// shifted and float samples are scaled and clamped.
    pub fn from_wav(name: &str, path: &Path) -> Result<SampleBuffer> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        let data: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits) if bits <= 16 => {
                reader.samples::<i16>().collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Int, bits) => {
                let shift = u32::from(bits) - 16;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| (s >> shift) as i16))
                    .collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Float, _) => reader
                .samples::<f32>()
                .map(|s| s.map(float_to_i16))
                .collect::<std::result::Result<_, _>>()?,
        };

        Ok(SampleBuffer::new(name, data, spec.sample_rate, spec.channels))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the samples. Stays valid after the pool releases this entry.
    pub fn data(&self) -> Arc<[i16]> {
        self.data.clone()
    }

    pub fn samples(&self) -> &[i16] {
        &self.data
    }

    /// Number of samples (all channels).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<i16>()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.data.len() / usize::from(self.channels)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

pub(crate) fn float_to_i16(sample: f32) -> i16 {
    (sample * f32::from(i16::MAX)).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("name", &self.name)
            .field("samples", &self.data.len())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}
