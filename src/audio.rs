// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::{fmt, sync::Arc};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::samples::SampleBuffer;

pub mod cpal;
pub mod mixer;
pub mod mock;
mod source_pool;
mod voice;

pub use source_pool::SourcePool;
pub use voice::SoftwareVoice;

/// Playback state of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Per-voice playback parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub gain: f32,
    pub pitch: f32,
    pub position: [f32; 3],
    pub rolloff: f32,
    pub looping: bool,
}

impl Default for VoiceParams {
    fn default() -> Self {
        VoiceParams {
            gain: 1.0,
            pitch: 1.0,
            position: [0.0; 3],
            rolloff: 1.0,
            looping: false,
        }
    }
}

/// A playback channel. Buffers are queued and played in order; progress is
/// only observable through [Voice::buffers_processed].
pub trait Voice: Send + Sync {
    fn id(&self) -> u64;

    /// Restores default parameters, stops playback and clears the queue.
    fn reset(&self);

    fn set_gain(&self, gain: f32);
    fn set_pitch(&self, pitch: f32);
    fn set_position(&self, position: [f32; 3]);
    fn set_rolloff(&self, rolloff: f32);
    fn set_looping(&self, looping: bool);

    /// Appends buffers to the play queue.
    fn queue(&self, buffers: &[Arc<SampleBuffer>]) -> Result<()>;
    /// Drops buffers that finished playing. The processed count is kept.
    fn unqueue_processed(&self) -> usize;
    fn unqueue_all(&self);

    /// Starts from the top of the queue, or resumes when paused.
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn stop(&self);

    /// Number of queued buffers that have finished playing.
    fn buffers_processed(&self) -> usize;
    fn queued(&self) -> usize;
    fn state(&self) -> VoiceState;
    fn params(&self) -> VoiceParams;
}

pub trait Device: fmt::Display + Send + Sync {
    fn name(&self) -> &str;

    /// Sample rate of the output stream.
    fn output_rate(&self) -> u32;

    /// Creates a voice that renders into this device's output.
    fn create_voice(&self) -> Result<Arc<dyn Voice>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceDescription>> {
    cpal::Device::list()
}

/// Gets the device named in the configuration. Names starting with `mock`
/// give a device with no output stream.
pub fn get_device(config: &EngineConfig) -> Result<Arc<dyn Device>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, config.sample_rate())));
    }

    Ok(Arc::new(cpal::Device::get(device)?))
}
