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
use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tracing::debug;

use super::{mixer::VoiceMixer, SoftwareVoice, Voice};
use crate::error::{Result, SoundError};

/// A mock device. Voices only advance when [Device::advance] renders them.
#[derive(Clone)]
pub struct Device {
    name: String,
    mixer: VoiceMixer,
    created: Arc<AtomicUsize>,
    fail_after: Arc<AtomicUsize>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, sample_rate: u32) -> Device {
        Device {
            name: name.to_string(),
            mixer: VoiceMixer::new(1, sample_rate),
            created: Arc::new(AtomicUsize::new(0)),
            fail_after: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    /// Renders `frames` frames of every voice and returns the mixed block.
    pub fn advance(&self, frames: usize) -> Vec<f32> {
        self.mixer.process_frames(frames)
    }

    /// Renders `duration` worth of output.
    pub fn advance_by(&self, duration: std::time::Duration) -> Vec<f32> {
        let frames = (duration.as_secs_f64() * f64::from(self.mixer.sample_rate())).round();
        self.advance(frames as usize)
    }

    /// Makes voice creation fail once `count` voices exist.
    pub fn fail_after(&self, count: usize) {
        self.fail_after.store(count, Ordering::Relaxed);
    }

    pub fn voices_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn create_voice(&self) -> Result<Arc<dyn Voice>> {
        let created = self.created.load(Ordering::Relaxed);
        if created >= self.fail_after.load(Ordering::Relaxed) {
            return Err(SoundError::AudioDevice(format!(
                "{} refused to create voice {}",
                self.name,
                created + 1
            )));
        }
        self.created.fetch_add(1, Ordering::Relaxed);

        let voice = Arc::new(SoftwareVoice::new());
        debug!(device = self.name, voice = voice.id(), "Created voice");
        self.mixer.add_voice(voice.clone());
        Ok(voice)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Device as _, VoiceState};
    use crate::samples::SampleBuffer;

    #[test]
    fn test_advance_drives_voices() {
        let device = Device::get("mock", 100);
        let voice = device.create_voice().unwrap();
        voice
            .queue(&[Arc::new(SampleBuffer::new("a", vec![100; 10], 100, 1))])
            .unwrap();
        voice.play().unwrap();

        device.advance(5);
        assert_eq!(voice.buffers_processed(), 0);
        device.advance(6);
        assert_eq!(voice.buffers_processed(), 1);
        assert_eq!(voice.state(), VoiceState::Stopped);
    }

    #[test]
    fn test_clones_share_state() {
        let device = Device::get("mock-a", 100);
        let clone = device.to_mock().unwrap();
        device.create_voice().unwrap();
        assert_eq!(clone.voices_created(), 1);
        assert_eq!(device.to_string(), "mock-a (Mock)");
    }

    #[test]
    fn test_fail_after() {
        let device = Device::get("mock", 100);
        device.fail_after(0);
        assert!(device.create_voice().is_err());
    }
}
