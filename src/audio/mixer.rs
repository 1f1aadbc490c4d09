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
// Output-block rendering shared by the cpal and mock devices.
use std::sync::Arc;

use parking_lot::RwLock;

use super::voice::SoftwareVoice;

/// Renders every registered voice into interleaved output blocks.
#[derive(Clone)]
pub struct VoiceMixer {
    /// Voices created by the owning device.
    voices: Arc<RwLock<Vec<Arc<SoftwareVoice>>>>,
    /// Number of output channels
    num_channels: u16,
    /// Sample rate
    sample_rate: u32,
}

impl VoiceMixer {
    pub fn new(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            voices: Arc::new(RwLock::new(Vec::new())),
            num_channels: num_channels.max(1),
            sample_rate,
        }
    }

    pub fn add_voice(&self, voice: Arc<SoftwareVoice>) {
        self.voices.write().push(voice);
    }

    pub fn voice_count(&self) -> usize {
        self.voices.read().len()
    }

    /// Clears `output` and mixes every playing voice into it. Samples are
    /// clamped to [-1, 1].
    pub fn process_into_output(&self, output: &mut [f32]) {
        output.fill(0.0);
        for voice in self.voices.read().iter() {
            voice.render(output, self.sample_rate, self.num_channels);
        }
        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Renders `num_frames` frames into a new block.
    pub fn process_frames(&self, num_frames: usize) -> Vec<f32> {
        let mut frames = vec![0.0; num_frames * usize::from(self.num_channels)];
        self.process_into_output(&mut frames);
        frames
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Voice;
    use crate::samples::SampleBuffer;

    fn voice(samples: Vec<i16>) -> Arc<SoftwareVoice> {
        let voice = Arc::new(SoftwareVoice::new());
        voice
            .queue(&[Arc::new(SampleBuffer::new("t", samples, 44100, 1))])
            .unwrap();
        voice
    }

    #[test]
    fn test_basic_mixing() {
        let mixer = VoiceMixer::new(2, 44100);
        let v = voice(vec![16384, 8192]);
        v.play().unwrap();
        mixer.add_voice(v);

        let frames = mixer.process_frames(2);
        assert_eq!(frames, vec![0.5, 0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_multiple_voice_mixing() {
        let mixer = VoiceMixer::new(1, 44100);
        let a = voice(vec![16384]);
        let b = voice(vec![8192]);
        a.play().unwrap();
        b.play().unwrap();
        mixer.add_voice(a);
        mixer.add_voice(b);

        assert_eq!(mixer.process_frames(1), vec![0.75]);
    }

    #[test]
    fn test_idle_voices_are_silent() {
        let mixer = VoiceMixer::new(1, 44100);
        mixer.add_voice(voice(vec![16384]));
        assert_eq!(mixer.process_frames(1), vec![0.0]);
        assert_eq!(mixer.voice_count(), 1);
    }

    #[test]
    fn test_output_is_clamped() {
        let mixer = VoiceMixer::new(1, 44100);
        for _ in 0..3 {
            let v = voice(vec![i16::MAX]);
            v.play().unwrap();
            mixer.add_voice(v);
        }
        assert_eq!(mixer.process_frames(1), vec![1.0]);
    }
}
