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

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::events::SoundEventKind;
use super::{Clock, PlayContext};
use crate::audio::{Voice, VoiceState};
use crate::error::{record, ErrorKind, Result, SoundError};
use crate::samples::SampleBuffer;

/// A sound file played as is.
pub struct Sample {
    name: String,
    buffer: Arc<SampleBuffer>,
    intensity: f32,
    position: [f32; 3],
    voice: Option<Arc<dyn Voice>>,
    paused: bool,
    silent: bool,
    clock: Clock,
    events: Vec<SoundEventKind>,
    last_error: Option<ErrorKind>,
}

impl Sample {
    /// Reads a WAV file.
    pub fn load(name: &str, path: &Path) -> Result<Sample> {
        let buffer = SampleBuffer::from_wav(name, path)?;
        Ok(Sample::from_buffer(name, Arc::new(buffer)))
    }

    pub fn from_buffer(name: &str, buffer: Arc<SampleBuffer>) -> Sample {
        Sample {
            name: name.to_string(),
            buffer,
            intensity: 1.0,
            position: [0.0; 3],
            voice: None,
            paused: false,
            silent: false,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renamed(&self, name: &str) -> Sample {
        Sample::from_buffer(name, self.buffer.clone())
    }

    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn data(&self) -> Vec<i16> {
        self.buffer.samples().to_vec()
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        if let Some(voice) = &self.voice {
            voice.set_gain(self.intensity);
        }
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
        if let Some(voice) = &self.voice {
            voice.set_position(position);
        }
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn is_playing(&self) -> bool {
        self.voice.is_some() && !self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.voice.is_some() && self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.voice.is_none()
    }

    pub fn percent_played(&self) -> f32 {
        let total = self.buffer.duration();
        if self.voice.is_none() || total.is_zero() {
            return 0.0;
        }
        (self.clock.elapsed().as_secs_f64() / total.as_secs_f64()).min(1.0) as f32
    }

    /// Starts the sample from the top, restarting it if it's already going.
    pub fn play(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        let result = self.start(ctx, looping, silent);
        record(&mut self.last_error, result)
    }

    fn start(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        if self.voice.is_some() {
            self.finish(ctx);
        }
        self.silent = silent;

        let voice = ctx.sources.check_out().ok_or(SoundError::NoVoiceAvailable)?;
        voice.set_gain(self.intensity);
        voice.set_position(self.position);
        voice.set_looping(looping);
        if let Err(e) = voice.queue(&[self.buffer.clone()]).and_then(|_| voice.play()) {
            ctx.sources.check_in(&voice);
            return Err(e);
        }

        self.voice = Some(voice);
        self.paused = false;
        self.clock.restart();
        self.push_event(SoundEventKind::SoundPlaying);
        info!(sample = self.name, looping, "Sample playing");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        let result = self.toggle_pause();
        record(&mut self.last_error, result)
    }

    fn toggle_pause(&mut self) -> Result<()> {
        let voice = self.voice.clone().ok_or(SoundError::AlreadyStopped)?;
        if self.paused {
            voice.play()?;
            self.clock.resume();
            self.push_event(SoundEventKind::SoundPlaying);
        } else {
            voice.pause()?;
            self.clock.pause();
            self.push_event(SoundEventKind::SoundPaused);
        }
        self.paused = !self.paused;
        Ok(())
    }

    pub fn stop(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        let result = if self.voice.is_some() {
            self.finish(ctx);
            Ok(())
        } else {
            Err(SoundError::AlreadyStopped)
        };
        record(&mut self.last_error, result)
    }

    fn finish(&mut self, ctx: PlayContext<'_>) {
        if let Some(voice) = self.voice.take() {
            voice.stop();
            ctx.sources.check_in(&voice);
        }
        self.paused = false;
        self.push_event(SoundEventKind::SoundStopped);
        debug!(sample = self.name, "Sample stopped");
    }

    /// Returns true once the voice ran out of data.
    pub fn update(&mut self, ctx: PlayContext<'_>) -> bool {
        match &self.voice {
            Some(voice) if voice.state() == VoiceState::Stopped => {
                self.finish(ctx);
                true
            }
            _ => false,
        }
    }

    fn push_event(&mut self, kind: SoundEventKind) {
        if !self.silent {
            self.events.push(kind);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SoundEventKind> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("name", &self.name)
            .field("frames", &self.buffer.frames())
            .field("playing", &self.is_playing())
            .finish()
    }
}
