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

//! Playable sound objects.
//!
//! Every catalog entry is one [SoundObject]: a multi-track [Sound], a
//! [Music] line with rhythm layers, a single [Sample], or a decoded
//! [Stream]. They share one capability set and are driven by polling
//! `update` from the scheduler.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::audio::SourcePool;
use crate::error::{ErrorKind, Result, SoundError};
use crate::samples::SamplePool;

mod composite;
pub mod events;
mod music;
mod sample;
mod stream;
mod track;

pub use composite::Sound;
pub use events::{EventSink, SoundEvent, SoundEventKind, TrackEvent};
pub use music::{Music, Rhythm};
pub use sample::Sample;
pub use stream::Stream;
pub use track::{PlayState, Track};

/// The pools a sound draws on while playing.
#[derive(Clone, Copy)]
pub struct PlayContext<'a> {
    pub samples: &'a SamplePool,
    pub sources: &'a SourcePool,
}

/// Wall-clock playback time that stands still while paused.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Clock {
    started: Option<Instant>,
    banked: Duration,
}

impl Clock {
    pub(crate) fn restart(&mut self) {
        self.started = Some(Instant::now());
        self.banked = Duration::ZERO;
    }

    pub(crate) fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.banked += started.elapsed();
        }
    }

    pub(crate) fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.banked + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }
}

pub enum SoundObject {
    Composite(Sound),
    Music(Music),
    Sample(Sample),
    Stream(Stream),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            SoundObject::Composite($s) => $body,
            SoundObject::Music($s) => $body,
            SoundObject::Sample($s) => $body,
            SoundObject::Stream($s) => $body,
        }
    };
}

impl SoundObject {
    pub fn name(&self) -> &str {
        dispatch!(self, s => s.name())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SoundObject::Composite(_) => "sound",
            SoundObject::Music(_) => "music",
            SoundObject::Sample(_) => "sample",
            SoundObject::Stream(_) => "stream",
        }
    }

    /// A stopped copy registered under `name`.
    pub fn renamed(&self, name: &str) -> SoundObject {
        match self {
            SoundObject::Composite(s) => SoundObject::Composite(s.renamed(name)),
            SoundObject::Music(s) => SoundObject::Music(s.renamed(name)),
            SoundObject::Sample(s) => SoundObject::Sample(s.renamed(name)),
            SoundObject::Stream(s) => SoundObject::Stream(s.renamed(name)),
        }
    }

    /// Plays the whole object, or one track of a multi-track sound.
    pub fn play(
        &mut self,
        ctx: PlayContext<'_>,
        track: Option<usize>,
        looping: bool,
        silent: bool,
    ) -> Result<()> {
        match (self, track) {
            (SoundObject::Composite(s), track) => s.play(ctx, track, looping, silent),
            (SoundObject::Music(s), None) => s.play(ctx, looping, silent),
            (SoundObject::Sample(s), None) => s.play(ctx, looping, silent),
            (SoundObject::Stream(s), None) => s.play(ctx, looping, silent),
            (_, Some(_)) => Err(SoundError::UnsupportedType("play_track")),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        dispatch!(self, s => s.pause())
    }

    pub fn stop(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        dispatch!(self, s => s.stop(ctx))
    }

    /// Polls playback progress. Returns true when the object stopped during
    /// this call.
    pub fn update(&mut self, ctx: PlayContext<'_>) -> bool {
        dispatch!(self, s => s.update(ctx))
    }

    pub fn is_playing(&self) -> bool {
        dispatch!(self, s => s.is_playing())
    }

    pub fn is_paused(&self) -> bool {
        dispatch!(self, s => s.is_paused())
    }

    pub fn is_stopped(&self) -> bool {
        dispatch!(self, s => s.is_stopped())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, s => s.is_empty())
    }

    /// Compares two objects of the same variant.
    pub fn compare(&self, other: &SoundObject) -> Result<bool> {
        match (self, other) {
            (SoundObject::Composite(a), SoundObject::Composite(b)) => Ok(a.compare(b)),
            (SoundObject::Music(a), SoundObject::Music(b)) => Ok(a.compare(b)),
            (SoundObject::Sample(_), SoundObject::Sample(_))
            | (SoundObject::Stream(_), SoundObject::Stream(_)) => {
                Err(SoundError::NotImplemented("compare"))
            }
            _ => Err(SoundError::UnsupportedType("compare")),
        }
    }

    /// Writes the object as a score file.
    pub fn save(&self, path: &Path) -> Result<()> {
        match self {
            SoundObject::Composite(s) => crate::score::write_file(&s.to_score(), path),
            SoundObject::Music(s) => crate::score::write_file(&s.to_score(), path),
            SoundObject::Sample(_) | SoundObject::Stream(_) => {
                Err(SoundError::NotImplemented("save"))
            }
        }
    }

    /// The object's audio as one mono PCM buffer.
    pub fn data(&self, samples: &SamplePool) -> Result<Vec<i16>> {
        match self {
            SoundObject::Composite(s) => s.data(samples),
            SoundObject::Music(s) => s.data(samples),
            SoundObject::Sample(s) => Ok(s.data()),
            SoundObject::Stream(_) => Err(SoundError::NotImplemented("data")),
        }
    }

    pub fn size(&self, samples: &SamplePool) -> Result<usize> {
        match self {
            SoundObject::Composite(s) => s.size(samples),
            SoundObject::Music(s) => s.size(samples),
            SoundObject::Sample(s) => Ok(s.size()),
            SoundObject::Stream(_) => Err(SoundError::NotImplemented("size")),
        }
    }

    /// Sample rate of the data returned by [SoundObject::data], when it is known.
    pub fn data_rate(&self, samples: &SamplePool) -> Option<u32> {
        match self {
            SoundObject::Composite(s) => s.tracks().iter().find_map(|t| {
                t.note_samples(samples)
                    .ok()
                    .and_then(|b| b.first().map(|b| b.sample_rate()))
            }),
            SoundObject::Music(s) => s.track().note_samples(samples).ok().and_then(|b| {
                b.first().map(|b| b.sample_rate())
            }),
            SoundObject::Sample(s) => Some(s.sample_rate()),
            SoundObject::Stream(_) => None,
        }
    }

    pub fn intensity(&self) -> f32 {
        dispatch!(self, s => s.intensity())
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        dispatch!(self, s => s.set_intensity(intensity))
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        dispatch!(self, s => s.set_position(position))
    }

    pub fn percent_played(&self) -> f32 {
        dispatch!(self, s => s.percent_played())
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        dispatch!(self, s => s.last_error())
    }

    pub fn drain_events(&mut self) -> Vec<SoundEventKind> {
        dispatch!(self, s => s.drain_events())
    }
}

impl std::fmt::Debug for SoundObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.kind_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Instrument, Tempo};

    #[test]
    fn test_clock_stands_still_while_paused() {
        let mut clock = Clock::default();
        assert_eq!(clock.elapsed(), Duration::ZERO);

        clock.restart();
        std::thread::sleep(Duration::from_millis(5));
        clock.pause();
        let paused_at = clock.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.elapsed(), paused_at);

        clock.resume();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.elapsed() > paused_at);
    }

    #[test]
    fn test_compare_across_variants() {
        let sound = SoundObject::Composite(Sound::new("a", Tempo::Bpm120));
        let music = SoundObject::Music(Music::empty("b", Tempo::Bpm120, Instrument::Flute));
        assert_eq!(
            sound.compare(&music).unwrap_err().kind(),
            ErrorKind::UnsupportedType
        );
        assert!(sound.compare(&sound.renamed("c")).unwrap());
    }

    #[test]
    fn test_play_track_needs_composite() {
        let mut music = SoundObject::Music(Music::empty("b", Tempo::Bpm120, Instrument::Flute));
        let samples = SamplePool::new(vec![]);
        let device = std::sync::Arc::new(crate::audio::mock::Device::get("mock", 22050));
        let sources = SourcePool::new(device, 1, 0);
        let ctx = PlayContext {
            samples: &samples,
            sources: &sources,
        };
        assert_eq!(
            music.play(ctx, Some(0), false, false).unwrap_err().kind(),
            ErrorKind::UnsupportedType
        );
    }
}
