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
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::events::SoundEventKind;
use super::track::Track;
use super::{Clock, PlayContext};
use crate::error::{record, ErrorKind, Result, SoundError};
use crate::mixdown::mix_layers;
use crate::music::{Instrument, Note, NoteDuration, Pitch, Tempo, TimeSignature, UNIT_TIME_DEFAULT};
use crate::samples::SamplePool;
use crate::score::{Score, ScoreBody, ScoreTrack};

/// A multi-track sound. Every track plays on its own voice; the tracks are
/// soft-mixed into one buffer for export.
pub struct Sound {
    name: String,
    tempo: Tempo,
    tracks: Vec<Track>,
    /// Fixed target duration carried through the score file.
    music_duration: Option<u32>,
    intensity: f32,
    position: [f32; 3],
    looping: bool,
    silent: bool,
    /// Track addressed by the current playback, or all of them.
    selected: Option<usize>,
    active: bool,
    paused: bool,
    clock: Clock,
    events: Vec<SoundEventKind>,
    last_error: Option<ErrorKind>,
}

impl Sound {
    pub fn new(name: &str, tempo: Tempo) -> Sound {
        Sound {
            name: name.to_string(),
            tempo,
            tracks: Vec::new(),
            music_duration: None,
            intensity: 1.0,
            position: [0.0; 3],
            looping: false,
            silent: false,
            selected: None,
            active: false,
            paused: false,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A stopped copy of this sound under another name.
    pub fn renamed(&self, name: &str) -> Sound {
        let mut copy = self.clone();
        copy.name = name.to_string();
        copy
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Changes the tempo of the sound and every track.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
        for track in self.tracks.iter_mut() {
            track.set_tempo(tempo);
        }
        self.last_error = None;
    }

    pub fn set_track_tempo(&mut self, track: usize, tempo: Tempo) -> Result<()> {
        self.on_track(track, |t| {
            t.set_tempo(tempo);
            Ok(())
        })
    }

    pub fn set_instrument(&mut self, track: usize, instrument: Instrument) -> Result<()> {
        self.on_track(track, |t| {
            t.set_instrument(instrument);
            Ok(())
        })
    }

    pub fn music_duration(&self) -> Option<u32> {
        self.music_duration
    }

    pub fn set_music_duration(&mut self, duration: Option<u32>) {
        self.music_duration = duration.filter(|d| *d > 0);
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Sets the volume of the sound and every track, clamped to [0, 1].
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        for track in self.tracks.iter_mut() {
            track.set_intensity(self.intensity);
        }
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
        for track in self.tracks.iter_mut() {
            track.set_position(position);
        }
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// The last error of a track, or the sound's own when there is no such track.
    pub fn track_last_error(&self, track: usize) -> Option<ErrorKind> {
        self.tracks
            .get(track)
            .map_or(self.last_error, |t| t.last_error())
    }

    pub fn add_track(&mut self, instrument: Instrument, time_signature: TimeSignature) -> usize {
        let mut track = Track::new(instrument, self.tempo, time_signature);
        track.set_intensity(self.intensity);
        track.set_position(self.position);
        self.tracks.push(track);
        self.last_error = None;
        debug!(sound = self.name, track = self.tracks.len() - 1, "Added track");
        self.tracks.len() - 1
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn number_of_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, index: usize) -> Result<&Track> {
        self.tracks
            .get(index)
            .ok_or_else(|| SoundError::UnknownIdentity(format!("{} track {}", self.name, index)))
    }

    /// Runs `f` against a track, recording its outcome as the sound's last error.
    fn on_track<T>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Track) -> Result<T>,
    ) -> Result<T> {
        let result = match self.tracks.get_mut(index) {
            Some(track) => f(track),
            None => Err(SoundError::UnknownIdentity(format!(
                "{} track {}",
                self.name, index
            ))),
        };
        record(&mut self.last_error, result)
    }

    pub fn notes(&self, track: usize) -> Result<&[Note]> {
        Ok(self.track(track)?.notes())
    }

    pub fn number_of_notes(&self, track: usize) -> usize {
        self.tracks.get(track).map_or(0, |t| t.number_of_notes())
    }

    pub fn add_note(
        &mut self,
        track: usize,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
    ) -> Result<()> {
        self.on_track(track, |t| t.add_note(duration, pitch, octave))
    }

    pub fn insert_note(
        &mut self,
        track: usize,
        position: u32,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
    ) -> Result<usize> {
        self.on_track(track, |t| t.insert_note(position, duration, pitch, octave))
    }

    pub fn insert_note_before(
        &mut self,
        track: usize,
        index: usize,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
    ) -> Result<()> {
        self.on_track(track, |t| t.insert_note_before(index, duration, pitch, octave))
    }

    pub fn delete_note(&mut self, track: usize, index: usize) -> Result<Note> {
        self.on_track(track, |t| t.delete_note(index))
    }

    pub fn delete_last_note(&mut self, track: usize) -> Result<Note> {
        self.on_track(track, |t| t.delete_last_note())
    }

    pub fn delete_all_notes(&mut self, track: usize) -> Result<()> {
        self.on_track(track, |t| {
            t.delete_all_notes();
            Ok(())
        })
    }

    pub fn total_notes(&self) -> usize {
        self.tracks.iter().map(|t| t.number_of_notes()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_notes() == 0
    }

    /// Equal tempo, track count, and per track equal notes, instrument and
    /// time signature.
    pub fn compare(&self, other: &Sound) -> bool {
        self.tempo == other.tempo
            && self.tracks.len() == other.tracks.len()
            && self.tracks.iter().zip(other.tracks.iter()).all(|(a, b)| {
                a.compare(b).is_some()
                    && a.instrument() == b.instrument()
                    && a.time_signature() == b.time_signature()
            })
    }

    /// Compares two tracks of this sound.
    pub fn compare_tracks(&mut self, first: usize, second: usize) -> Result<Option<usize>> {
        let result = match (self.tracks.get(first), self.tracks.get(second)) {
            (Some(a), Some(b)) => Ok(a.compare(b)),
            _ => Err(SoundError::UnknownIdentity(format!(
                "{} track {} or {}",
                self.name, first, second
            ))),
        };
        record(&mut self.last_error, result)
    }

    /// Where the given track ends, or the furthest end of any track, in
    /// duration units.
    pub fn time_to_stop(&self, track: Option<usize>) -> u32 {
        match track {
            None => self
                .tracks
                .iter()
                .map(|t| t.last_position())
                .max()
                .unwrap_or(0),
            Some(index) => self.tracks.get(index).map_or(0, |t| t.last_position()),
        }
    }

    pub fn unit_time(&self, track: usize) -> u32 {
        self.tracks.get(track).map_or(0, |t| t.unit_time())
    }

    pub fn track_bars(&self, track: usize) -> u32 {
        self.tracks.get(track).map_or(0, |t| t.bars())
    }

    /// Bars spanned by the longest track, counted in default units.
    pub fn bars(&self) -> u32 {
        self.time_to_stop(None).div_ceil(UNIT_TIME_DEFAULT)
    }

    /// Length of the longest track in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.tracks
            .iter()
            .map(|t| t.total_duration_ms())
            .max()
            .unwrap_or(0)
    }

    pub fn percent_played(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let total = match self.selected {
            None => self.total_duration_ms(),
            Some(index) => self.tracks.get(index).map_or(0, |t| t.total_duration_ms()),
        };
        if total == 0 {
            return 0.0;
        }
        (self.clock.elapsed().as_millis() as f64 / total as f64).min(1.0) as f32
    }

    pub fn is_playing(&self) -> bool {
        self.active && !self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.active && self.paused
    }

    pub fn is_stopped(&self) -> bool {
        !self.active
    }

    pub fn selected_track(&self) -> Option<usize> {
        self.selected
    }

    /// Starts every non-empty track, or just `track`. When any track fails to
    /// start, the tracks already started are stopped again.
    pub fn play(
        &mut self,
        ctx: PlayContext<'_>,
        track: Option<usize>,
        looping: bool,
        silent: bool,
    ) -> Result<()> {
        let result = self.start(ctx, track, looping, silent);
        record(&mut self.last_error, result)
    }

    fn start(
        &mut self,
        ctx: PlayContext<'_>,
        track: Option<usize>,
        looping: bool,
        silent: bool,
    ) -> Result<()> {
        if self.active {
            return Err(SoundError::AlreadyPlaying);
        }
        match track {
            None if self.is_empty() => return Err(SoundError::EmptySound),
            Some(index) => {
                if self.track(index)?.is_empty() {
                    return Err(SoundError::EmptyTrack(index));
                }
            }
            None => {}
        }

        self.looping = looping;
        self.silent = silent;
        self.selected = track;

        if let Err(e) = self.start_tracks(ctx) {
            warn!(sound = self.name, err = %e, "Unable to start sound");
            self.halt_tracks(ctx);
            self.collect_events();
            return Err(e);
        }

        self.active = true;
        self.paused = false;
        self.clock.restart();
        self.collect_events();
        self.push_event(SoundEventKind::SoundPlaying);
        info!(sound = self.name, track = ?track, looping, "Sound playing");
        Ok(())
    }

    /// Indices of the tracks the current playback addresses.
    fn addressed(&self) -> Vec<usize> {
        match self.selected {
            Some(index) => vec![index],
            None => (0..self.tracks.len()).collect(),
        }
    }

    fn start_tracks(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        for index in self.addressed() {
            let track = &mut self.tracks[index];
            if track.is_empty() {
                continue;
            }
            let voice = ctx.sources.check_out().ok_or(SoundError::NoVoiceAvailable)?;
            if let Err(e) = track.play(voice.clone(), ctx.samples) {
                ctx.sources.check_in(&voice);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Stops every running track and returns its voice.
    fn halt_tracks(&mut self, ctx: PlayContext<'_>) {
        for track in self.tracks.iter_mut() {
            if !track.is_stopped() {
                let _ = track.stop();
            }
            if let Some(voice) = track.release_voice() {
                ctx.sources.check_in(&voice);
            }
        }
    }

    /// Toggles between playing and paused.
    pub fn pause(&mut self) -> Result<()> {
        let result = if !self.active {
            Err(SoundError::AlreadyStopped)
        } else {
            for index in self.addressed() {
                let track = &mut self.tracks[index];
                if !track.is_stopped() {
                    let _ = track.pause();
                }
            }
            self.paused = !self.paused;
            if self.paused {
                self.clock.pause();
                self.collect_events();
                self.push_event(SoundEventKind::SoundPaused);
            } else {
                self.clock.resume();
                self.collect_events();
                self.push_event(SoundEventKind::SoundPlaying);
            }
            Ok(())
        };
        record(&mut self.last_error, result)
    }

    pub fn stop(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        let result = if !self.active {
            Err(SoundError::AlreadyStopped)
        } else {
            self.finish(ctx);
            Ok(())
        };
        record(&mut self.last_error, result)
    }

    fn finish(&mut self, ctx: PlayContext<'_>) {
        self.halt_tracks(ctx);
        self.active = false;
        self.paused = false;
        self.collect_events();
        self.push_event(SoundEventKind::SoundStopped);
        info!(sound = self.name, "Sound stopped");
    }

    /// Advances every addressed track. When all of them have run out, the
    /// sound restarts if looping or stops otherwise. Returns true when the
    /// sound stopped during this call.
    pub fn update(&mut self, ctx: PlayContext<'_>) -> bool {
        if !self.active || self.paused {
            return false;
        }

        let addressed = self.addressed();
        for &index in addressed.iter() {
            let track = &mut self.tracks[index];
            if track.is_playing() && track.update() {
                if let Some(voice) = track.release_voice() {
                    ctx.sources.check_in(&voice);
                }
            }
        }
        self.collect_events();

        let ended = addressed.iter().all(|&i| self.tracks[i].is_stopped());
        if !ended {
            return false;
        }

        if self.looping {
            debug!(sound = self.name, "Restarting loop");
            match self.start_tracks(ctx) {
                Ok(()) => {
                    self.clock.restart();
                    self.collect_events();
                    return false;
                }
                Err(e) => {
                    warn!(sound = self.name, err = %e, "Unable to restart loop");
                    self.last_error = Some(e.kind());
                }
            }
        }
        self.finish(ctx);
        true
    }

    fn collect_events(&mut self) {
        for (index, track) in self.tracks.iter_mut().enumerate() {
            for event in track.drain_events() {
                if !self.silent {
                    self.events.push(SoundEventKind::from_track(index, event));
                }
            }
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

    pub fn track_data(&self, track: usize, samples: &SamplePool) -> Result<Vec<i16>> {
        self.track(track)?.render(samples)
    }

    pub fn track_size(&self, track: usize, samples: &SamplePool) -> Result<usize> {
        self.track(track)?.rendered_len(samples)
    }

    /// Every track soft-mixed into one buffer as long as the longest track.
    pub fn data(&self, samples: &SamplePool) -> Result<Vec<i16>> {
        let rendered = self
            .tracks
            .par_iter()
            .map(|t| t.render(samples))
            .collect::<Result<Vec<_>>>()?;

        Ok(mix_layers(
            rendered
                .iter()
                .zip(self.tracks.iter())
                .map(|(data, track)| (data.as_slice(), track.intensity())),
        ))
    }

    /// Length of the longest rendered track.
    pub fn size(&self, samples: &SamplePool) -> Result<usize> {
        let mut size = 0;
        for track in self.tracks.iter() {
            size = size.max(track.rendered_len(samples)?);
        }
        Ok(size)
    }

    pub fn to_score(&self) -> Score {
        Score {
            name: self.name.clone(),
            tempo: self.tempo,
            duration: self.music_duration,
            body: ScoreBody::Sound(
                self.tracks
                    .iter()
                    .map(|t| ScoreTrack {
                        instrument: t.instrument(),
                        time_signature: t.time_signature(),
                        notes: t.notes().to_vec(),
                    })
                    .collect(),
            ),
        }
    }

    /// Builds a sound from a multi-track score, under `name`.
    pub fn from_score(name: &str, score: &Score) -> Result<Sound> {
        let ScoreBody::Sound(tracks) = &score.body else {
            return Err(SoundError::UnsupportedType("music score as sound"));
        };
        let mut sound = Sound::new(name, score.tempo);
        sound.set_music_duration(score.duration);
        for scored in tracks.iter() {
            let index = sound.add_track(scored.instrument, scored.time_signature);
            for note in scored.notes.iter() {
                sound.add_note(index, note.duration(), note.pitch(), note.octave())?;
            }
        }
        Ok(sound)
    }
}

/// Copies name, settings and tracks. The copy is stopped.
impl Clone for Sound {
    fn clone(&self) -> Self {
        Sound {
            name: self.name.clone(),
            tempo: self.tempo,
            tracks: self.tracks.clone(),
            music_duration: self.music_duration,
            intensity: self.intensity,
            position: self.position,
            looping: false,
            silent: false,
            selected: None,
            active: false,
            paused: false,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        }
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("name", &self.name)
            .field("tempo", &self.tempo)
            .field("tracks", &self.tracks)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{mock, SourcePool};
    use crate::testutil::{fixture_len, sample_library};
    use std::sync::Arc;

    struct Harness {
        _library: tempfile::TempDir,
        samples: SamplePool,
        sources: SourcePool,
        device: mock::Device,
    }

    impl Harness {
        fn new(max_voices: usize) -> Harness {
            let library = sample_library(
                &[Instrument::Flute, Instrument::Piano],
                &[Tempo::Bpm120],
                &[],
            );
            let device = mock::Device::get("mock", 22050);
            Harness {
                samples: SamplePool::new(vec![library.path().to_path_buf()]),
                sources: SourcePool::new(Arc::new(device.clone()), max_voices, 0),
                _library: library,
                device,
            }
        }

        fn ctx(&self) -> PlayContext<'_> {
            PlayContext {
                samples: &self.samples,
                sources: &self.sources,
            }
        }
    }

    fn demo() -> Sound {
        let mut sound = Sound::new("demo", Tempo::Bpm120);
        let track = sound.add_track(Instrument::Flute, TimeSignature::FourFour);
        sound.add_note(track, NoteDuration::Crotchet, Pitch::Do, 3).unwrap();
        sound.add_note(track, NoteDuration::Crotchet, Pitch::Re, 3).unwrap();
        sound.add_note(track, NoteDuration::Minim, Pitch::Pause, 0).unwrap();
        sound
    }

    #[test]
    fn test_demo_scenario() {
        let sound = demo();
        assert!(!sound.is_empty());
        assert_eq!(sound.number_of_notes(0), 3);
        assert_eq!(sound.bars(), 1);
        assert_eq!(sound.track_bars(0), 4);
        assert_eq!(sound.time_to_stop(None), 128);
        assert_eq!(sound.total_duration_ms(), 2000);
    }

    #[test]
    fn test_compare() {
        let a = demo();
        let mut b = demo().renamed("other");
        assert!(a.compare(&b));

        b.delete_last_note(0).unwrap();
        b.add_note(0, NoteDuration::Minim, Pitch::Pause, 4).unwrap();
        assert!(!a.compare(&b));

        let mut c = demo();
        c.set_tempo(Tempo::Bpm60);
        assert!(!a.compare(&c));
    }

    #[test]
    fn test_track_errors_propagate() {
        let mut sound = demo();
        assert!(sound.add_note(0, NoteDuration::Crotchet, Pitch::Do, 7).is_err());
        assert_eq!(sound.last_error(), Some(ErrorKind::InvalidOctave));
        assert_eq!(sound.track_last_error(0), Some(ErrorKind::InvalidOctave));

        assert_eq!(
            sound.add_note(3, NoteDuration::Crotchet, Pitch::Do, 3).unwrap_err().kind(),
            ErrorKind::UnknownIdentity
        );
        sound.add_note(0, NoteDuration::Crotchet, Pitch::Do, 3).unwrap();
        assert_eq!(sound.last_error(), None);
    }

    #[test]
    fn test_play_empty() {
        let harness = Harness::new(2);
        let mut sound = Sound::new("empty", Tempo::Bpm120);
        sound.add_track(Instrument::Flute, TimeSignature::FourFour);
        assert_eq!(
            sound.play(harness.ctx(), None, false, false).unwrap_err().kind(),
            ErrorKind::EmptySound
        );
        assert_eq!(
            sound.play(harness.ctx(), Some(0), false, false).unwrap_err().kind(),
            ErrorKind::EmptyTrack
        );
        assert_eq!(harness.sources.checked_out_count(), 0);
    }

    #[test]
    fn test_play_to_end() {
        let harness = Harness::new(2);
        let mut sound = demo();
        sound.play(harness.ctx(), None, false, false).unwrap();
        assert!(sound.is_playing());
        assert_eq!(harness.sources.checked_out_count(), 1);
        assert_eq!(
            sound.drain_events(),
            vec![
                SoundEventKind::TrackPlaying(0),
                SoundEventKind::NotePlaying { track: 0, note: 0 },
                SoundEventKind::SoundPlaying,
            ]
        );

        let frames = 2 * fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim);
        harness.device.advance(frames + 1);
        assert!(sound.update(harness.ctx()));
        assert!(sound.is_stopped());
        assert_eq!(harness.sources.checked_out_count(), 0);

        let events = sound.drain_events();
        assert_eq!(events.last(), Some(&SoundEventKind::SoundStopped));
        let started = events
            .iter()
            .filter(|e| matches!(e, SoundEventKind::NotePlaying { .. }))
            .count();
        let stopped = events
            .iter()
            .filter(|e| matches!(e, SoundEventKind::NoteStopped { .. }))
            .count();
        assert_eq!(started + 1, stopped);
    }

    #[test]
    fn test_loop_reacquires_voices() {
        let harness = Harness::new(2);
        let mut sound = demo();
        sound.play(harness.ctx(), None, true, true).unwrap();

        let frames = 2 * fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim);
        harness.device.advance(frames + 1);
        assert!(!sound.update(harness.ctx()));
        assert!(sound.is_playing());
        assert_eq!(harness.sources.checked_out_count(), 1);
        // Silent playback raises nothing.
        assert!(sound.drain_events().is_empty());

        sound.stop(harness.ctx()).unwrap();
        assert_eq!(harness.sources.checked_out_count(), 0);
    }

    #[test]
    fn test_failed_start_rolls_back() {
        let harness = Harness::new(1);
        let mut sound = demo();
        let second = sound.add_track(Instrument::Piano, TimeSignature::ThreeFour);
        sound.add_note(second, NoteDuration::Minim, Pitch::Mi, 4).unwrap();

        let err = sound.play(harness.ctx(), None, false, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoVoiceAvailable);
        assert_eq!(sound.last_error(), Some(ErrorKind::NoVoiceAvailable));
        assert!(sound.is_stopped());
        assert!(sound.tracks().iter().all(|t| t.is_stopped()));
        assert_eq!(harness.sources.checked_out_count(), 0);
    }

    #[test]
    fn test_play_one_track() {
        let harness = Harness::new(2);
        let mut sound = demo();
        let second = sound.add_track(Instrument::Piano, TimeSignature::FourFour);
        sound.add_note(second, NoteDuration::Minim, Pitch::Mi, 4).unwrap();

        sound.play(harness.ctx(), Some(1), false, false).unwrap();
        assert_eq!(sound.selected_track(), Some(1));
        assert!(sound.tracks()[0].is_stopped());
        assert!(sound.tracks()[1].is_playing());

        sound.pause().unwrap();
        assert!(sound.is_paused());
        assert!(sound.tracks()[1].is_paused());
        sound.pause().unwrap();
        assert!(sound.is_playing());

        harness.device.advance(fixture_len(NoteDuration::Minim) + 1);
        assert!(sound.update(harness.ctx()));
        assert_eq!(
            sound.stop(harness.ctx()).unwrap_err().kind(),
            ErrorKind::AlreadyStopped
        );
    }

    #[test]
    fn test_data_is_longest_track() {
        let harness = Harness::new(2);
        let mut sound = demo();
        let second = sound.add_track(Instrument::Piano, TimeSignature::FourFour);
        sound.add_note(second, NoteDuration::Crotchet, Pitch::Mi, 3).unwrap();

        let longest = 2 * fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim);
        assert_eq!(sound.size(&harness.samples).unwrap(), longest);
        assert_eq!(sound.data(&harness.samples).unwrap().len(), longest);
        assert_eq!(
            sound.track_size(1, &harness.samples).unwrap(),
            fixture_len(NoteDuration::Crotchet)
        );
    }

    #[test]
    fn test_single_track_data_matches_track() {
        let harness = Harness::new(1);
        let sound = demo();
        assert_eq!(
            sound.data(&harness.samples).unwrap(),
            sound.track_data(0, &harness.samples).unwrap()
        );
    }

    #[test]
    fn test_intensity_fans_out() {
        let mut sound = demo();
        sound.set_intensity(4.0);
        assert_eq!(sound.intensity(), 1.0);
        sound.set_intensity(0.25);
        assert!(sound.tracks().iter().all(|t| t.intensity() == 0.25));
    }

    #[test]
    fn test_score_conversion() {
        let mut sound = demo();
        sound.set_music_duration(Some(2500));
        sound.add_track(Instrument::Piano, TimeSignature::ThreeFour);

        let score = sound.to_score();
        let copy = Sound::from_score("copy", &score).unwrap();
        assert_eq!(copy.name(), "copy");
        assert_eq!(copy.music_duration(), Some(2500));
        assert_eq!(copy.number_of_tracks(), 2);
        assert_eq!(copy.tracks()[1].time_signature(), TimeSignature::ThreeFour);
        assert!(sound.compare(&copy));

        let music = Score {
            body: ScoreBody::Music(crate::score::MusicScore {
                instrument: Instrument::Flute,
                notes: vec![],
                rhythms: vec![],
                representation: None,
            }),
            ..score
        };
        assert_eq!(
            Sound::from_score("m", &music).unwrap_err().kind(),
            ErrorKind::UnsupportedType
        );
    }
}
