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

//! One instrument's note line and its playback state machine.
//!
//! A track plays by queueing one sample per note on a voice. Progress comes
//! only from the voice's processed-buffer count, read by [Track::update].

use std::sync::Arc;

use tracing::debug;

use super::events::TrackEvent;
use crate::audio::Voice;
use crate::error::{record, ErrorKind, Result, SoundError};
use crate::music::{check_octave, Instrument, Note, NoteDuration, Pitch, Tempo, TimeSignature};
use crate::samples::{SampleBuffer, SamplePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

pub struct Track {
    notes: Vec<Note>,
    instrument: Instrument,
    tempo: Tempo,
    time_signature: TimeSignature,
    intensity: f32,
    position: [f32; 3],
    state: PlayState,
    /// Index of the note currently reported as playing.
    last_note_played: usize,
    last_note_stopped: Option<usize>,
    voice: Option<Arc<dyn Voice>>,
    events: Vec<TrackEvent>,
    last_error: Option<ErrorKind>,
}

impl Track {
    pub fn new(instrument: Instrument, tempo: Tempo, time_signature: TimeSignature) -> Track {
        Track {
            notes: Vec::new(),
            instrument,
            tempo,
            time_signature,
            intensity: 1.0,
            position: [0.0; 3],
            state: PlayState::Stopped,
            last_note_played: 0,
            last_note_stopped: None,
            voice: None,
            events: Vec::new(),
            last_error: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, index: usize) -> Result<&Note> {
        self.notes.get(index).ok_or(SoundError::NoteNotFound(index))
    }

    pub fn number_of_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn first_note(&self) -> Option<&Note> {
        self.notes.first()
    }

    pub fn last_note(&self) -> Option<&Note> {
        self.notes.last()
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    /// Duration units per beat.
    pub fn unit_time(&self) -> u32 {
        self.time_signature.unit_time()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Sets the track volume, clamped to [0, 1]. Applies at once while playing.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        if let Some(voice) = &self.voice {
            voice.set_gain(self.intensity);
        }
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
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

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlayState::Stopped
    }

    /// Start of the note at `index`, in duration units from the top of the track.
    pub fn note_start(&self, index: usize) -> u32 {
        self.notes
            .iter()
            .take(index)
            .map(|n| n.duration().value() as u32)
            .sum()
    }

    /// Where the next appended note starts.
    pub fn last_position(&self) -> u32 {
        self.note_start(self.notes.len())
    }

    pub fn total_duration_ms(&self) -> u64 {
        let beats = f64::from(self.last_position()) / f64::from(self.unit_time());
        (beats * 60000.0 / f64::from(self.tempo.bpm())) as u64
    }

    /// Number of beat units the track spans, rounded up.
    pub fn bars(&self) -> u32 {
        self.last_position().div_ceil(self.unit_time())
    }

    pub fn add_note(&mut self, duration: NoteDuration, pitch: Pitch, octave: u8) -> Result<()> {
        let result = check_octave(octave).map(|_| {
            self.notes.push(Note::new(duration, pitch, octave));
        });
        record(&mut self.last_error, result)
    }

    /// Inserts before the first note starting at or after `position`, or
    /// appends. Returns the index the note landed at.
    pub fn insert_note(
        &mut self,
        position: u32,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
    ) -> Result<usize> {
        let result = check_octave(octave).map(|_| {
            let mut start = 0;
            let mut index = self.notes.len();
            for (i, note) in self.notes.iter().enumerate() {
                if start >= position {
                    index = i;
                    break;
                }
                start += note.duration().value() as u32;
            }
            self.notes.insert(index, Note::new(duration, pitch, octave));
            index
        });
        record(&mut self.last_error, result)
    }

    pub fn insert_note_before(
        &mut self,
        index: usize,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
    ) -> Result<()> {
        let result = check_octave(octave).and_then(|_| {
            if index >= self.notes.len() {
                return Err(SoundError::NoteNotFound(index));
            }
            self.notes.insert(index, Note::new(duration, pitch, octave));
            Ok(())
        });
        record(&mut self.last_error, result)
    }

    pub fn delete_note(&mut self, index: usize) -> Result<Note> {
        let result = if index < self.notes.len() {
            Ok(self.notes.remove(index))
        } else {
            Err(SoundError::InvalidPosition(index))
        };
        record(&mut self.last_error, result)
    }

    pub fn delete_last_note(&mut self) -> Result<Note> {
        let result = self.notes.pop().ok_or(SoundError::EmptyTrack(0));
        record(&mut self.last_error, result)
    }

    pub fn delete_all_notes(&mut self) {
        self.notes.clear();
        self.last_error = None;
    }

    /// Returns the shared note count when both tracks hold the same notes in
    /// the same order.
    pub fn compare(&self, other: &Track) -> Option<usize> {
        (self.notes == other.notes).then_some(self.notes.len())
    }

    /// The samples behind each note, loading any that are missing.
    pub fn note_samples(&self, samples: &SamplePool) -> Result<Vec<Arc<SampleBuffer>>> {
        self.notes
            .iter()
            .map(|note| samples.note_sample(self.instrument, self.tempo, note))
            .collect()
    }

    /// The notes' samples joined end to end.
    pub fn render(&self, samples: &SamplePool) -> Result<Vec<i16>> {
        let buffers = self.note_samples(samples)?;
        let mut data = Vec::with_capacity(buffers.iter().map(|b| b.len()).sum());
        for buffer in buffers.iter() {
            data.extend_from_slice(buffer.samples());
        }
        Ok(data)
    }

    pub fn rendered_len(&self, samples: &SamplePool) -> Result<usize> {
        Ok(self.note_samples(samples)?.iter().map(|b| b.len()).sum())
    }

    /// Queues every note on `voice` and starts it. An empty track succeeds
    /// without touching the voice.
    pub fn play(&mut self, voice: Arc<dyn Voice>, samples: &SamplePool) -> Result<()> {
        let result = self.start(voice, samples);
        record(&mut self.last_error, result)
    }

    fn start(&mut self, voice: Arc<dyn Voice>, samples: &SamplePool) -> Result<()> {
        if self.notes.is_empty() {
            return Ok(());
        }
        if self.state != PlayState::Stopped {
            return Err(SoundError::AlreadyPlaying);
        }

        let buffers = self.note_samples(samples)?;
        voice.reset();
        voice.set_gain(self.intensity);
        voice.set_position(self.position);
        voice.queue(&buffers)?;

        self.last_note_played = 0;
        self.last_note_stopped = None;
        voice.play()?;
        self.voice = Some(voice);
        self.state = PlayState::Playing;

        debug!(notes = self.notes.len(), "Track playing");
        self.events.push(TrackEvent::Playing);
        self.events.push(TrackEvent::NotePlaying(0));
        Ok(())
    }

    /// Toggles between playing and paused.
    pub fn pause(&mut self) -> Result<()> {
        let result = self.toggle_pause();
        record(&mut self.last_error, result)
    }

    fn toggle_pause(&mut self) -> Result<()> {
        let voice = match (&self.voice, self.state) {
            (_, PlayState::Stopped) | (None, _) => return Err(SoundError::AlreadyStopped),
            (Some(voice), _) => voice.clone(),
        };

        if self.state == PlayState::Playing {
            voice.pause()?;
            self.state = PlayState::Paused;
            self.events.push(TrackEvent::Paused);
        } else {
            voice.play()?;
            self.state = PlayState::Playing;
            self.events.push(TrackEvent::Playing);
        }
        Ok(())
    }

    /// Halts playback. Every note that was reported playing and not yet
    /// stopped gets its stop event before the track's own.
    pub fn stop(&mut self) -> Result<()> {
        let result = if self.state == PlayState::Stopped {
            Err(SoundError::AlreadyStopped)
        } else {
            self.halt();
            Ok(())
        };
        record(&mut self.last_error, result)
    }

    fn halt(&mut self) {
        if let Some(voice) = &self.voice {
            voice.stop();
            voice.unqueue_all();
        }

        let first = self.last_note_stopped.map_or(0, |i| i + 1);
        for index in first..=self.last_note_played {
            if index < self.notes.len() {
                self.events.push(TrackEvent::NoteStopped(index));
            }
        }
        self.last_note_stopped = Some(self.last_note_played);
        self.state = PlayState::Stopped;
        self.events.push(TrackEvent::Stopped);
        debug!("Track stopped");
    }

    /// Reads the voice's progress and raises note events for it. Returns true
    /// when the track ran out of notes and stopped during this call.
    pub fn update(&mut self) -> bool {
        if self.state != PlayState::Playing {
            return false;
        }
        let processed = match &self.voice {
            Some(voice) => voice.buffers_processed().min(self.notes.len()),
            None => self.notes.len(),
        };

        if processed > self.last_note_played {
            for index in self.last_note_played..processed {
                self.last_note_stopped = Some(index);
                self.events.push(TrackEvent::NoteStopped(index));
                if index + 1 < self.notes.len() {
                    self.events.push(TrackEvent::NotePlaying(index + 1));
                }
            }
            self.last_note_played = processed;
        }

        if processed == self.notes.len() {
            self.halt();
            return true;
        }
        false
    }

    /// Hands back the voice so the owner can return it to the pool.
    pub fn release_voice(&mut self) -> Option<Arc<dyn Voice>> {
        self.voice.take()
    }

    pub fn voice(&self) -> Option<&Arc<dyn Voice>> {
        self.voice.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<TrackEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Copies the notes and settings. The copy is stopped and holds no voice.
impl Clone for Track {
    fn clone(&self) -> Self {
        Track {
            notes: self.notes.clone(),
            instrument: self.instrument,
            tempo: self.tempo,
            time_signature: self.time_signature,
            intensity: self.intensity,
            position: self.position,
            state: PlayState::Stopped,
            last_note_played: 0,
            last_note_stopped: None,
            voice: None,
            events: Vec::new(),
            last_error: self.last_error,
        }
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("instrument", &self.instrument)
            .field("tempo", &self.tempo)
            .field("time_signature", &self.time_signature)
            .field("notes", &self.notes.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{mock, Device, VoiceState};
    use crate::testutil::sample_library;

    fn track() -> Track {
        let mut track = Track::new(Instrument::Flute, Tempo::Bpm120, TimeSignature::FourFour);
        track.add_note(NoteDuration::Crotchet, Pitch::Do, 3).unwrap();
        track.add_note(NoteDuration::Crotchet, Pitch::Re, 3).unwrap();
        track.add_note(NoteDuration::Minim, Pitch::Pause, 0).unwrap();
        track
    }

    fn harness() -> (tempfile::TempDir, SamplePool, mock::Device) {
        let library = sample_library(&[Instrument::Flute], &[Tempo::Bpm120], &[]);
        let pool = SamplePool::new(vec![library.path().to_path_buf()]);
        (library, pool, mock::Device::get("mock", 22050))
    }

    /// Frames a note of `duration` lasts in the fixture library.
    fn frames(duration: NoteDuration) -> usize {
        crate::testutil::fixture_len(duration)
    }

    fn count(events: &[TrackEvent], f: impl Fn(&TrackEvent) -> bool) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn test_octave_validation_leaves_notes() {
        let mut track = track();
        let result = track.add_note(NoteDuration::Crotchet, Pitch::Do, 5);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidOctave);
        assert_eq!(track.last_error(), Some(ErrorKind::InvalidOctave));
        assert_eq!(track.number_of_notes(), 3);

        assert!(track.insert_note(0, NoteDuration::Crotchet, Pitch::Do, 1).is_err());
        assert_eq!(track.number_of_notes(), 3);

        track.add_note(NoteDuration::Crotchet, Pitch::Mi, 4).unwrap();
        assert_eq!(track.last_error(), None);
    }

    #[test]
    fn test_positions() {
        let track = track();
        assert_eq!(track.note_start(0), 0);
        assert_eq!(track.note_start(2), 64);
        assert_eq!(track.last_position(), 128);
        assert_eq!(track.total_duration_ms(), 2000);
        assert_eq!(track.bars(), 4);
    }

    #[test]
    fn test_insert_note_positional() {
        let mut track = track();
        // Starts: 0, 32, 64. Position 40 lands before the pause.
        let index = track
            .insert_note(40, NoteDuration::Quaver, Pitch::Mi, 3)
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(track.note(2).unwrap().pitch(), Pitch::Mi);

        let index = track
            .insert_note(0, NoteDuration::Quaver, Pitch::Fa, 3)
            .unwrap();
        assert_eq!(index, 0);

        let index = track
            .insert_note(10_000, NoteDuration::Quaver, Pitch::Sol, 3)
            .unwrap();
        assert_eq!(index, track.number_of_notes() - 1);
    }

    #[test]
    fn test_insert_before_and_delete() {
        let mut track = track();
        track
            .insert_note_before(1, NoteDuration::Minim, Pitch::Si, 3)
            .unwrap();
        assert_eq!(track.note(1).unwrap().pitch(), Pitch::Si);
        assert_eq!(
            track
                .insert_note_before(9, NoteDuration::Minim, Pitch::Si, 3)
                .unwrap_err()
                .kind(),
            ErrorKind::NoteNotFound
        );

        assert_eq!(track.delete_note(1).unwrap().pitch(), Pitch::Si);
        assert_eq!(
            track.delete_note(3).unwrap_err().kind(),
            ErrorKind::InvalidPosition
        );

        track.delete_all_notes();
        assert!(track.is_empty());
        assert_eq!(
            track.delete_last_note().unwrap_err().kind(),
            ErrorKind::EmptyTrack
        );
    }

    #[test]
    fn test_compare() {
        let a = track();
        let mut b = a.clone();
        assert_eq!(a.compare(&b), Some(3));

        b.delete_last_note().unwrap();
        b.add_note(NoteDuration::Minim, Pitch::Pause, 3).unwrap();
        assert_eq!(a.compare(&b), None);

        b.delete_last_note().unwrap();
        assert_eq!(a.compare(&b), None);
    }

    #[test]
    fn test_play_empty_is_noop() {
        let (_library, pool, device) = harness();
        let mut track = Track::new(Instrument::Flute, Tempo::Bpm120, TimeSignature::FourFour);
        let voice = device.create_voice().unwrap();
        track.play(voice.clone(), &pool).unwrap();
        assert!(track.is_stopped());
        assert!(track.drain_events().is_empty());
        assert_eq!(voice.state(), VoiceState::Initial);
    }

    #[test]
    fn test_play_update_to_end() {
        let (_library, pool, device) = harness();
        let mut track = track();
        track.set_intensity(1.5);
        assert_eq!(track.intensity(), 1.0);

        let voice = device.create_voice().unwrap();
        track.play(voice.clone(), &pool).unwrap();
        assert_eq!(voice.queued(), 3);
        assert_eq!(
            track.drain_events(),
            vec![TrackEvent::Playing, TrackEvent::NotePlaying(0)]
        );

        device.advance(frames(NoteDuration::Crotchet) + 1);
        assert!(!track.update());
        assert_eq!(
            track.drain_events(),
            vec![TrackEvent::NoteStopped(0), TrackEvent::NotePlaying(1)]
        );

        device.advance(frames(NoteDuration::Crotchet) + frames(NoteDuration::Minim) + 1);
        assert!(track.update());
        assert_eq!(
            track.drain_events(),
            vec![
                TrackEvent::NoteStopped(1),
                TrackEvent::NotePlaying(2),
                TrackEvent::NoteStopped(2),
                TrackEvent::Stopped,
            ]
        );
        assert!(track.is_stopped());
        assert!(track.release_voice().is_some());
    }

    #[test]
    fn test_stop_reports_every_started_note() {
        let (_library, pool, device) = harness();
        let mut track = track();
        let voice = device.create_voice().unwrap();
        track.play(voice, &pool).unwrap();

        device.advance(frames(NoteDuration::Crotchet) + 1);
        track.update();
        track.stop().unwrap();

        let events = track.drain_events();
        let started = count(&events, |e| matches!(e, TrackEvent::NotePlaying(_)));
        let stopped = count(&events, |e| matches!(e, TrackEvent::NoteStopped(_)));
        assert_eq!(started, 2);
        assert_eq!(started, stopped);
        assert_eq!(events.last(), Some(&TrackEvent::Stopped));

        assert_eq!(track.stop().unwrap_err().kind(), ErrorKind::AlreadyStopped);
        assert!(track.drain_events().is_empty());
    }

    #[test]
    fn test_pause_toggles() {
        let (_library, pool, device) = harness();
        let mut track = track();
        assert_eq!(track.pause().unwrap_err().kind(), ErrorKind::AlreadyStopped);

        let voice = device.create_voice().unwrap();
        track.play(voice.clone(), &pool).unwrap();
        track.drain_events();

        track.pause().unwrap();
        assert!(track.is_paused());
        assert_eq!(voice.state(), VoiceState::Paused);
        // No progress while paused.
        device.advance(frames(NoteDuration::Semibreve));
        assert!(!track.update());

        track.pause().unwrap();
        assert!(track.is_playing());
        assert_eq!(
            track.drain_events(),
            vec![TrackEvent::Paused, TrackEvent::Playing]
        );
    }

    #[test]
    fn test_render() {
        let (_library, pool, _device) = harness();
        let track = track();
        let data = track.render(&pool).unwrap();
        let expected = 2 * frames(NoteDuration::Crotchet) + frames(NoteDuration::Minim);
        assert_eq!(data.len(), expected);
        assert_eq!(track.rendered_len(&pool).unwrap(), expected);
    }

    #[test]
    fn test_clone_is_stopped_copy() {
        let (_library, pool, device) = harness();
        let mut track = track();
        track.play(device.create_voice().unwrap(), &pool).unwrap();

        let copy = track.clone();
        assert!(copy.is_stopped());
        assert!(copy.voice().is_none());
        assert_eq!(copy.compare(&track), Some(3));
    }
}
