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

//! A single instrument line accompanied by looping rhythm layers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::events::SoundEventKind;
use super::track::Track;
use super::{Clock, PlayContext};
use crate::audio::Voice;
use crate::error::{record, ErrorKind, Result, SoundError};
use crate::mixdown::Mixdown;
use crate::music::{
    Instrument, Note, NoteDuration, Pitch, RhythmInstrument, RhythmVariation, Tempo,
    TimeSignature,
};
use crate::samples::{naming, SamplePool};
use crate::score::{MusicScore, Score, ScoreBody, ScoreRhythm};

/// One percussion layer. Without a variation the layer is silent.
#[derive(Clone)]
pub struct Rhythm {
    instrument: RhythmInstrument,
    variation: Option<RhythmVariation>,
    duration: NoteDuration,
    volume: f32,
    voice: Option<Arc<dyn Voice>>,
}

impl Rhythm {
    pub fn instrument(&self) -> RhythmInstrument {
        self.instrument
    }

    pub fn variation(&self) -> Option<RhythmVariation> {
        self.variation
    }

    pub fn duration(&self) -> NoteDuration {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn sample_name(&self, tempo: Tempo) -> Option<String> {
        self.variation
            .map(|v| naming::rhythm_name(self.instrument, tempo, v))
    }
}

impl std::fmt::Debug for Rhythm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rhythm")
            .field("instrument", &self.instrument)
            .field("variation", &self.variation)
            .field("volume", &self.volume)
            .finish()
    }
}

pub struct Music {
    name: String,
    track: Track,
    rhythms: Vec<Rhythm>,
    rhythms_on: bool,
    retired: Vec<Arc<dyn Voice>>,
    /// Graphical representation hint carried through the score file.
    representation: Option<i32>,
    looping: bool,
    silent: bool,
    active: bool,
    paused: bool,
    clock: Clock,
    events: Vec<SoundEventKind>,
    last_error: Option<ErrorKind>,
}

impl Music {
    /// Creates a music and loads its instrument's samples at `tempo`.
    pub fn new(
        name: &str,
        tempo: Tempo,
        instrument: Instrument,
        samples: &SamplePool,
    ) -> Result<Music> {
        samples.load_instrument_samples(instrument, tempo)?;
        Ok(Music::empty(name, tempo, instrument))
    }

    /// Creates a music without touching the sample pool.
    pub fn empty(name: &str, tempo: Tempo, instrument: Instrument) -> Music {
        Music {
            name: name.to_string(),
            track: Track::new(instrument, tempo, TimeSignature::FourFour),
            rhythms: Vec::new(),
            rhythms_on: true,
            retired: Vec::new(),
            representation: None,
            looping: false,
            silent: false,
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

    pub fn renamed(&self, name: &str) -> Music {
        let mut copy = self.clone();
        copy.name = name.to_string();
        copy
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn tempo(&self) -> Tempo {
        self.track.tempo()
    }

    pub fn instrument(&self) -> Instrument {
        self.track.instrument()
    }

    pub fn representation(&self) -> Option<i32> {
        self.representation
    }

    pub fn set_representation(&mut self, representation: Option<i32>) {
        self.representation = representation;
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Switches tempo, swapping the instrument's samples and every rhythm
    /// sample for the new tempo's.
    pub fn set_tempo(&mut self, tempo: Tempo, samples: &SamplePool) -> Result<()> {
        let result = self.retempo(tempo, samples);
        record(&mut self.last_error, result)
    }

    fn retempo(&mut self, tempo: Tempo, samples: &SamplePool) -> Result<()> {
        let old = self.tempo();
        if tempo == old {
            return Ok(());
        }
        samples.release_instrument_samples(self.instrument());
        samples.release_pauses(old);
        self.track.set_tempo(tempo);
        let mut result = samples.load_instrument_samples(self.instrument(), tempo);

        for rhythm in self.rhythms.iter() {
            if let Some(name) = rhythm.sample_name(old) {
                samples.release(&name);
            }
            if let Some(variation) = rhythm.variation {
                if let Err(e) = samples.load_rhythm_sample(rhythm.instrument, tempo, variation) {
                    warn!(music = self.name, err = %e, "Unable to reload rhythm sample");
                    result = Err(e);
                }
            }
        }
        debug!(music = self.name, tempo = %tempo, "Tempo changed");
        result
    }

    /// Switches instrument, releasing the old instrument's samples.
    pub fn set_instrument(&mut self, instrument: Instrument, samples: &SamplePool) -> Result<()> {
        let result = if instrument == self.instrument() {
            Ok(())
        } else {
            samples.release_instrument_samples(self.instrument());
            self.track.set_instrument(instrument);
            samples.load_instrument_samples(instrument, self.tempo())
        };
        record(&mut self.last_error, result)
    }

    pub fn intensity(&self) -> f32 {
        self.track.intensity()
    }

    /// Volume of the instrument line.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.track.set_intensity(intensity);
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.track.set_position(position);
        for voice in self.rhythms.iter().filter_map(|r| r.voice.as_ref()) {
            voice.set_position(position);
        }
    }

    pub fn add_note(&mut self, duration: NoteDuration, pitch: Pitch, octave: u8) -> Result<()> {
        let result = self.track.add_note(duration, pitch, octave);
        record(&mut self.last_error, result)
    }

    pub fn delete_last_note(&mut self) -> Result<Note> {
        let result = self.track.delete_last_note();
        record(&mut self.last_error, result)
    }

    pub fn delete_all_notes(&mut self) {
        self.track.delete_all_notes();
    }

    pub fn notes(&self) -> &[Note] {
        self.track.notes()
    }

    pub fn last_note(&self) -> Option<&Note> {
        self.track.last_note()
    }

    pub fn total_notes(&self) -> usize {
        self.track.number_of_notes()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Length of the line in beats. Only the sampled durations count.
    pub fn duration_beats(&self) -> u32 {
        self.notes().iter().map(|n| n.duration().beats()).sum()
    }

    pub fn rhythms(&self) -> Vec<RhythmInstrument> {
        self.rhythms.iter().map(|r| r.instrument).collect()
    }

    pub fn rhythm_layers(&self) -> &[Rhythm] {
        &self.rhythms
    }

    pub fn rhythm_variation(&self, instrument: RhythmInstrument) -> Option<RhythmVariation> {
        self.rhythm(instrument).and_then(|r| r.variation)
    }

    fn rhythm(&self, instrument: RhythmInstrument) -> Option<&Rhythm> {
        self.rhythms.iter().find(|r| r.instrument == instrument)
    }

    /// Adds a rhythm layer, loading its sample when a variation is given.
    pub fn add_rhythm(
        &mut self,
        instrument: RhythmInstrument,
        variation: Option<RhythmVariation>,
        duration: NoteDuration,
        samples: &SamplePool,
    ) -> Result<()> {
        let result = self.push_rhythm(instrument, variation, duration, samples);
        record(&mut self.last_error, result)
    }

    fn push_rhythm(
        &mut self,
        instrument: RhythmInstrument,
        variation: Option<RhythmVariation>,
        duration: NoteDuration,
        samples: &SamplePool,
    ) -> Result<()> {
        if let Some(variation) = variation {
            samples.load_rhythm_sample(instrument, self.tempo(), variation)?;
        }
        self.rhythms.push(Rhythm {
            instrument,
            variation,
            duration,
            volume: 1.0,
            voice: None,
        });
        debug!(music = self.name, rhythm = %instrument, variation = ?variation, "Added rhythm");
        Ok(())
    }

    /// Swaps a layer's variation. `None`, or a variation whose sample can't be
    /// loaded, removes the layer; an instrument without a layer gets one.
    pub fn change_rhythm_variation(
        &mut self,
        instrument: RhythmInstrument,
        variation: Option<RhythmVariation>,
        duration: NoteDuration,
        samples: &SamplePool,
    ) -> Result<()> {
        let Some(index) = self.rhythms.iter().position(|r| r.instrument == instrument) else {
            return self.add_rhythm(instrument, variation, duration, samples);
        };

        let tempo = self.tempo();
        if let Some(name) = self.rhythms[index].sample_name(tempo) {
            samples.release(&name);
        }
        let Some(variation) = variation else {
            self.retire_rhythm(index);
            return Ok(());
        };
        match samples.load_rhythm_sample(instrument, tempo, variation) {
            Ok(_) => {
                let rhythm = &mut self.rhythms[index];
                rhythm.variation = Some(variation);
                rhythm.duration = duration;
                Ok(())
            }
            Err(e) => {
                self.retire_rhythm(index);
                record(&mut self.last_error, Err(e))
            }
        }
    }

    /// Drops a layer. A voice it was playing on goes back to the pool on the
    /// next update or stop.
    fn retire_rhythm(&mut self, index: usize) {
        let rhythm = self.rhythms.remove(index);
        if let Some(voice) = rhythm.voice {
            voice.stop();
            self.retired.push(voice);
        }
    }

    pub fn set_rhythm_volume(&mut self, instrument: RhythmInstrument, volume: f32) {
        if let Some(rhythm) = self.rhythms.iter_mut().find(|r| r.instrument == instrument) {
            rhythm.volume = volume.clamp(0.0, 1.0);
            if let Some(voice) = &rhythm.voice {
                voice.set_gain(rhythm.volume);
            }
        }
    }

    pub fn rhythms_on(&self) -> bool {
        self.rhythms_on
    }

    pub fn set_rhythms_on(&mut self, rhythms_on: bool) {
        self.rhythms_on = rhythms_on;
    }

    /// Same tempo, instrument, notes, and set of active rhythms.
    pub fn compare(&self, other: &Music) -> bool {
        let active = |m: &Music| {
            let mut set: Vec<(RhythmInstrument, RhythmVariation)> = m
                .rhythms
                .iter()
                .filter_map(|r| r.variation.map(|v| (r.instrument, v)))
                .collect();
            set.sort();
            set
        };
        self.tempo() == other.tempo()
            && self.instrument() == other.instrument()
            && self.track.compare(&other.track).is_some()
            && active(self) == active(other)
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

    pub fn percent_played(&self) -> f32 {
        let total = self.track.total_duration_ms();
        if !self.active || total == 0 {
            return 0.0;
        }
        (self.clock.elapsed().as_millis() as f64 / total as f64).min(1.0) as f32
    }

    /// Plays the line on one voice and every active rhythm, looped, on its own.
    pub fn play(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        let result = self.start(ctx, looping, silent);
        record(&mut self.last_error, result)
    }

    fn start(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        if self.active {
            return Err(SoundError::AlreadyPlaying);
        }
        if self.track.is_empty() {
            return Err(SoundError::EmptySound);
        }
        self.looping = looping;
        self.silent = silent;

        if let Err(e) = self.start_line(ctx).and_then(|_| self.start_rhythms(ctx)) {
            self.halt(ctx);
            self.collect_events();
            return Err(e);
        }

        self.active = true;
        self.paused = false;
        self.clock.restart();
        self.collect_events();
        self.push_event(SoundEventKind::SoundPlaying);
        info!(music = self.name, looping, "Music playing");
        Ok(())
    }

    fn start_line(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        let voice = ctx.sources.check_out().ok_or(SoundError::NoVoiceAvailable)?;
        if let Err(e) = self.track.play(voice.clone(), ctx.samples) {
            ctx.sources.check_in(&voice);
            return Err(e);
        }
        Ok(())
    }

    fn start_rhythms(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        if !self.rhythms_on {
            return Ok(());
        }
        let tempo = self.tempo();
        let position = self.track.position();
        for rhythm in self.rhythms.iter_mut() {
            let Some(name) = rhythm.sample_name(tempo) else {
                continue;
            };
            let buffer = ctx.samples.load(&name)?;
            let voice = ctx.sources.check_out().ok_or(SoundError::NoVoiceAvailable)?;
            voice.set_gain(rhythm.volume);
            voice.set_position(position);
            voice.set_looping(true);
            let started = voice.queue(&[buffer]).and_then(|_| voice.play());
            rhythm.voice = Some(voice);
            started?;
        }
        Ok(())
    }

    fn check_in_retired(&mut self, ctx: PlayContext<'_>) {
        for voice in self.retired.drain(..) {
            ctx.sources.check_in(&voice);
        }
    }

    fn halt(&mut self, ctx: PlayContext<'_>) {
        self.check_in_retired(ctx);
        if !self.track.is_stopped() {
            let _ = self.track.stop();
        }
        if let Some(voice) = self.track.release_voice() {
            ctx.sources.check_in(&voice);
        }
        for rhythm in self.rhythms.iter_mut() {
            if let Some(voice) = rhythm.voice.take() {
                voice.stop();
                ctx.sources.check_in(&voice);
            }
        }
    }

    /// Toggles every voice between playing and paused.
    pub fn pause(&mut self) -> Result<()> {
        let result = self.toggle_pause();
        record(&mut self.last_error, result)
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if !self.active {
            return Err(SoundError::AlreadyStopped);
        }
        if !self.track.is_stopped() {
            self.track.pause()?;
        }
        self.paused = !self.paused;
        for voice in self.rhythms.iter().filter_map(|r| r.voice.as_ref()) {
            if self.paused {
                voice.pause()?;
            } else {
                voice.play()?;
            }
        }
        self.collect_events();
        if self.paused {
            self.clock.pause();
            self.push_event(SoundEventKind::SoundPaused);
        } else {
            self.clock.resume();
            self.push_event(SoundEventKind::SoundPlaying);
        }
        Ok(())
    }

    pub fn stop(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        let result = if self.active {
            self.finish(ctx);
            Ok(())
        } else {
            Err(SoundError::AlreadyStopped)
        };
        record(&mut self.last_error, result)
    }

    fn finish(&mut self, ctx: PlayContext<'_>) {
        self.halt(ctx);
        self.active = false;
        self.paused = false;
        self.collect_events();
        self.push_event(SoundEventKind::SoundStopped);
        info!(music = self.name, "Music stopped");
    }

    /// Advances the line. Rhythms keep looping until the line ends for good.
    pub fn update(&mut self, ctx: PlayContext<'_>) -> bool {
        self.check_in_retired(ctx);
        if !self.active || self.paused {
            return false;
        }
        if !self.track.update() {
            self.collect_events();
            return false;
        }
        if let Some(voice) = self.track.release_voice() {
            ctx.sources.check_in(&voice);
        }
        self.collect_events();

        if self.looping {
            match self.start_line(ctx) {
                Ok(()) => {
                    self.clock.restart();
                    self.collect_events();
                    return false;
                }
                Err(e) => {
                    warn!(music = self.name, err = %e, "Unable to restart loop");
                    self.last_error = Some(e.kind());
                }
            }
        }
        self.finish(ctx);
        true
    }

    fn collect_events(&mut self) {
        for event in self.track.drain_events() {
            if !self.silent {
                self.events.push(SoundEventKind::from_track(0, event));
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

    /// The line's notes joined end to end, with every active rhythm tiled
    /// over them and soft-mixed in.
    pub fn data(&self, samples: &SamplePool) -> Result<Vec<i16>> {
        if self.track.is_empty() {
            return Ok(Vec::new());
        }
        let line = self.track.render(samples)?;
        let mut mix = Mixdown::new(line.len());
        mix.add(&line, self.intensity());

        for rhythm in self.rhythms.iter() {
            let Some(name) = rhythm.sample_name(self.tempo()) else {
                continue;
            };
            let buffer = samples.load(&name)?;
            mix.add(buffer.samples(), rhythm.volume);
        }
        Ok(mix.finish())
    }

    pub fn size(&self, samples: &SamplePool) -> Result<usize> {
        self.track.rendered_len(samples)
    }

    pub fn to_score(&self) -> Score {
        Score {
            name: self.name.clone(),
            tempo: self.tempo(),
            duration: None,
            body: ScoreBody::Music(MusicScore {
                instrument: self.instrument(),
                notes: self.notes().to_vec(),
                rhythms: self
                    .rhythms
                    .iter()
                    .map(|r| ScoreRhythm {
                        instrument: r.instrument,
                        variation: r.variation,
                    })
                    .collect(),
                representation: self.representation,
            }),
        }
    }

    /// Builds a music line from its score, loading every sample it needs.
    pub fn from_score(name: &str, score: &Score, samples: &SamplePool) -> Result<Music> {
        let ScoreBody::Music(line) = &score.body else {
            return Err(SoundError::UnsupportedType("sound score as music"));
        };
        let mut music = Music::new(name, score.tempo, line.instrument, samples)?;
        music.representation = line.representation;
        for note in line.notes.iter() {
            music.add_note(note.duration(), note.pitch(), note.octave())?;
        }
        for rhythm in line.rhythms.iter() {
            music.add_rhythm(
                rhythm.instrument,
                rhythm.variation,
                rhythm.instrument.default_duration(),
                samples,
            )?;
        }
        Ok(music)
    }
}

/// Copies the line and layers. The copy is stopped and holds no voices.
impl Clone for Music {
    fn clone(&self) -> Self {
        Music {
            name: self.name.clone(),
            track: self.track.clone(),
            rhythms: self
                .rhythms
                .iter()
                .map(|r| Rhythm {
                    voice: None,
                    ..r.clone()
                })
                .collect(),
            rhythms_on: self.rhythms_on,
            retired: Vec::new(),
            representation: self.representation,
            looping: false,
            silent: false,
            active: false,
            paused: false,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        }
    }
}

impl std::fmt::Debug for Music {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Music")
            .field("name", &self.name)
            .field("track", &self.track)
            .field("rhythms", &self.rhythms)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{mock, SourcePool, VoiceState};
    use crate::testutil::{fixture_len, sample_library};

    struct Harness {
        _library: tempfile::TempDir,
        samples: SamplePool,
        sources: SourcePool,
        device: mock::Device,
    }

    impl Harness {
        fn new() -> Harness {
            let library = sample_library(
                &[Instrument::Flute, Instrument::Piano],
                &[Tempo::Bpm120, Tempo::Bpm60],
                &[RhythmInstrument::Congas, RhythmInstrument::BeatBox],
            );
            let device = mock::Device::get("mock", 22050);
            Harness {
                samples: SamplePool::new(vec![library.path().to_path_buf()]),
                sources: SourcePool::new(Arc::new(device.clone()), 4, 0),
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

    fn music(harness: &Harness) -> Music {
        let mut music = Music::new("tune", Tempo::Bpm120, Instrument::Flute, &harness.samples)
            .unwrap();
        music.add_note(NoteDuration::Crotchet, Pitch::Do, 3).unwrap();
        music.add_note(NoteDuration::Minim, Pitch::Sol, 3).unwrap();
        music
    }

    #[test]
    fn test_new_loads_instrument() {
        let harness = Harness::new();
        music(&harness);
        assert!(harness.samples.contains("2_120_32_3_0.wav"));
        assert!(harness.samples.contains("2_120_32_4_0.wav"));
    }

    #[test]
    fn test_rhythm_variations() {
        let harness = Harness::new();
        let mut music = music(&harness);
        music
            .add_rhythm(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm02),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();
        assert!(harness.samples.contains("2_120_1.wav"));
        assert_eq!(
            music.rhythm_variation(RhythmInstrument::Congas),
            Some(RhythmVariation::Rhythm02)
        );

        music
            .change_rhythm_variation(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm04),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();
        assert!(!harness.samples.contains("2_120_1.wav"));
        assert!(harness.samples.contains("2_120_3.wav"));

        // Unknown layer gets added.
        music
            .change_rhythm_variation(
                RhythmInstrument::BeatBox,
                Some(RhythmVariation::Rhythm10),
                NoteDuration::Breve,
                &harness.samples,
            )
            .unwrap();
        assert_eq!(
            music.rhythms(),
            vec![RhythmInstrument::Congas, RhythmInstrument::BeatBox]
        );

        music
            .change_rhythm_variation(
                RhythmInstrument::Congas,
                None,
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();
        assert_eq!(music.rhythms(), vec![RhythmInstrument::BeatBox]);
        assert!(!harness.samples.contains("2_120_3.wav"));
    }

    #[test]
    fn test_set_tempo_swaps_samples() {
        let harness = Harness::new();
        let mut music = music(&harness);
        music
            .add_rhythm(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm01),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();

        music.set_tempo(Tempo::Bpm60, &harness.samples).unwrap();
        assert_eq!(music.tempo(), Tempo::Bpm60);
        assert!(!harness.samples.contains("2_120_32_3_0.wav"));
        assert!(harness.samples.contains("2_60_32_3_0.wav"));
        assert!(!harness.samples.contains("2_120_0.wav"));
        assert!(harness.samples.contains("2_60_0.wav"));
        assert!(!harness.samples.contains("pause_120_32.wav"));
        assert!(harness.samples.contains("pause_60_32.wav"));

        music
            .set_instrument(Instrument::Piano, &harness.samples)
            .unwrap();
        assert!(!harness.samples.contains("2_60_32_3_0.wav"));
        assert!(harness.samples.contains("1_60_32_3_0.wav"));
    }

    #[test]
    fn test_data_mixes_rhythm_over_line() {
        let harness = Harness::new();
        let mut music = music(&harness);
        let line = music.track().render(&harness.samples).unwrap();
        assert_eq!(music.data(&harness.samples).unwrap(), line);

        music
            .add_rhythm(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm01),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();
        let mixed = music.data(&harness.samples).unwrap();
        assert_eq!(mixed.len(), line.len());
        assert_ne!(mixed, line);
        assert_eq!(music.size(&harness.samples).unwrap(), line.len());
    }

    #[test]
    fn test_play_with_rhythms() {
        let harness = Harness::new();
        let mut music = music(&harness);
        music
            .add_rhythm(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm01),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();

        music.play(harness.ctx(), false, false).unwrap();
        assert_eq!(harness.sources.checked_out_count(), 2);
        let rhythm_voice = music.rhythm_layers()[0].voice.clone().unwrap();
        assert!(rhythm_voice.params().looping);

        music.pause().unwrap();
        assert_eq!(rhythm_voice.state(), VoiceState::Paused);
        music.pause().unwrap();
        assert_eq!(rhythm_voice.state(), VoiceState::Playing);

        let frames = fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim);
        harness.device.advance(frames + 1);
        assert!(music.update(harness.ctx()));
        assert!(music.is_stopped());
        assert_eq!(harness.sources.checked_out_count(), 0);
        assert_eq!(
            music.drain_events().last(),
            Some(&SoundEventKind::SoundStopped)
        );
    }

    #[test]
    fn test_rhythms_off() {
        let harness = Harness::new();
        let mut music = music(&harness);
        music
            .add_rhythm(
                RhythmInstrument::Congas,
                Some(RhythmVariation::Rhythm01),
                NoteDuration::Semibreve,
                &harness.samples,
            )
            .unwrap();
        music.set_rhythms_on(false);
        music.play(harness.ctx(), false, true).unwrap();
        assert_eq!(harness.sources.checked_out_count(), 1);
        music.stop(harness.ctx()).unwrap();
    }

    #[test]
    fn test_compare_and_beats() {
        let harness = Harness::new();
        let a = music(&harness);
        let mut b = a.renamed("copy");
        assert!(a.compare(&b));
        assert_eq!(a.duration_beats(), 3);

        b.add_rhythm(
            RhythmInstrument::Congas,
            Some(RhythmVariation::Rhythm01),
            NoteDuration::Semibreve,
            &harness.samples,
        )
        .unwrap();
        assert!(!a.compare(&b));
    }

    #[test]
    fn test_play_empty() {
        let harness = Harness::new();
        let mut music = Music::empty("none", Tempo::Bpm120, Instrument::Flute);
        assert_eq!(
            music.play(harness.ctx(), false, false).unwrap_err().kind(),
            ErrorKind::EmptySound
        );
        assert_eq!(music.last_error(), Some(ErrorKind::EmptySound));
    }

    #[test]
    fn test_score_conversion() {
        let harness = Harness::new();
        let mut music = music(&harness);
        music.set_representation(Some(1));
        music
            .add_rhythm(
                RhythmInstrument::BeatBox,
                Some(RhythmVariation::Rhythm07),
                NoteDuration::Breve,
                &harness.samples,
            )
            .unwrap();

        let score = music.to_score();
        let copy = Music::from_score("copy", &score, &harness.samples).unwrap();
        assert_eq!(copy.name(), "copy");
        assert_eq!(copy.representation(), Some(1));
        assert!(music.compare(&copy));
        assert_eq!(
            copy.rhythm_layers()[0].duration(),
            NoteDuration::Breve
        );

        let sound = crate::sound::Sound::new("s", Tempo::Bpm120).to_score();
        assert_eq!(
            Music::from_score("s", &sound, &harness.samples)
                .unwrap_err()
                .kind(),
            ErrorKind::UnsupportedType
        );
    }
}
