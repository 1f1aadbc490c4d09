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

//! The process-wide registry of named sounds.
//!
//! The catalog owns the sample pool, the voice pool and every sound object.
//! All operations address sounds by name; the last failure is kept in
//! [Catalog::last_error] as well as being returned.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::audio::{self, Device, SourcePool};
use crate::config::EngineConfig;
use crate::error::{record, Backend, ErrorKind, Result, SoundError};
use crate::export::{self, LameEncoder, Mp3Encoder};
use crate::music::{check_octave, Instrument, NoteDuration, Pitch, Tempo, TimeSignature};
use crate::samples::{naming, SamplePool};
use crate::score;
use crate::sound::{
    EventSink, Music, PlayContext, Sample, Sound, SoundEvent, SoundObject, Stream,
};

static NEXT_NOTE_ID: AtomicU64 = AtomicU64::new(1);

struct Entry {
    object: SoundObject,
    /// Whether the object's events reach subscribers.
    connected: bool,
    /// Dropped from the catalog once it stops.
    transient: bool,
}

impl Entry {
    fn new(object: SoundObject) -> Entry {
        Entry {
            object,
            connected: true,
            transient: false,
        }
    }
}

fn unknown(name: &str) -> SoundError {
    SoundError::UnknownIdentity(name.to_string())
}

fn forward(events: &EventSink, name: &str, entry: &mut Entry) {
    let kinds = entry.object.drain_events();
    if entry.connected {
        events.emit_all(name, kinds);
    }
}

pub struct Catalog {
    config: EngineConfig,
    samples: SamplePool,
    sources: SourcePool,
    sounds: Mutex<HashMap<String, Entry>>,
    events: EventSink,
    intensity: Mutex<f32>,
    encoder: Box<dyn Mp3Encoder>,
    last_error: Mutex<Option<ErrorKind>>,
}

impl Catalog {
    pub fn new(config: EngineConfig, device: Arc<dyn Device>) -> Catalog {
        let pool = config.source_pool();
        let sources = SourcePool::new(device, pool.max_size, pool.start_size);
        info!(
            device = config.device(),
            max_voices = pool.max_size,
            sample_paths = ?config.sample_paths(),
            "Catalog ready"
        );
        Catalog {
            samples: SamplePool::new(config.sample_paths().to_vec()),
            sources,
            sounds: Mutex::new(HashMap::new()),
            events: EventSink::new(),
            intensity: Mutex::new(1.0),
            encoder: Box::new(LameEncoder::new(config.encoder())),
            last_error: Mutex::new(None),
            config,
        }
    }

    /// Opens the configured device and builds a catalog on it.
    pub fn from_config(config: EngineConfig) -> Result<Catalog> {
        let device = audio::get_device(&config)?;
        Ok(Catalog::new(config, device))
    }

    pub fn with_encoder(mut self, encoder: Box<dyn Mp3Encoder>) -> Catalog {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn samples(&self) -> &SamplePool {
        &self.samples
    }

    pub fn sources(&self) -> &SourcePool {
        &self.sources
    }

    pub fn add_sample_path(&self, path: &Path) {
        self.samples.add_search_path(path);
    }

    pub fn add_sample_paths(&self, paths: &[&Path]) {
        self.samples
            .add_search_paths(paths.iter().map(|p| p.to_path_buf()));
    }

    /// Receives every event of connected sounds from now on.
    pub fn subscribe(&self) -> Receiver<SoundEvent> {
        self.events.subscribe()
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        *self.last_error.lock()
    }

    fn ctx(&self) -> PlayContext<'_> {
        PlayContext {
            samples: &self.samples,
            sources: &self.sources,
        }
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        record(&mut self.last_error.lock(), result)
    }

    /// Runs `f` on a registered object and forwards whatever events it raised.
    fn with_entry<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut SoundObject, PlayContext<'_>) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut sounds = self.sounds.lock();
            match sounds.get_mut(name) {
                Some(entry) => {
                    let result = f(&mut entry.object, self.ctx());
                    forward(&self.events, name, entry);
                    result
                }
                None => Err(unknown(name)),
            }
        };
        self.finish(result)
    }

    /// Stops an object that's leaving the catalog.
    fn retire(&self, name: &str, mut entry: Entry) {
        if !entry.object.is_stopped() {
            if let Err(e) = entry.object.stop(self.ctx()) {
                warn!(sound = name, err = %e, "Unable to stop released sound");
            }
        }
        forward(&self.events, name, &mut entry);
    }

    fn register(&self, name: &str, entry: Entry) -> Result<()> {
        let mut sounds = self.sounds.lock();
        if sounds.contains_key(name) {
            return Err(SoundError::NameAlreadyUsed(name.to_string()));
        }
        debug!(sound = name, kind = entry.object.kind_name(), "Registered sound");
        sounds.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sounds.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sounds.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.sounds.lock().len()
    }

    pub fn kind_of(&self, name: &str) -> Result<&'static str> {
        self.with_entry(name, |object, _| Ok(object.kind_name()))
    }

    /// Registers a sound with one track.
    pub fn create_sound(
        &self,
        name: &str,
        tempo: Tempo,
        instrument: Instrument,
        time_signature: TimeSignature,
    ) -> Result<()> {
        let mut sound = Sound::new(name, tempo);
        sound.add_track(instrument, time_signature);
        sound.set_intensity(*self.intensity.lock());
        let result = self.register(name, Entry::new(SoundObject::Composite(sound)));
        self.finish(result)
    }

    /// Registers a music line, loading its instrument's samples.
    pub fn create_music(&self, name: &str, tempo: Tempo, instrument: Instrument) -> Result<()> {
        let result = if self.contains(name) {
            Err(SoundError::NameAlreadyUsed(name.to_string()))
        } else {
            Music::new(name, tempo, instrument, &self.samples).and_then(|mut music| {
                music.set_intensity(*self.intensity.lock());
                self.register(name, Entry::new(SoundObject::Music(music)))
            })
        };
        self.finish(result)
    }

    /// Loads a file under `name` (the path when empty). WAV files become
    /// samples, compressed audio becomes streams, XML is read as a score. An
    /// existing name is left alone unless `overwrite` is set. Unconnected
    /// sounds raise no events.
    pub fn load(&self, path: &Path, name: &str, overwrite: bool, connect: bool) -> Result<()> {
        let result = self.load_file(path, name, overwrite, connect);
        self.finish(result)
    }

    fn load_file(&self, path: &Path, name: &str, overwrite: bool, connect: bool) -> Result<()> {
        let name = if name.is_empty() {
            path.display().to_string()
        } else {
            name.to_string()
        };
        if !overwrite && self.contains(&name) {
            debug!(sound = name, "Already loaded");
            return Ok(());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        // Bare names fall back to the sample search paths.
        let resolve = || self.samples.resolve(&path.to_string_lossy());
        let mut object = match extension.as_str() {
            "wav" => SoundObject::Sample(Sample::load(&name, &resolve()?)?),
            "ogg" | "mp3" | "flac" => {
                if !self.config.streams() {
                    return Err(SoundError::DeviceNotInitialized(Backend::Ogg));
                }
                SoundObject::Stream(Stream::new(&name, &resolve()?)?)
            }
            "xml" => {
                let score = score::read_file(&resolve()?)?;
                if score.is_music() {
                    SoundObject::Music(Music::from_score(&name, &score, &self.samples)?)
                } else {
                    SoundObject::Composite(Sound::from_score(&name, &score)?)
                }
            }
            _ => return Err(SoundError::UnknownExtension(path.to_path_buf())),
        };
        object.set_intensity(*self.intensity.lock());

        let previous = self.sounds.lock().remove(&name);
        if let Some(previous) = previous {
            self.retire(&name, previous);
        }
        info!(sound = name, path = ?path, kind = object.kind_name(), "Loaded sound");
        self.register(
            &name,
            Entry {
                object,
                connected: connect,
                transient: false,
            },
        )
    }

    /// Registers a stopped copy of `from` as `to`.
    pub fn copy_sound(&self, from: &str, to: &str) -> Result<()> {
        let result = {
            let mut sounds = self.sounds.lock();
            if sounds.contains_key(to) {
                Err(SoundError::NameAlreadyUsed(to.to_string()))
            } else {
                match sounds.get(from) {
                    Some(entry) => {
                        let copy = entry.object.renamed(to);
                        sounds.insert(to.to_string(), Entry::new(copy));
                        Ok(())
                    }
                    None => Err(unknown(from)),
                }
            }
        };
        self.finish(result)
    }

    pub fn release_sound(&self, name: &str) -> Result<()> {
        let removed = self.sounds.lock().remove(name);
        let result = match removed {
            Some(entry) => {
                self.retire(name, entry);
                debug!(sound = name, "Released sound");
                Ok(())
            }
            None => Err(unknown(name)),
        };
        self.finish(result)
    }

    pub fn release_all(&self) {
        let drained: Vec<(String, Entry)> = self.sounds.lock().drain().collect();
        for (name, entry) in drained {
            self.retire(&name, entry);
        }
    }

    pub fn play(&self, name: &str, looping: bool, silent: bool) -> Result<()> {
        self.with_entry(name, |object, ctx| object.play(ctx, None, looping, silent))
    }

    pub fn play_track(&self, name: &str, track: usize, looping: bool, silent: bool) -> Result<()> {
        self.with_entry(name, |object, ctx| {
            object.play(ctx, Some(track), looping, silent)
        })
    }

    pub fn pause(&self, name: &str) -> Result<()> {
        self.with_entry(name, |object, _| object.pause())
    }

    pub fn stop(&self, name: &str) -> Result<()> {
        self.with_entry(name, |object, ctx| object.stop(ctx))
    }

    pub fn stop_all(&self) {
        let mut sounds = self.sounds.lock();
        for (name, entry) in sounds.iter_mut() {
            if !entry.object.is_stopped() {
                if let Err(e) = entry.object.stop(self.ctx()) {
                    warn!(sound = name, err = %e, "Unable to stop sound");
                }
            }
            forward(&self.events, name, entry);
        }
    }

    pub fn is_playing(&self, name: &str) -> Result<bool> {
        self.with_entry(name, |object, _| Ok(object.is_playing()))
    }

    pub fn is_paused(&self, name: &str) -> Result<bool> {
        self.with_entry(name, |object, _| Ok(object.is_paused()))
    }

    pub fn is_stopped(&self, name: &str) -> Result<bool> {
        self.with_entry(name, |object, _| Ok(object.is_stopped()))
    }

    pub fn is_empty(&self, name: &str) -> Result<bool> {
        self.with_entry(name, |object, _| Ok(object.is_empty()))
    }

    pub fn percent_played(&self, name: &str) -> Result<f32> {
        self.with_entry(name, |object, _| Ok(object.percent_played()))
    }

    pub fn compare_sound(&self, first: &str, second: &str) -> Result<bool> {
        let result = {
            let sounds = self.sounds.lock();
            match (sounds.get(first), sounds.get(second)) {
                (Some(a), Some(b)) => a.object.compare(&b.object),
                (None, _) => Err(unknown(first)),
                (_, None) => Err(unknown(second)),
            }
        };
        self.finish(result)
    }

    /// Compares two tracks of a sound, giving the shared note count when they
    /// match.
    pub fn compare_track(&self, name: &str, first: usize, second: usize) -> Result<Option<usize>> {
        self.with_entry(name, |object, _| match object {
            SoundObject::Composite(sound) => sound.compare_tracks(first, second),
            _ => Err(SoundError::UnsupportedType("compare_track")),
        })
    }

    /// Writes a sound's score.
    pub fn save(&self, name: &str, path: &Path, overwrite: bool) -> Result<()> {
        self.with_entry(name, |object, _| {
            export::ensure_writable(path, overwrite)?;
            object.save(path)
        })
    }

    /// Renders a sound and writes it as a WAV file.
    pub fn save_wav(&self, name: &str, path: &Path, overwrite: bool) -> Result<()> {
        let default_rate = self.config.sample_rate();
        self.with_entry(name, |object, ctx| {
            export::ensure_writable(path, overwrite)?;
            let data = object.data(ctx.samples)?;
            let rate = object.data_rate(ctx.samples).unwrap_or(default_rate);
            export::write_wav(path, &data, rate)
        })
    }

    pub fn save_track_wav(&self, name: &str, track: usize, path: &Path, overwrite: bool) -> Result<()> {
        let default_rate = self.config.sample_rate();
        self.with_entry(name, |object, ctx| {
            let rate = object.data_rate(ctx.samples).unwrap_or(default_rate);
            let SoundObject::Composite(sound) = object else {
                return Err(SoundError::UnsupportedType("save_track_wav"));
            };
            export::ensure_writable(path, overwrite)?;
            let data = sound.track_data(track, ctx.samples)?;
            export::write_wav(path, &data, rate)
        })
    }

    /// Renders a sound to MP3 through the encoder. The intermediate WAV is
    /// kept unless `delete_wav` is set.
    pub fn save_mp3(
        &self,
        name: &str,
        path: &Path,
        min_bitrate: u32,
        delete_wav: bool,
        overwrite: bool,
    ) -> Result<()> {
        let default_rate = self.config.sample_rate();
        self.with_entry(name, |object, ctx| {
            export::ensure_writable(path, overwrite)?;
            let data = object.data(ctx.samples)?;
            let rate = object.data_rate(ctx.samples).unwrap_or(default_rate);
            export::write_mp3(
                self.encoder.as_ref(),
                path,
                &data,
                rate,
                min_bitrate,
                !delete_wav,
            )
        })
    }

    pub fn intensity(&self) -> f32 {
        *self.intensity.lock()
    }

    /// Sets the volume of every sound, clamped to [0, 1].
    pub fn set_intensity(&self, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        *self.intensity.lock() = intensity;
        for entry in self.sounds.lock().values_mut() {
            entry.object.set_intensity(intensity);
        }
    }

    pub fn set_sound_intensity(&self, name: &str, intensity: f32) -> Result<()> {
        self.with_entry(name, |object, _| {
            object.set_intensity(intensity.clamp(0.0, 1.0));
            Ok(())
        })
    }

    /// Sets the volume of every sound whose name matches a `*`/`?` mask.
    /// Returns how many matched.
    pub fn set_intensity_mask(&self, mask: &str, intensity: f32) -> usize {
        let intensity = intensity.clamp(0.0, 1.0);
        let mut matched = 0;
        for (name, entry) in self.sounds.lock().iter_mut() {
            if naming::wildcard_match(mask, name) {
                entry.object.set_intensity(intensity);
                matched += 1;
            }
        }
        matched
    }

    pub fn intensity_of(&self, name: &str) -> Result<f32> {
        self.with_entry(name, |object, _| Ok(object.intensity()))
    }

    /// Plays one note sample at once. The note is registered under a
    /// generated name, which is returned, and drops out when it ends.
    pub fn play_note(
        &self,
        instrument: Instrument,
        tempo: Tempo,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
        intensity: f32,
    ) -> Result<String> {
        let result = self.start_note(instrument, tempo, duration, pitch, octave, intensity);
        self.finish(result)
    }

    fn start_note(
        &self,
        instrument: Instrument,
        tempo: Tempo,
        duration: NoteDuration,
        pitch: Pitch,
        octave: u8,
        intensity: f32,
    ) -> Result<String> {
        check_octave(octave)?;
        let buffer = self
            .samples
            .load_note(instrument, tempo, duration, octave, pitch)?;
        let name = format!("note#{}", NEXT_NOTE_ID.fetch_add(1, Ordering::Relaxed));
        let mut sample = Sample::from_buffer(&name, buffer);
        sample.set_intensity(intensity);
        sample.play(self.ctx(), false, true)?;
        self.register(
            &name,
            Entry {
                object: SoundObject::Sample(sample),
                connected: false,
                transient: true,
            },
        )?;
        Ok(name)
    }

    /// Scoped mutable access to a multi-track sound.
    pub fn with_sound<T>(&self, name: &str, f: impl FnOnce(&mut Sound) -> Result<T>) -> Result<T> {
        self.with_entry(name, |object, _| match object {
            SoundObject::Composite(sound) => f(sound),
            _ => Err(SoundError::UnsupportedType("with_sound")),
        })
    }

    /// Scoped mutable access to a music line and the sample pool it loads from.
    pub fn with_music<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Music, &SamplePool) -> Result<T>,
    ) -> Result<T> {
        self.with_entry(name, |object, ctx| match object {
            SoundObject::Music(music) => f(music, ctx.samples),
            _ => Err(SoundError::UnsupportedType("with_music")),
        })
    }

    /// Polls every sound once. Returns how many stopped during this tick.
    pub fn tick(&self) -> usize {
        let mut sounds = self.sounds.lock();
        let mut ended = 0;
        let mut finished_notes = Vec::new();
        for (name, entry) in sounds.iter_mut() {
            if entry.object.update(self.ctx()) {
                ended += 1;
                debug!(sound = name, "Sound ended");
            }
            forward(&self.events, name, entry);
            if entry.transient && entry.object.is_stopped() {
                finished_notes.push(name.clone());
            }
        }
        for name in finished_notes {
            sounds.remove(&name);
        }
        ended
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::audio::mock;
    use crate::export::tests::CopyEncoder;
    use crate::music::{RhythmInstrument, RhythmVariation};
    use crate::sound::SoundEventKind;
    use crate::testutil::{fixture_len, sample_library, write_sample};

    struct Harness {
        library: tempfile::TempDir,
        device: mock::Device,
        catalog: Catalog,
    }

    impl Harness {
        fn new() -> Harness {
            Harness::with_config(|c| c)
        }

        fn with_config(f: impl FnOnce(EngineConfig) -> EngineConfig) -> Harness {
            let library = sample_library(
                &[Instrument::Flute, Instrument::Piano],
                &[Tempo::Bpm120],
                &[RhythmInstrument::Congas],
            );
            let device = mock::Device::get("mock", 22050);
            let config = f(EngineConfig::default()
                .with_sample_paths(vec![library.path().to_path_buf()])
                .with_source_pool(4, 0));
            let catalog = Catalog::new(config, Arc::new(device.clone()))
                .with_encoder(Box::new(CopyEncoder::default()));
            Harness {
                library,
                device,
                catalog,
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.library.path().join(name)
        }

        fn demo(&self) {
            self.catalog
                .create_sound("demo", Tempo::Bpm120, Instrument::Flute, TimeSignature::FourFour)
                .unwrap();
            self.catalog
                .with_sound("demo", |s| {
                    s.add_note(0, NoteDuration::Crotchet, Pitch::Do, 3)?;
                    s.add_note(0, NoteDuration::Crotchet, Pitch::Re, 3)?;
                    s.add_note(0, NoteDuration::Minim, Pitch::Pause, 0)
                })
                .unwrap();
        }
    }

    #[test]
    fn test_names_are_unique() {
        let harness = Harness::new();
        harness.demo();
        let err = harness
            .catalog
            .create_sound("demo", Tempo::Bpm60, Instrument::Piano, TimeSignature::ThreeFour)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NameAlreadyUsed);
        assert_eq!(harness.catalog.last_error(), Some(ErrorKind::NameAlreadyUsed));
        assert_eq!(
            harness
                .catalog
                .create_music("demo", Tempo::Bpm120, Instrument::Flute)
                .unwrap_err()
                .kind(),
            ErrorKind::NameAlreadyUsed
        );
        assert_eq!(
            harness.catalog.play("nothing", false, false).unwrap_err().kind(),
            ErrorKind::UnknownIdentity
        );
    }

    #[test]
    fn test_play_until_stopped() {
        let harness = Harness::new();
        harness.demo();
        let events = harness.catalog.subscribe();

        harness.catalog.play("demo", false, false).unwrap();
        assert!(harness.catalog.is_playing("demo").unwrap());
        assert!(!harness.catalog.is_empty("demo").unwrap());

        let frames = 2 * fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim);
        harness.device.advance(frames + 1);
        assert_eq!(harness.catalog.tick(), 1);
        assert!(harness.catalog.is_stopped("demo").unwrap());
        assert_eq!(harness.catalog.sources().checked_out_count(), 0);

        let received: Vec<SoundEvent> = events.try_iter().collect();
        assert!(received.iter().all(|e| e.sound == "demo"));
        assert!(received
            .iter()
            .any(|e| e.kind == SoundEventKind::SoundPlaying));
        assert_eq!(
            received.last().map(|e| e.kind),
            Some(SoundEventKind::SoundStopped)
        );
    }

    #[test]
    fn test_load_dispatch() {
        let harness = Harness::with_config(|c| c.with_streams(false));
        let wav = harness.path("beep.wav");
        write_sample(&wav, &[10; 50], 22050).unwrap();

        harness.catalog.load(&wav, "beep", false, true).unwrap();
        assert_eq!(harness.catalog.kind_of("beep").unwrap(), "sample");

        // Existing name without overwrite is left alone.
        harness
            .catalog
            .load(Path::new("/nonexistent/other.wav"), "beep", false, true)
            .unwrap();

        harness.catalog.load(&wav, "", false, true).unwrap();
        assert!(harness.catalog.contains(&wav.display().to_string()));

        let kind = |path: &str| {
            harness
                .catalog
                .load(Path::new(path), "x", true, true)
                .unwrap_err()
                .kind()
        };
        assert_eq!(kind("/tmp/song.ogg"), ErrorKind::DeviceNotInitialized);
        assert_eq!(kind("/tmp/song.aiff"), ErrorKind::UnknownExtension);
        assert_eq!(kind("/nonexistent/song.xml"), ErrorKind::FileNotFound);
        assert_eq!(kind("missing.wav"), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_load_from_search_path() {
        let harness = Harness::new();
        write_sample(&harness.path("beep.wav"), &[7; 40], 22050).unwrap();
        harness.demo();
        harness.catalog.save("demo", &harness.path("demo.xml"), false).unwrap();

        harness
            .catalog
            .load(Path::new("beep.wav"), "beep", false, true)
            .unwrap();
        assert_eq!(harness.catalog.kind_of("beep").unwrap(), "sample");
        assert!(!harness.catalog.is_empty("beep").unwrap());

        harness
            .catalog
            .load(Path::new("demo.xml"), "", false, true)
            .unwrap();
        assert!(harness.catalog.compare_sound("demo", "demo.xml").unwrap());
    }

    #[test]
    fn test_score_files_round_trip() {
        let harness = Harness::new();
        harness.demo();
        let path = harness.path("demo.xml");
        harness.catalog.save("demo", &path, false).unwrap();
        assert_eq!(
            harness.catalog.save("demo", &path, false).unwrap_err().kind(),
            ErrorKind::FileExists
        );

        harness.catalog.load(&path, "again", false, true).unwrap();
        assert!(harness.catalog.compare_sound("demo", "again").unwrap());

        harness
            .catalog
            .create_music("tune", Tempo::Bpm120, Instrument::Piano)
            .unwrap();
        harness
            .catalog
            .with_music("tune", |m, samples| {
                m.add_note(NoteDuration::Minim, Pitch::La, 3)?;
                m.add_rhythm(
                    RhythmInstrument::Congas,
                    Some(RhythmVariation::Rhythm02),
                    NoteDuration::Semibreve,
                    samples,
                )
            })
            .unwrap();
        let tune = harness.path("tune.xml");
        harness.catalog.save("tune", &tune, false).unwrap();
        harness.catalog.load(&tune, "tune2", false, true).unwrap();
        assert_eq!(harness.catalog.kind_of("tune2").unwrap(), "music");
        assert!(harness.catalog.compare_sound("tune", "tune2").unwrap());
        assert_eq!(
            harness.catalog.compare_sound("tune", "demo").unwrap_err().kind(),
            ErrorKind::UnsupportedType
        );
    }

    #[test]
    fn test_exports() {
        let harness = Harness::new();
        harness.demo();

        let wav = harness.path("demo-out.wav");
        harness.catalog.save_wav("demo", &wav, false).unwrap();
        let reader = hound::WavReader::open(&wav).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(
            reader.len() as usize,
            2 * fixture_len(NoteDuration::Crotchet) + fixture_len(NoteDuration::Minim)
        );

        let track = harness.path("track.wav");
        harness.catalog.save_track_wav("demo", 0, &track, false).unwrap();
        assert_eq!(
            harness
                .catalog
                .save_track_wav("demo", 3, &harness.path("none.wav"), false)
                .unwrap_err()
                .kind(),
            ErrorKind::UnknownIdentity
        );

        let mp3 = harness.path("demo.mp3");
        harness.catalog.save_mp3("demo", &mp3, 128, true, false).unwrap();
        assert!(mp3.exists());
        assert!(!export::intermediate_wav(&mp3).exists());
    }

    #[test]
    fn test_intensity() {
        let harness = Harness::new();
        harness.demo();
        harness.catalog.copy_sound("demo", "demo-copy").unwrap();
        harness
            .catalog
            .create_sound("other", Tempo::Bpm120, Instrument::Piano, TimeSignature::FourFour)
            .unwrap();

        harness.catalog.set_intensity(3.0);
        assert_eq!(harness.catalog.intensity(), 1.0);
        assert_eq!(harness.catalog.set_intensity_mask("demo*", 0.5), 2);
        assert_eq!(harness.catalog.intensity_of("demo-copy").unwrap(), 0.5);
        assert_eq!(harness.catalog.intensity_of("other").unwrap(), 1.0);

        harness.catalog.set_sound_intensity("other", -1.0).unwrap();
        assert_eq!(harness.catalog.intensity_of("other").unwrap(), 0.0);
    }

    #[test]
    fn test_play_note_is_transient() {
        let harness = Harness::new();
        let name = harness
            .catalog
            .play_note(
                Instrument::Flute,
                Tempo::Bpm120,
                NoteDuration::Crotchet,
                Pitch::Mi,
                4,
                0.8,
            )
            .unwrap();
        assert!(harness.catalog.is_playing(&name).unwrap());

        harness.device.advance(fixture_len(NoteDuration::Crotchet) + 1);
        harness.catalog.tick();
        assert!(!harness.catalog.contains(&name));
        assert_eq!(harness.catalog.sources().checked_out_count(), 0);

        assert_eq!(
            harness
                .catalog
                .play_note(
                    Instrument::Flute,
                    Tempo::Bpm120,
                    NoteDuration::Crotchet,
                    Pitch::Mi,
                    7,
                    1.0
                )
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidOctave
        );
    }

    #[test]
    fn test_release_and_copy() {
        let harness = Harness::new();
        harness.demo();
        harness.catalog.play("demo", true, true).unwrap();
        harness.catalog.copy_sound("demo", "copy").unwrap();
        assert!(harness.catalog.is_stopped("copy").unwrap());
        assert_eq!(
            harness.catalog.copy_sound("missing", "x").unwrap_err().kind(),
            ErrorKind::UnknownIdentity
        );

        harness.catalog.release_sound("demo").unwrap();
        assert_eq!(harness.catalog.sources().checked_out_count(), 0);
        assert_eq!(
            harness.catalog.release_sound("demo").unwrap_err().kind(),
            ErrorKind::UnknownIdentity
        );

        harness.catalog.release_all();
        assert_eq!(harness.catalog.count(), 0);
    }

    #[test]
    fn test_scoped_access_checks_kind() {
        let harness = Harness::new();
        harness
            .catalog
            .create_music("tune", Tempo::Bpm120, Instrument::Flute)
            .unwrap();
        assert_eq!(
            harness
                .catalog
                .with_sound("tune", |s| Ok(s.number_of_tracks()))
                .unwrap_err()
                .kind(),
            ErrorKind::UnsupportedType
        );
        assert_eq!(
            harness
                .catalog
                .compare_track("tune", 0, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::UnsupportedType
        );
    }
}
