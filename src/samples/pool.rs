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

//! Sample loading and caching keyed by canonical sample name.
//!
//! Entries are handed out as `Arc` snapshots, so a release only drops the
//! pool's reference; anything already rendering keeps its data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::buffer::SampleBuffer;
use super::naming;
use crate::error::{Result, SoundError};
use crate::music::{
    Instrument, Note, NoteDuration, Octave, Pitch, RhythmInstrument, RhythmVariation, Tempo,
};

/// Cache of decoded samples plus the directories they are searched in.
pub struct SamplePool {
    samples: RwLock<HashMap<String, Arc<SampleBuffer>>>,
    search_paths: RwLock<Vec<PathBuf>>,
}

impl SamplePool {
    pub fn new(search_paths: Vec<PathBuf>) -> SamplePool {
        SamplePool {
            samples: RwLock::new(HashMap::new()),
            search_paths: RwLock::new(search_paths),
        }
    }

    pub fn add_search_path(&self, path: impl Into<PathBuf>) {
        self.search_paths.write().push(path.into());
    }

    pub fn add_search_paths(&self, paths: impl IntoIterator<Item = PathBuf>) {
        self.search_paths.write().extend(paths);
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.search_paths.read().clone()
    }

    /// Finds the file behind a name. An existing path wins, then each search
    /// directory in order.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        self.search_paths
            .read()
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| SoundError::FileNotFound(name.to_string()))
    }

    /// Loads a sample, returning the cached entry if there is one.
    pub fn load(&self, name: &str) -> Result<Arc<SampleBuffer>> {
        if let Some(sample) = self.get(name) {
            debug!(sample = name, "Using cached sample");
            return Ok(sample);
        }
        self.reload(name)
    }

    /// Loads a sample from disk, replacing any cached entry.
    pub fn reload(&self, name: &str) -> Result<Arc<SampleBuffer>> {
        let path = self.resolve(name)?;
        let sample = Arc::new(SampleBuffer::from_wav(name, &path)?);

        info!(
            sample = name,
            path = ?path,
            sample_rate = sample.sample_rate(),
            duration_ms = sample.duration().as_millis(),
            "Sample loaded"
        );

        self.samples
            .write()
            .insert(name.to_string(), sample.clone());
        Ok(sample)
    }

    /// Inserts an already decoded sample under its own name.
    pub fn insert(&self, sample: SampleBuffer) -> Arc<SampleBuffer> {
        let sample = Arc::new(sample);
        self.samples
            .write()
            .insert(sample.name().to_string(), sample.clone());
        sample
    }

    pub fn get(&self, name: &str) -> Option<Arc<SampleBuffer>> {
        self.samples.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.read().contains_key(name)
    }

    /// Drops the entry for `name`. Returns false if it wasn't loaded.
    pub fn release(&self, name: &str) -> bool {
        let released = self.samples.write().remove(name).is_some();
        if released {
            debug!(sample = name, "Sample released");
        }
        released
    }

    /// Drops every entry whose name matches `mask`. Returns how many went.
    pub fn release_by_mask(&self, mask: &str) -> usize {
        let mut samples = self.samples.write();
        let before = samples.len();
        samples.retain(|name, _| !naming::wildcard_match(mask, name));
        let released = before - samples.len();
        debug!(mask, released, "Samples released by mask");
        released
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    /// Sorted names of every loaded sample.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.samples.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn total_memory_usage(&self) -> usize {
        self.samples.read().values().map(|s| s.byte_len()).sum()
    }

    pub fn load_note(
        &self,
        instrument: Instrument,
        tempo: Tempo,
        duration: NoteDuration,
        octave: u8,
        pitch: Pitch,
    ) -> Result<Arc<SampleBuffer>> {
        self.load(&naming::note_name(instrument, tempo, duration, octave, pitch))
    }

    /// The sample that plays `note` for this instrument and tempo.
    pub fn note_sample(
        &self,
        instrument: Instrument,
        tempo: Tempo,
        note: &Note,
    ) -> Result<Arc<SampleBuffer>> {
        self.load_note(instrument, tempo, note.duration(), note.octave(), note.pitch())
    }

    pub fn release_note(
        &self,
        instrument: Instrument,
        tempo: Tempo,
        duration: NoteDuration,
        octave: u8,
        pitch: Pitch,
    ) -> bool {
        self.release(&naming::note_name(instrument, tempo, duration, octave, pitch))
    }

    /// Loads the seven natural pitches of one octave plus the matching pause.
    /// On failure every sample this call loaded is released again.
    pub fn load_principal_notes(
        &self,
        octave: Octave,
        duration: NoteDuration,
        tempo: Tempo,
        instrument: Instrument,
    ) -> Result<()> {
        let names = Pitch::PRINCIPAL
            .iter()
            .map(|pitch| naming::note_name(instrument, tempo, duration, octave.number(), *pitch))
            .chain(std::iter::once(naming::pause_name(tempo, duration)));
        self.load_batch(names)
    }

    /// Loads everything a music line needs for one instrument and tempo.
    pub fn load_instrument_samples(&self, instrument: Instrument, tempo: Tempo) -> Result<()> {
        let mut result = Ok(());
        for duration in NoteDuration::SAMPLED {
            if let Err(e) = self.load_principal_notes(Octave::C3, duration, tempo, instrument) {
                result = Err(e);
            }
        }
        for duration in NoteDuration::SAMPLED {
            if let Err(e) =
                self.load_note(instrument, tempo, duration, Octave::C4.number(), Pitch::Do)
            {
                result = Err(e);
            }
        }

        if let Err(e) = &result {
            warn!(
                instrument = instrument.value(),
                tempo = tempo.bpm(),
                err = %e,
                "Instrument sample set is incomplete"
            );
        }
        result
    }

    /// Releases the note samples of an instrument, leaving rhythm samples and pauses.
    pub fn release_instrument_samples(&self, instrument: Instrument) -> usize {
        self.release_by_mask(&naming::instrument_mask(instrument))
    }

    /// Releases the pauses a music line loads for one tempo.
    pub fn release_pauses(&self, tempo: Tempo) -> usize {
        NoteDuration::SAMPLED
            .iter()
            .filter(|&&duration| self.release(&naming::pause_name(tempo, duration)))
            .count()
    }

    pub fn load_rhythm_sample(
        &self,
        instrument: RhythmInstrument,
        tempo: Tempo,
        variation: RhythmVariation,
    ) -> Result<Arc<SampleBuffer>> {
        self.load(&naming::rhythm_name(instrument, tempo, variation))
    }

    pub fn release_rhythm_sample(
        &self,
        instrument: RhythmInstrument,
        tempo: Tempo,
        variation: RhythmVariation,
    ) -> bool {
        self.release(&naming::rhythm_name(instrument, tempo, variation))
    }

    /// Loads every variation of a rhythm instrument at this tempo, all or nothing.
    pub fn load_rhythm_set(&self, instrument: RhythmInstrument, tempo: Tempo) -> Result<()> {
        let names = instrument
            .variations()
            .map(|variation| naming::rhythm_name(instrument, tempo, variation));
        self.load_batch(names)
    }

    fn load_batch(&self, names: impl Iterator<Item = String>) -> Result<()> {
        let mut loaded_here = Vec::new();
        for name in names {
            if self.contains(&name) {
                continue;
            }
            match self.load(&name) {
                Ok(_) => loaded_here.push(name),
                Err(e) => {
                    warn!(sample = name, err = %e, "Batch load failed, rolling back");
                    for loaded in loaded_here.iter() {
                        self.release(loaded);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SamplePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplePool")
            .field("cached_samples", &self.len())
            .field("search_paths", &self.search_paths.read().len())
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}
