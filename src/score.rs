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

//! Score files: the XML form of composed sounds.
//!
//! A multi-track sound is a `<music>` root holding one `<melody>` per track:
//!
//! ```xml
//! <music name="demo" tempo="120" duration="4000">
//!   <melody instrument="2" compass="44">
//!     <note height="60" duration="32"/>
//!     <note height="-1" duration="64" octave="3"/>
//!   </melody>
//! </music>
//! ```
//!
//! A note's height is `pitch + (octave + 2) * 12`; pauses are `-1`. A music
//! line carries `kind="music"` on the root, raw pitch values plus an `octave`
//! on each note, and `<rhythm>` layers after its melody.

use std::path::Path;

use crate::error::{Result, SoundError};
use crate::music::{Instrument, Note, RhythmInstrument, RhythmVariation, Tempo, TimeSignature};

mod reader;
mod writer;

pub use reader::from_str;
pub use writer::to_string;

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub name: String,
    pub tempo: Tempo,
    /// Fixed target duration in milliseconds, when the author set one.
    pub duration: Option<u32>,
    pub body: ScoreBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreBody {
    Sound(Vec<ScoreTrack>),
    Music(MusicScore),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTrack {
    pub instrument: Instrument,
    pub time_signature: TimeSignature,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicScore {
    pub instrument: Instrument,
    pub notes: Vec<Note>,
    pub rhythms: Vec<ScoreRhythm>,
    pub representation: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRhythm {
    pub instrument: RhythmInstrument,
    pub variation: Option<RhythmVariation>,
}

impl Score {
    pub fn is_music(&self) -> bool {
        matches!(self.body, ScoreBody::Music(_))
    }
}

pub fn read_file(path: &Path) -> Result<Score> {
    if !path.is_file() {
        return Err(SoundError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    from_str(&contents)
}

pub fn write_file(score: &Score, path: &Path) -> Result<()> {
    std::fs::write(path, to_string(score)?)?;
    Ok(())
}
