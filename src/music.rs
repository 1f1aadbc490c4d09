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

//! Musical values: notes, durations, pitches and the closed sets of tempos,
//! instruments and rhythm patterns the sample library is recorded in.

pub mod misc;
mod note;
mod types;

pub use note::{check_octave, decoded_octave, Note, MAX_OCTAVE, MIN_OCTAVE};
pub use types::{
    Instrument, NoteDuration, Octave, Pitch, RhythmInstrument, RhythmVariation, Tempo,
    TimeSignature,
};

/// Semitones per octave.
pub const NOTES_PER_OCTAVE: i32 = 12;

/// Duration units in a semibreve.
pub const UNIT_TIME_DEFAULT: u32 = 128;

/// Variations recorded for most rhythm instruments.
pub const RHYTHM_VARIATIONS: usize = 5;

/// Variations recorded for the beat box.
pub const RHYTHM_VARIATIONS_BEAT_BOX: usize = 10;
