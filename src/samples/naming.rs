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

//! Canonical sample file names.

use crate::music::{Instrument, NoteDuration, Pitch, RhythmInstrument, RhythmVariation, Tempo};

/// Name of the sample for one note. Pauses don't depend on the instrument,
/// octave or pitch.
pub fn note_name(
    instrument: Instrument,
    tempo: Tempo,
    duration: NoteDuration,
    octave: u8,
    pitch: Pitch,
) -> String {
    if pitch.is_pause() {
        return pause_name(tempo, duration);
    }
    format!("{}_{}_{}_{}_{}.wav", instrument, tempo, duration, octave, pitch)
}

pub fn pause_name(tempo: Tempo, duration: NoteDuration) -> String {
    format!("pause_{}_{}.wav", tempo, duration)
}

pub fn rhythm_name(instrument: RhythmInstrument, tempo: Tempo, variation: RhythmVariation) -> String {
    format!("{}_{}_{}.wav", instrument, tempo, variation)
}

/// Mask matching every note sample of an instrument. Rhythm names have two
/// fewer fields and never match.
pub fn instrument_mask(instrument: Instrument) -> String {
    format!("{}_*_*_*_*.wav", instrument)
}

/// Matches a whole name against a wildcard pattern with `*` and `?`.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            // Let the last star swallow one more character.
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
