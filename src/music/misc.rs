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

//! Helpers for turning MIDI keys and measured lengths into note values.

use midly::num::u7;

use super::{NoteDuration, Pitch, Tempo, NOTES_PER_OCTAVE};

/// Default tolerance when matching a measured length to a duration class.
pub const DEFAULT_DEVIATION_MS: f64 = 100.0;

/// Candidate durations, shortest first. Each one is twice the previous length.
const CANDIDATES: [NoteDuration; 7] = [
    NoteDuration::Semiquaver,
    NoteDuration::Quaver,
    NoteDuration::CrotchetDotted,
    NoteDuration::Minim,
    NoteDuration::Semibreve,
    NoteDuration::Breve,
    NoteDuration::Longa,
];

const PITCH_NAMES: [&str; 12] = [
    "do", "do#", "re", "re#", "mi", "fa", "fa#", "sol", "sol#", "la", "la#", "si",
];

/// Maps a MIDI key to a pitch class. Key zero is a pause.
pub fn midi_to_pitch(key: u7) -> Pitch {
    let key = i32::from(key.as_int());
    if key == 0 {
        return Pitch::Pause;
    }
    // The remainder is always in 0..12.
    Pitch::try_from(key % NOTES_PER_OCTAVE).unwrap_or(Pitch::Pause)
}

/// Names the pitch class of a MIDI key.
pub fn midi_note_name(key: u7) -> &'static str {
    let key = usize::from(key.as_int());
    if key == 0 {
        return "pause";
    }
    PITCH_NAMES[key % PITCH_NAMES.len()]
}

/// Guesses the duration class of a note that lasted `seconds` at `tempo`.
///
/// Lengths between two candidates resolve to the dotted form of the shorter one,
/// which isn't always a recorded duration; those return `None`.
pub fn duration_from_seconds(
    seconds: f64,
    tempo: Tempo,
    deviation_ms: f64,
) -> Option<NoteDuration> {
    let measured = (seconds * 1000.0).trunc();
    let base = NoteDuration::Quaver.value() * 120 / NoteDuration::Semibreve.value();
    let mut check = f64::from(base) / f64::from(tempo.bpm()) * 1000.0;

    for (i, candidate) in CANDIDATES.iter().enumerate() {
        if measured + deviation_ms > check && measured - deviation_ms < check {
            return Some(*candidate);
        }
        if measured < check {
            if i == 0 {
                return Some(CANDIDATES[0]);
            }
            let shorter = CANDIDATES[i - 1].value();
            return NoteDuration::try_from(shorter + shorter / 2).ok();
        }
        check *= 2.0;
    }

    None
}

/// A readable name for a duration class.
pub fn duration_name(duration: NoteDuration) -> &'static str {
    match duration {
        NoteDuration::Longa => "longa",
        NoteDuration::Breve => "breve",
        NoteDuration::SemibreveDotted => "dotted semibreve",
        NoteDuration::Semibreve => "semibreve",
        NoteDuration::MinimDotted => "dotted minim",
        NoteDuration::Minim => "minim",
        NoteDuration::CrotchetDotted => "dotted crotchet",
        NoteDuration::Crotchet => "crotchet",
        NoteDuration::QuaverHalf => "quaver and a half",
        NoteDuration::Quaver => "quaver",
        NoteDuration::Semiquaver => "semiquaver",
        NoteDuration::Demisemiquaver => "demisemiquaver",
        NoteDuration::Hemidemisemiquaver => "hemidemisemiquaver",
        NoteDuration::Semihemidemisemiquaver => "semihemidemisemiquaver",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_pitch() {
        assert_eq!(midi_to_pitch(u7::new(0)), Pitch::Pause);
        assert_eq!(midi_to_pitch(u7::new(60)), Pitch::Do);
        assert_eq!(midi_to_pitch(u7::new(71)), Pitch::Si);
        assert_eq!(midi_to_pitch(u7::new(62)), Pitch::Re);
    }

    #[test]
    fn test_midi_note_name() {
        assert_eq!(midi_note_name(u7::new(0)), "pause");
        assert_eq!(midi_note_name(u7::new(61)), "do#");
        assert_eq!(midi_note_name(u7::new(67)), "sol");
    }

    #[test]
    fn test_duration_from_seconds() {
        // At 120 bpm the first check point is 125ms, then 250, 500, 1000...
        let tempo = Tempo::Bpm120;
        assert_eq!(
            duration_from_seconds(0.125, tempo, DEFAULT_DEVIATION_MS),
            Some(NoteDuration::Semiquaver)
        );
        assert_eq!(
            duration_from_seconds(0.5, tempo, DEFAULT_DEVIATION_MS),
            Some(NoteDuration::CrotchetDotted)
        );
        assert_eq!(
            duration_from_seconds(0.01, tempo, 1.0),
            Some(NoteDuration::Semiquaver)
        );
        // Between 250 and 500 with a tight window: dotted quaver.
        assert_eq!(
            duration_from_seconds(0.4, tempo, 1.0),
            Some(NoteDuration::QuaverHalf)
        );
        assert_eq!(duration_from_seconds(60.0, tempo, 1.0), None);
    }

    #[test]
    fn test_duration_name() {
        assert_eq!(duration_name(NoteDuration::MinimDotted), "dotted minim");
        assert_eq!(duration_name(NoteDuration::Crotchet), "crotchet");
    }
}
