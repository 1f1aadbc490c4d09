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
use std::fmt;

use super::{NoteDuration, Pitch, NOTES_PER_OCTAVE};
use crate::error::{Result, SoundError};

pub const MIN_OCTAVE: u8 = 3;
pub const MAX_OCTAVE: u8 = 4;

/// Octave used for pauses read from a score that doesn't name one.
const DEFAULT_PAUSE_OCTAVE: u8 = 3;

/// Validates a note octave. Zero means unspecified.
pub fn check_octave(octave: u8) -> Result<()> {
    if octave == 0 || (MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
        Ok(())
    } else {
        Err(SoundError::InvalidOctave(octave))
    }
}

/// Octave read from a file. Out of range values don't resolve to a sample set.
pub fn decoded_octave(octave: u8) -> Result<u8> {
    check_octave(octave).map_err(|_| SoundError::UnknownOctave(octave.to_string()))?;
    Ok(octave)
}

/// A single musical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    duration: NoteDuration,
    pitch: Pitch,
    octave: u8,
}

impl Note {
    pub fn new(duration: NoteDuration, pitch: Pitch, octave: u8) -> Note {
        Note {
            duration,
            pitch,
            octave,
        }
    }

    pub fn duration(&self) -> NoteDuration {
        self.duration
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    pub fn is_pause(&self) -> bool {
        self.pitch.is_pause()
    }

    /// The score encoding of this note: pitch plus two octaves above its own,
    /// or -1 for a pause.
    pub fn height(&self) -> i32 {
        if self.is_pause() {
            -1
        } else {
            self.pitch.value() + (i32::from(self.octave) + 2) * NOTES_PER_OCTAVE
        }
    }

    /// Decodes a score height. Non-positive heights are pauses at `pause_octave`
    /// (octave 3 when absent).
    pub fn from_height(
        height: i32,
        duration: NoteDuration,
        pause_octave: Option<u8>,
    ) -> Result<Note> {
        if height <= 0 {
            let octave = decoded_octave(pause_octave.unwrap_or(DEFAULT_PAUSE_OCTAVE))?;
            return Ok(Note::new(duration, Pitch::Pause, octave));
        }

        let octave = height / NOTES_PER_OCTAVE - 2;
        let octave = u8::try_from(octave)
            .map_err(|_| SoundError::UnknownOctave(octave.to_string()))?;
        let octave = decoded_octave(octave)?;
        let pitch = Pitch::try_from(height % NOTES_PER_OCTAVE)?;
        Ok(Note::new(duration, pitch, octave))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} (octave {})",
            self.duration, self.pitch, self.octave
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_check_octave() {
        assert!(check_octave(0).is_ok());
        assert!(check_octave(3).is_ok());
        assert!(check_octave(4).is_ok());
        assert_eq!(check_octave(2).unwrap_err().kind(), ErrorKind::InvalidOctave);
        assert_eq!(check_octave(5).unwrap_err().kind(), ErrorKind::InvalidOctave);
    }

    #[test]
    fn test_equality() {
        let a = Note::new(NoteDuration::Crotchet, Pitch::Do, 3);
        assert_eq!(a, Note::new(NoteDuration::Crotchet, Pitch::Do, 3));
        assert_ne!(a, Note::new(NoteDuration::Crotchet, Pitch::Do, 4));
        assert_ne!(a, Note::new(NoteDuration::Minim, Pitch::Do, 3));
        assert_ne!(a, Note::new(NoteDuration::Crotchet, Pitch::Re, 3));
    }

    #[test]
    fn test_height() {
        let note = Note::new(NoteDuration::Crotchet, Pitch::Re, 3);
        assert_eq!(note.height(), 2 + 5 * 12);
        let decoded = Note::from_height(note.height(), NoteDuration::Crotchet, None).unwrap();
        assert_eq!(decoded, note);

        let pause = Note::new(NoteDuration::Minim, Pitch::Pause, 0);
        assert_eq!(pause.height(), -1);
        assert_eq!(
            Note::from_height(-1, NoteDuration::Minim, Some(0)).unwrap(),
            pause
        );
        assert_eq!(
            Note::from_height(0, NoteDuration::Minim, None).unwrap().octave(),
            3
        );
    }

    #[test]
    fn test_height_out_of_range() {
        // Octave 6.
        let result = Note::from_height(8 * 12, NoteDuration::Crotchet, None);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnknownOctave);
        let result = Note::from_height(-1, NoteDuration::Crotchet, Some(7));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnknownOctave);
    }
}
