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

//! Closed sets of musical values. Every value carries the numeric code used in
//! sample names and score files; parsing accepts either the code or the name.

use std::{fmt, str::FromStr};

use crate::error::{Result, SoundError};

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $err:expr,
        { $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The numeric code of this value.
            pub fn value(self) -> i32 {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = SoundError;

            fn try_from(code: i32) -> Result<Self> {
                $(
                    if code == $value {
                        return Ok($name::$variant);
                    }
                )+
                Err(($err)(code.to_string()))
            }
        }

        impl FromStr for $name {
            type Err = SoundError;

            fn from_str(s: &str) -> Result<Self> {
                let trimmed = s.trim();
                if let Ok(code) = trimmed.parse::<i32>() {
                    return $name::try_from(code);
                }
                let wanted = normalize(trimmed);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(&format!("{:?}", v)) == wanted)
                    .ok_or_else(|| ($err)(trimmed.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.value())
            }
        }
    };
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

coded_enum!(
    /// Duration class of a note, in 1/128ths of a semibreve.
    NoteDuration, SoundError::UnknownDuration, {
        Longa = 512,
        Breve = 256,
        SemibreveDotted = 192,
        Semibreve = 128,
        MinimDotted = 96,
        Minim = 64,
        CrotchetDotted = 48,
        Crotchet = 32,
        QuaverHalf = 24,
        Quaver = 16,
        Semiquaver = 8,
        Demisemiquaver = 4,
        Hemidemisemiquaver = 2,
        Semihemidemisemiquaver = 1,
    }
);

impl NoteDuration {
    /// Durations that have an instrument sample set.
    pub const SAMPLED: [NoteDuration; 4] = [
        NoteDuration::Crotchet,
        NoteDuration::Minim,
        NoteDuration::MinimDotted,
        NoteDuration::Semibreve,
    ];

    /// Length in crotchet beats, for the durations a music line accepts.
    pub fn beats(self) -> u32 {
        match self {
            NoteDuration::Semibreve => 4,
            NoteDuration::MinimDotted => 3,
            NoteDuration::Minim => 2,
            NoteDuration::Crotchet => 1,
            _ => 0,
        }
    }
}

coded_enum!(
    /// Pitch class of a note. `Pause` is silence.
    Pitch, SoundError::UnknownNote, {
        Pause = -1,
        Do = 0,
        ReFlat = 1,
        Re = 2,
        MiFlat = 3,
        Mi = 4,
        Fa = 5,
        SolFlat = 6,
        Sol = 7,
        LaFlat = 8,
        La = 9,
        SiFlat = 10,
        Si = 11,
    }
);

impl Pitch {
    /// The natural pitches loaded for every sampled duration.
    pub const PRINCIPAL: [Pitch; 7] = [
        Pitch::Do,
        Pitch::Re,
        Pitch::Mi,
        Pitch::Fa,
        Pitch::Sol,
        Pitch::La,
        Pitch::Si,
    ];

    pub fn is_pause(self) -> bool {
        self == Pitch::Pause
    }
}

coded_enum!(
    /// Tempo in beats per minute.
    Tempo, SoundError::UnknownTempo, {
        Bpm60 = 60,
        Bpm120 = 120,
        Bpm160 = 160,
        Bpm200 = 200,
    }
);

impl Tempo {
    pub fn bpm(self) -> u32 {
        self.value() as u32
    }
}

coded_enum!(
    /// Melodic instruments with recorded sample sets.
    Instrument, SoundError::UnknownInstrument, {
        Piano = 1,
        Flute = 2,
        Violin = 3,
        Xylophone = 4,
        Trumpet = 5,
    }
);

coded_enum!(
    /// Time signature encoded as `numerator * 10 + denominator`.
    TimeSignature, |v: String| SoundError::Parse(format!("unknown time signature: {}", v)), {
        TwoFour = 24,
        ThreeFour = 34,
        FourFour = 44,
    }
);

impl TimeSignature {
    pub fn numerator(self) -> u32 {
        (self.value() / 10) as u32
    }

    pub fn denominator(self) -> u32 {
        (self.value() % 10) as u32
    }

    /// Duration units in one beat of this signature.
    pub fn unit_time(self) -> u32 {
        super::UNIT_TIME_DEFAULT / self.denominator()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::FourFour
    }
}

coded_enum!(
    /// Octaves with recorded samples.
    Octave, SoundError::UnknownOctave, {
        C3 = 3,
        C4 = 4,
    }
);

impl Octave {
    pub fn number(self) -> u8 {
        self.value() as u8
    }
}

coded_enum!(
    /// Percussion instruments used by rhythm layers.
    RhythmInstrument, SoundError::UnknownRhythm, {
        ChineseBox = 0,
        BassDrum = 1,
        Congas = 2,
        Tambourine = 3,
        Triangle = 4,
        BeatBox = 5,
    }
);

impl RhythmInstrument {
    /// Number of recorded variations for this instrument.
    pub fn variation_count(self) -> usize {
        match self {
            RhythmInstrument::BeatBox => super::RHYTHM_VARIATIONS_BEAT_BOX,
            _ => super::RHYTHM_VARIATIONS,
        }
    }

    /// Length of one pattern of this instrument.
    pub fn default_duration(self) -> NoteDuration {
        match self {
            RhythmInstrument::BeatBox => NoteDuration::Breve,
            _ => NoteDuration::Semibreve,
        }
    }

    /// The variations recorded for this instrument.
    pub fn variations(self) -> impl Iterator<Item = RhythmVariation> {
        RhythmVariation::ALL
            .iter()
            .copied()
            .take(self.variation_count())
    }
}

coded_enum!(
    /// A recorded rhythm pattern.
    RhythmVariation, SoundError::UnknownVariation, {
        Rhythm01 = 0,
        Rhythm02 = 1,
        Rhythm03 = 2,
        Rhythm04 = 3,
        Rhythm05 = 4,
        Rhythm06 = 5,
        Rhythm07 = 6,
        Rhythm08 = 7,
        Rhythm09 = 8,
        Rhythm10 = 9,
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_codes() {
        assert_eq!(NoteDuration::SemibreveDotted.value(), 192);
        assert_eq!(Pitch::Pause.value(), -1);
        assert_eq!(Pitch::Si.value(), 11);
        assert_eq!(Tempo::Bpm160.to_string(), "160");
        assert_eq!(Instrument::Flute.value(), 2);
        assert_eq!(RhythmVariation::Rhythm10.value(), 9);
    }

    #[test]
    fn test_try_from_unknown() {
        assert_eq!(
            Tempo::try_from(90).unwrap_err().kind(),
            ErrorKind::UnknownTempo
        );
        assert_eq!(
            NoteDuration::try_from(3).unwrap_err().kind(),
            ErrorKind::UnknownDuration
        );
        assert_eq!(Pitch::try_from(12).unwrap_err().kind(), ErrorKind::UnknownNote);
        assert_eq!(
            Octave::try_from(5).unwrap_err().kind(),
            ErrorKind::UnknownOctave
        );
        assert_eq!(
            RhythmInstrument::try_from(6).unwrap_err().kind(),
            ErrorKind::UnknownRhythm
        );
        assert_eq!(
            RhythmVariation::try_from(10).unwrap_err().kind(),
            ErrorKind::UnknownVariation
        );
        assert_eq!(
            Instrument::try_from(0).unwrap_err().kind(),
            ErrorKind::UnknownInstrument
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("120".parse::<Tempo>().unwrap(), Tempo::Bpm120);
        assert_eq!("flute".parse::<Instrument>().unwrap(), Instrument::Flute);
        assert_eq!(
            "minim_dotted".parse::<NoteDuration>().unwrap(),
            NoteDuration::MinimDotted
        );
        assert_eq!("Sol".parse::<Pitch>().unwrap(), Pitch::Sol);
        assert_eq!("beat-box".parse::<RhythmInstrument>().unwrap(), RhythmInstrument::BeatBox);
        assert!("kazoo".parse::<Instrument>().is_err());
    }

    #[test]
    fn test_time_signature() {
        let sig = TimeSignature::ThreeFour;
        assert_eq!(sig.numerator(), 3);
        assert_eq!(sig.denominator(), 4);
        assert_eq!(sig.unit_time(), 32);
        assert_eq!(TimeSignature::TwoFour.unit_time(), 32);
        assert_eq!(
            TimeSignature::try_from(68).unwrap_err().kind(),
            ErrorKind::ParseError
        );
    }

    #[test]
    fn test_rhythm_variations() {
        assert_eq!(RhythmInstrument::Congas.variations().count(), 5);
        assert_eq!(RhythmInstrument::BeatBox.variations().count(), 10);
        assert_eq!(
            RhythmInstrument::BeatBox.default_duration(),
            NoteDuration::Breve
        );
        assert_eq!(
            RhythmInstrument::Triangle.default_duration(),
            NoteDuration::Semibreve
        );
    }

    #[test]
    fn test_beats() {
        assert_eq!(NoteDuration::Semibreve.beats(), 4);
        assert_eq!(NoteDuration::MinimDotted.beats(), 3);
        assert_eq!(NoteDuration::Minim.beats(), 2);
        assert_eq!(NoteDuration::Crotchet.beats(), 1);
        assert_eq!(NoteDuration::Quaver.beats(), 0);
    }
}
