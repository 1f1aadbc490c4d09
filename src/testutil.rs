// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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

//! Fixtures shared by the test modules.

use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::music::{Instrument, NoteDuration, Pitch, RhythmInstrument, Tempo};
use crate::samples::naming;

/// Rate of every fixture sample.
pub const FIXTURE_RATE: u32 = 22050;

/// Durations the fixture library carries notes for.
pub const FIXTURE_DURATIONS: [NoteDuration; 7] = [
    NoteDuration::Semiquaver,
    NoteDuration::Quaver,
    NoteDuration::Crotchet,
    NoteDuration::CrotchetDotted,
    NoteDuration::Minim,
    NoteDuration::MinimDotted,
    NoteDuration::Semibreve,
];

/// Writes a mono 16-bit WAV file.
pub fn write_sample(path: &Path, samples: &[i16], sample_rate: u32) -> hound::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()
}

/// Frames in a fixture sample of the given duration.
pub fn fixture_len(duration: NoteDuration) -> usize {
    duration.value() as usize * 10
}

fn fixture_samples(duration: NoteDuration, seed: i16) -> Vec<i16> {
    (0..fixture_len(duration))
        .map(|i| ((i % 64) as i16 - 32) * 100 + seed)
        .collect()
}

/// Builds a directory holding every note sample of the given instruments,
/// the pauses, and every rhythm variation, for each tempo.
pub fn sample_library(
    instruments: &[Instrument],
    tempos: &[Tempo],
    rhythms: &[RhythmInstrument],
) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for &tempo in tempos {
        for &duration in FIXTURE_DURATIONS.iter() {
            let name = naming::pause_name(tempo, duration);
            write_sample(&dir.path().join(name), &vec![0; fixture_len(duration)], FIXTURE_RATE)
                .unwrap();
        }

        for &instrument in instruments {
            for &duration in FIXTURE_DURATIONS.iter() {
                for octave in 3..=4u8 {
                    for &pitch in Pitch::ALL.iter().filter(|p| !p.is_pause()) {
                        let name = naming::note_name(instrument, tempo, duration, octave, pitch);
                        let seed = (pitch.value() * 10 + i32::from(octave)) as i16;
                        write_sample(
                            &dir.path().join(name),
                            &fixture_samples(duration, seed),
                            FIXTURE_RATE,
                        )
                        .unwrap();
                    }
                }
            }
        }

        for &rhythm in rhythms {
            let duration = rhythm.default_duration();
            for variation in rhythm.variations() {
                let name = naming::rhythm_name(rhythm, tempo, variation);
                write_sample(
                    &dir.path().join(name),
                    &fixture_samples(duration, variation.value() as i16),
                    FIXTURE_RATE,
                )
                .unwrap();
            }
        }
    }
    dir
}

/// Waits for `predicate` to hold, backing off between checks. Panics with
/// `error_msg` after ten seconds.
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    let mut tick = Duration::from_millis(5);
    let timeout = Duration::from_secs(10);

    while !predicate() {
        if start.elapsed() > timeout {
            panic!("{}", error_msg);
        }
        thread::sleep(tick);
        tick = (tick * 2).min(Duration::from_millis(100));
    }
}
