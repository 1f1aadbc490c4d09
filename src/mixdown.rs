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

//! Offline soft-mixing of PCM layers into one mono buffer.
//!
//! Samples are scaled into the unit interval, blended pairwise with a curve
//! that multiplies quiet signals and screens loud ones, then scaled back to
//! 16 bits. Layers shorter than the mix are tiled.

/// Maps a gained 16-bit sample into [0, 1].
#[inline]
pub fn to_unit(sample: i16, gain: f32) -> f64 {
    (f64::from(sample) * f64::from(gain) + 32768.0) / 65536.0
}

#[inline]
pub fn from_unit(value: f64) -> i16 {
    (value * 65536.0 - 32768.0)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Blends two unit-interval values.
#[inline]
pub fn soft_mix(fa: f64, fb: f64) -> f64 {
    if fa < 0.5 || fb < 0.5 {
        2.0 * fa * fb
    } else {
        2.0 * (fa + fb) - 2.0 * fa * fb - 1.0
    }
}

/// Repeats `layer` until it covers `len` samples, cutting the last copy short.
pub fn tile(layer: &[i16], len: usize) -> impl Iterator<Item = i16> + '_ {
    layer.iter().copied().cycle().take(if layer.is_empty() { 0 } else { len })
}

/// Running mix of a fixed length. The first layer seeds the buffer; its gain
/// is applied when the next layer folds in, or by [Mixdown::finish].
pub struct Mixdown {
    data: Vec<i16>,
    seed_gain: Option<f32>,
    layers: usize,
}

impl Mixdown {
    pub fn new(len: usize) -> Mixdown {
        Mixdown {
            data: vec![0; len],
            seed_gain: None,
            layers: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Adds a layer. Empty layers are skipped.
    pub fn add(&mut self, layer: &[i16], gain: f32) {
        if layer.is_empty() {
            return;
        }
        let len = self.data.len();
        if self.layers == 0 {
            for (out, sample) in self.data.iter_mut().zip(tile(layer, len)) {
                *out = sample;
            }
            self.seed_gain = Some(gain);
        } else {
            let seed_gain = self.seed_gain.take().unwrap_or(1.0);
            for (out, sample) in self.data.iter_mut().zip(tile(layer, len)) {
                let fa = to_unit(*out, seed_gain);
                let fb = to_unit(sample, gain);
                *out = from_unit(soft_mix(fa, fb));
            }
        }
        self.layers += 1;
    }

    pub fn finish(mut self) -> Vec<i16> {
        if let Some(gain) = self.seed_gain.take() {
            for sample in self.data.iter_mut() {
                *sample = from_unit(to_unit(*sample, gain));
            }
        }
        self.data
    }
}

/// Mixes `layers` (with gains) to the length of the longest one.
pub fn mix_layers<'a>(layers: impl IntoIterator<Item = (&'a [i16], f32)>) -> Vec<i16> {
    let layers: Vec<(&[i16], f32)> = layers.into_iter().collect();
    let len = layers.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let mut mix = Mixdown::new(len);
    for (layer, gain) in layers {
        mix.add(layer, gain);
    }
    mix.finish()
}
