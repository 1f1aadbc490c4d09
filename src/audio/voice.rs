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

//! In-process voice that renders queued sample buffers into output blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Voice, VoiceParams, VoiceState};
use crate::error::Result;
use crate::samples::SampleBuffer;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

struct Inner {
    params: VoiceParams,
    state: VoiceState,
    queue: Vec<Arc<SampleBuffer>>,
    /// Index of the buffer being played.
    current: usize,
    /// Frame position within the current buffer.
    cursor: f64,
    processed: usize,
}

impl Inner {
    fn rewind(&mut self) {
        self.current = 0;
        self.cursor = 0.0;
        self.processed = 0;
    }
}

pub struct SoftwareVoice {
    id: u64,
    inner: Mutex<Inner>,
}

impl SoftwareVoice {
    pub fn new() -> SoftwareVoice {
        SoftwareVoice {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst),
            inner: Mutex::new(Inner {
                params: VoiceParams::default(),
                state: VoiceState::Initial,
                queue: Vec::new(),
                current: 0,
                cursor: 0.0,
                processed: 0,
            }),
        }
    }

    /// Adds this voice's audio into `out`, an interleaved block of `channels`
    /// channels at `out_rate`. Finished buffers bump the processed counter;
    /// a looping voice wraps to the top of its queue instead.
    pub fn render(&self, out: &mut [f32], out_rate: u32, channels: u16) {
        let mut inner = self.inner.lock();
        if inner.state != VoiceState::Playing || out_rate == 0 {
            return;
        }

        let channels = usize::from(channels.max(1));
        let gain = inner.params.gain;
        let pitch = f64::from(inner.params.pitch.max(0.0));

        for frame in out.chunks_mut(channels) {
            // Skip finished buffers, wrapping at most once per frame.
            let mut wrapped = false;
            loop {
                if inner.current >= inner.queue.len() {
                    if inner.params.looping && !wrapped && !inner.queue.is_empty() {
                        inner.current = 0;
                        inner.cursor = 0.0;
                        wrapped = true;
                        continue;
                    }
                    if !inner.params.looping {
                        inner.state = VoiceState::Stopped;
                    }
                    return;
                }
                let frames = inner.queue[inner.current].frames();
                if (inner.cursor as usize) < frames {
                    break;
                }
                inner.cursor -= frames as f64;
                inner.current += 1;
                if !inner.params.looping {
                    inner.processed += 1;
                }
            }

            let buffer = inner.queue[inner.current].clone();
            let source_channels = usize::from(buffer.channels());
            let index = inner.cursor as usize * source_channels;
            let samples = buffer.samples();
            for (channel, out) in frame.iter_mut().enumerate() {
                let sample = samples[index + channel.min(source_channels - 1)];
                *out += f32::from(sample) / 32768.0 * gain;
            }

            inner.cursor += f64::from(buffer.sample_rate()) * pitch / f64::from(out_rate);
        }
    }
}

impl Default for SoftwareVoice {
    fn default() -> Self {
        SoftwareVoice::new()
    }
}

impl Voice for SoftwareVoice {
    fn id(&self) -> u64 {
        self.id
    }

    fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.params = VoiceParams::default();
        inner.state = VoiceState::Initial;
        inner.queue.clear();
        inner.rewind();
    }

    fn set_gain(&self, gain: f32) {
        self.inner.lock().params.gain = gain.max(0.0);
    }

    fn set_pitch(&self, pitch: f32) {
        self.inner.lock().params.pitch = pitch;
    }

    fn set_position(&self, position: [f32; 3]) {
        self.inner.lock().params.position = position;
    }

    fn set_rolloff(&self, rolloff: f32) {
        self.inner.lock().params.rolloff = rolloff;
    }

    fn set_looping(&self, looping: bool) {
        self.inner.lock().params.looping = looping;
    }

    fn queue(&self, buffers: &[Arc<SampleBuffer>]) -> Result<()> {
        self.inner.lock().queue.extend(buffers.iter().cloned());
        Ok(())
    }

    fn unqueue_processed(&self) -> usize {
        let mut inner = self.inner.lock();
        if inner.params.looping {
            return 0;
        }
        let done = inner.current.min(inner.queue.len());
        inner.queue.drain(..done);
        inner.current -= done;
        done
    }

    fn unqueue_all(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.rewind();
    }

    fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != VoiceState::Paused {
            inner.rewind();
        }
        inner.state = VoiceState::Playing;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == VoiceState::Playing {
            inner.state = VoiceState::Paused;
        }
        Ok(())
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state == VoiceState::Initial {
            return;
        }
        inner.state = VoiceState::Stopped;
        let remaining = inner.queue.len().saturating_sub(inner.current);
        inner.processed += remaining;
        inner.current = inner.queue.len();
    }

    fn buffers_processed(&self) -> usize {
        self.inner.lock().processed
    }

    fn queued(&self) -> usize {
        self.inner.lock().queue.len()
    }

    fn state(&self) -> VoiceState {
        self.inner.lock().state
    }

    fn params(&self) -> VoiceParams {
        self.inner.lock().params
    }
}
