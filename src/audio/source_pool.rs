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

//! Bounded pool of playback voices.
//!
//! Every voice the pool created is either available or checked out. Running
//! out of voices is an ordinary outcome: `check_out` returns `None` at once.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Device, Voice};

struct Slots {
    available: VecDeque<Arc<dyn Voice>>,
    checked_out: Vec<Arc<dyn Voice>>,
}

pub struct SourcePool {
    device: Arc<dyn Device>,
    max_size: usize,
    slots: Mutex<Slots>,
}

impl SourcePool {
    /// Creates a pool and pre-creates up to `start_size` voices.
    pub fn new(device: Arc<dyn Device>, max_size: usize, start_size: usize) -> SourcePool {
        let mut available = VecDeque::new();
        for _ in 0..start_size.min(max_size) {
            match device.create_voice() {
                Ok(voice) => available.push_back(voice),
                Err(e) => {
                    warn!(err = %e, created = available.len(), "Unable to pre-create voice");
                    break;
                }
            }
        }

        SourcePool {
            device,
            max_size,
            slots: Mutex::new(Slots {
                available,
                checked_out: Vec::new(),
            }),
        }
    }

    /// Takes a voice from the pool, creating one if there is room.
    pub fn check_out(&self) -> Option<Arc<dyn Voice>> {
        let mut slots = self.slots.lock();

        let voice = match slots.available.pop_front() {
            Some(voice) => voice,
            None => {
                if slots.checked_out.len() >= self.max_size {
                    debug!(max_size = self.max_size, "Source pool exhausted");
                    return None;
                }
                match self.device.create_voice() {
                    Ok(voice) => voice,
                    Err(e) => {
                        warn!(err = %e, "Unable to create voice");
                        return None;
                    }
                }
            }
        };

        debug!(voice = voice.id(), "Voice checked out");
        slots.checked_out.push(voice.clone());
        Some(voice)
    }

    /// Resets a voice and returns it to the pool. Voices the pool didn't hand
    /// out are ignored.
    pub fn check_in(&self, voice: &Arc<dyn Voice>) {
        let mut slots = self.slots.lock();
        let Some(index) = slots
            .checked_out
            .iter()
            .position(|candidate| candidate.id() == voice.id())
        else {
            return;
        };

        let voice = slots.checked_out.swap_remove(index);
        voice.reset();
        debug!(voice = voice.id(), "Voice checked in");
        slots.available.push_back(voice);
    }

    pub fn checked_out_count(&self) -> usize {
        self.slots.lock().checked_out.len()
    }

    pub fn available_count(&self) -> usize {
        self.slots.lock().available.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl std::fmt::Debug for SourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("SourcePool")
            .field("available", &slots.available.len())
            .field("checked_out", &slots.checked_out.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}
