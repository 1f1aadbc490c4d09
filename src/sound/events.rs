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
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

/// Lifecycle notifications raised by a track, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    Playing,
    Paused,
    Stopped,
    NotePlaying(usize),
    NoteStopped(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEventKind {
    SoundPlaying,
    SoundPaused,
    SoundStopped,
    TrackPlaying(usize),
    TrackPaused(usize),
    TrackStopped(usize),
    NotePlaying { track: usize, note: usize },
    NoteStopped { track: usize, note: usize },
}

impl SoundEventKind {
    /// Lifts a track event into the sound's event space.
    pub fn from_track(track: usize, event: TrackEvent) -> SoundEventKind {
        match event {
            TrackEvent::Playing => SoundEventKind::TrackPlaying(track),
            TrackEvent::Paused => SoundEventKind::TrackPaused(track),
            TrackEvent::Stopped => SoundEventKind::TrackStopped(track),
            TrackEvent::NotePlaying(note) => SoundEventKind::NotePlaying { track, note },
            TrackEvent::NoteStopped(note) => SoundEventKind::NoteStopped { track, note },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEvent {
    pub sound: String,
    pub kind: SoundEventKind,
}

/// Fans sound events out to every live subscriber.
#[derive(Clone, Default)]
pub struct EventSink {
    subscribers: Arc<Mutex<Vec<Sender<SoundEvent>>>>,
}

impl EventSink {
    pub fn new() -> EventSink {
        EventSink::default()
    }

    pub fn subscribe(&self) -> Receiver<SoundEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn emit(&self, sound: &str, kind: SoundEventKind) {
        let event = SoundEvent {
            sound: sound.to_string(),
            kind,
        };
        // Dropped receivers unsubscribe.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn emit_all(&self, sound: &str, kinds: impl IntoIterator<Item = SoundEventKind>) {
        for kind in kinds {
            self.emit(sound, kind);
        }
    }
}
