// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, span, Level};

use crate::catalog::Catalog;
use crate::error::Result;

/// Represents the current run state.
#[derive(PartialEq)]
enum RunState {
    Running,
    Stopped,
}

/// Shared between the scheduler and its worker so a stop request wakes the
/// worker mid-interval.
#[derive(Clone)]
struct StopHandle {
    state: Arc<Mutex<RunState>>,
    condvar: Arc<Condvar>,
}

impl StopHandle {
    fn new() -> StopHandle {
        StopHandle {
            state: Arc::new(Mutex::new(RunState::Running)),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn is_stopped(&self) -> bool {
        *self.state.lock() == RunState::Stopped
    }

    /// Sleeps for up to `interval`. Returns true if stopped in the meantime.
    fn wait(&self, interval: Duration) -> bool {
        let mut state = self.state.lock();
        if *state == RunState::Running {
            self.condvar.wait_for(&mut state, interval);
        }
        *state == RunState::Stopped
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        if *state == RunState::Running {
            *state = RunState::Stopped;
            self.condvar.notify_all();
        }
    }
}

/// Polls every sound of a catalog on a fixed interval from a background
/// thread. Dropping the scheduler stops it.
pub struct Scheduler {
    handle: StopHandle,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(catalog: Arc<Catalog>, interval: Duration) -> Result<Scheduler> {
        let handle = StopHandle::new();
        let worker = {
            let handle = handle.clone();
            thread::Builder::new()
                .name("melodia-scheduler".to_string())
                .spawn(move || {
                    let span = span!(Level::INFO, "scheduler");
                    let _enter = span.enter();
                    info!(?interval, "Scheduler started");
                    loop {
                        let ended = catalog.tick();
                        if ended > 0 {
                            debug!(ended, "Sounds ended");
                        }
                        if handle.wait(interval) {
                            break;
                        }
                    }
                    info!("Scheduler stopped");
                })?
        };
        Ok(Scheduler {
            handle,
            worker: Some(worker),
        })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_stopped()
    }

    /// Stops the worker and waits for it to exit.
    pub fn stop(&mut self) {
        self.handle.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Scheduler thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
