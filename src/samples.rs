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

//! Pre-rendered note and rhythm samples.
//!
//! This module provides:
//! - Canonical sample naming from musical parameters
//! - WAV decoding into shared 16-bit buffers
//! - A search-path backed cache with batch loads that roll back on failure

mod buffer;
pub mod naming;
mod pool;

pub use buffer::SampleBuffer;
pub use pool::SamplePool;
