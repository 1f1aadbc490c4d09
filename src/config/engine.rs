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
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ConfigError;

const DEFAULT_DEVICE: &str = "mock";
const DEFAULT_SAMPLE_RATE: u32 = 22050;
const DEFAULT_TICK_INTERVAL: &str = "20ms";
const DEFAULT_ENCODER: &str = "lame";

/// Prefix of the environment variables that override file settings, e.g.
/// `MELODIA_DEVICE` or `MELODIA_SOURCE_POOL__MAX_SIZE`.
const ENV_PREFIX: &str = "MELODIA";

/// Sizing of the voice pool.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SourcePoolConfig {
    /// Voices that may be checked out at once.
    pub max_size: usize,

    /// Voices created up front.
    pub start_size: usize,
}

impl Default for SourcePoolConfig {
    fn default() -> Self {
        SourcePoolConfig {
            max_size: 8,
            start_size: 4,
        }
    }
}

/// A YAML representation of the engine configuration.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// The output device: `mock`, `default`, or a device name.
    device: String,

    /// Directories searched, in order, for sample files.
    sample_paths: Vec<PathBuf>,

    /// Rate of exported and generated audio.
    sample_rate: u32,

    source_pool: SourcePoolConfig,

    /// How often the scheduler polls playing sounds.
    tick_interval: String,

    /// Whether compressed files can be streamed.
    streams: bool,

    /// External MP3 encoder command.
    encoder: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            device: DEFAULT_DEVICE.to_string(),
            sample_paths: Vec::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            source_pool: SourcePoolConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL.to_string(),
            streams: true,
            encoder: DEFAULT_ENCODER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for the given device with defaults elsewhere.
    pub fn new(device: &str) -> EngineConfig {
        EngineConfig {
            device: device.to_string(),
            ..Default::default()
        }
    }

    /// Loads the configuration from an optional YAML file, then applies
    /// `MELODIA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sample_paths"),
            )
            .build()?
            .try_deserialize::<EngineConfig>()?;
        config.validate()?;
        debug!(config = ?config, "Loaded engine configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.tick_interval()?;
        if self.source_pool.start_size > self.source_pool.max_size {
            return Err(ConfigError::SourcePool {
                start: self.source_pool.start_size,
                max: self.source_pool.max_size,
            });
        }
        Ok(())
    }

    /// Renders the effective configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn sample_paths(&self) -> &[PathBuf] {
        &self.sample_paths
    }

    pub fn with_sample_paths(mut self, paths: Vec<PathBuf>) -> EngineConfig {
        self.sample_paths = paths;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn source_pool(&self) -> &SourcePoolConfig {
        &self.source_pool
    }

    pub fn with_source_pool(mut self, max_size: usize, start_size: usize) -> EngineConfig {
        self.source_pool = SourcePoolConfig {
            max_size,
            start_size,
        };
        self
    }

    /// Returns the scheduler tick interval (default: 20ms).
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        DurationString::from_string(self.tick_interval.clone())
            .map(Into::into)
            .map_err(|e| ConfigError::Duration {
                field: "tick_interval",
                value: self.tick_interval.clone(),
                reason: e.to_string(),
            })
    }

    pub fn streams(&self) -> bool {
        self.streams
    }

    pub fn with_streams(mut self, streams: bool) -> EngineConfig {
        self.streams = streams;
        self
    }

    pub fn encoder(&self) -> &str {
        &self.encoder
    }
}
