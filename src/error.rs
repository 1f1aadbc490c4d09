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
use std::{fmt, path::PathBuf};

/// The backend a sound object depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The audio output device.
    Audio,
    /// The compressed stream decoder.
    Ogg,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Audio => write!(f, "audio"),
            Backend::Ogg => write!(f, "ogg"),
        }
    }
}

/// Errors produced by the sound engine.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("{0} is not implemented for this sound type")]
    NotImplemented(&'static str),

    #[error("unknown sound, track or sample: {0}")]
    UnknownIdentity(String),

    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    #[error("invalid octave {0}")]
    InvalidOctave(u8),

    #[error("invalid note position {0}")]
    InvalidPosition(usize),

    #[error("sound is empty")]
    EmptySound,

    #[error("track {0} is empty")]
    EmptyTrack(usize),

    #[error("no note at index {0}")]
    NoteNotFound(usize),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown file extension: {}", .0.display())]
    UnknownExtension(PathBuf),

    #[error("name already used: {0}")]
    NameAlreadyUsed(String),

    #[error("{0} backend is not initialized")]
    DeviceNotInitialized(Backend),

    #[error("already playing")]
    AlreadyPlaying,

    #[error("already stopped")]
    AlreadyStopped,

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("no voice available")]
    NoVoiceAvailable,

    #[error("{0} is not supported by this sound type")]
    UnsupportedType(&'static str),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file already exists: {}", .0.display())]
    FileExists(PathBuf),

    #[error("unknown tempo: {0}")]
    UnknownTempo(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("unknown note: {0}")]
    UnknownNote(String),

    #[error("unknown duration: {0}")]
    UnknownDuration(String),

    #[error("unknown octave: {0}")]
    UnknownOctave(String),

    #[error("unknown rhythm instrument: {0}")]
    UnknownRhythm(String),

    #[error("unknown rhythm variation: {0}")]
    UnknownVariation(String),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("stream decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("encoder failed: {0}")]
    Encoder(String),
}

/// Payload-free classification of a [SoundError], recorded by objects as their last error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotImplemented,
    UnknownIdentity,
    FileError,
    InvalidOctave,
    InvalidPosition,
    EmptySound,
    EmptyTrack,
    NoteNotFound,
    ParseError,
    UnknownExtension,
    NameAlreadyUsed,
    DeviceNotInitialized,
    AlreadyPlaying,
    AlreadyStopped,
    AudioDeviceError,
    NoVoiceAvailable,
    UnsupportedType,
    FileNotFound,
    FileExists,
    UnknownTempo,
    UnknownInstrument,
    UnknownNote,
    UnknownDuration,
    UnknownOctave,
    UnknownRhythm,
    UnknownVariation,
    EncoderError,
}

impl SoundError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SoundError::NotImplemented(_) => ErrorKind::NotImplemented,
            SoundError::UnknownIdentity(_) => ErrorKind::UnknownIdentity,
            SoundError::File(_) | SoundError::Wav(_) | SoundError::Decode(_) => {
                ErrorKind::FileError
            }
            SoundError::InvalidOctave(_) => ErrorKind::InvalidOctave,
            SoundError::InvalidPosition(_) => ErrorKind::InvalidPosition,
            SoundError::EmptySound => ErrorKind::EmptySound,
            SoundError::EmptyTrack(_) => ErrorKind::EmptyTrack,
            SoundError::NoteNotFound(_) => ErrorKind::NoteNotFound,
            SoundError::Parse(_) => ErrorKind::ParseError,
            SoundError::UnknownExtension(_) => ErrorKind::UnknownExtension,
            SoundError::NameAlreadyUsed(_) => ErrorKind::NameAlreadyUsed,
            SoundError::DeviceNotInitialized(_) => ErrorKind::DeviceNotInitialized,
            SoundError::AlreadyPlaying => ErrorKind::AlreadyPlaying,
            SoundError::AlreadyStopped => ErrorKind::AlreadyStopped,
            SoundError::AudioDevice(_) => ErrorKind::AudioDeviceError,
            SoundError::NoVoiceAvailable => ErrorKind::NoVoiceAvailable,
            SoundError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            SoundError::FileNotFound(_) => ErrorKind::FileNotFound,
            SoundError::FileExists(_) => ErrorKind::FileExists,
            SoundError::UnknownTempo(_) => ErrorKind::UnknownTempo,
            SoundError::UnknownInstrument(_) => ErrorKind::UnknownInstrument,
            SoundError::UnknownNote(_) => ErrorKind::UnknownNote,
            SoundError::UnknownDuration(_) => ErrorKind::UnknownDuration,
            SoundError::UnknownOctave(_) => ErrorKind::UnknownOctave,
            SoundError::UnknownRhythm(_) => ErrorKind::UnknownRhythm,
            SoundError::UnknownVariation(_) => ErrorKind::UnknownVariation,
            SoundError::Encoder(_) => ErrorKind::EncoderError,
        }
    }
}

pub type Result<T> = std::result::Result<T, SoundError>;

/// Records the kind of a failed result into `slot` and passes the result through.
pub(crate) fn record<T>(slot: &mut Option<ErrorKind>, result: Result<T>) -> Result<T> {
    *slot = match &result {
        Ok(_) => None,
        Err(e) => Some(e.kind()),
    };
    result
}
