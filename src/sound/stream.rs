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
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::{Decoder as CodecDecoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info, warn};

use super::events::SoundEventKind;
use super::{Clock, PlayContext};
use crate::audio::{Voice, VoiceState};
use crate::error::{record, ErrorKind, Result, SoundError};
use crate::samples::SampleBuffer;

/// Chunks kept queued on the voice while streaming.
const QUEUED_CHUNKS: usize = 4;

/// Pulls fixed-size 16-bit chunks out of a compressed file.
struct ChunkDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn CodecDecoder>,
    track_id: u32,
    channels: u16,
    sample_rate: u32,
    leftover: Vec<i16>,
    finished: bool,
    chunks: usize,
}

impl ChunkDecoder {
    fn open(path: &Path) -> Result<ChunkDecoder> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SoundError::Parse(format!("{}: no audio track", path.display())))?;
        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| SoundError::Parse(format!("{}: no sample rate", path.display())))?;
        let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);
        let track_id = track.id;
        let decoder = get_codecs().make(params, &DecoderOptions::default())?;

        Ok(ChunkDecoder {
            format_reader,
            decoder,
            track_id,
            channels,
            sample_rate,
            leftover: Vec::new(),
            finished: false,
            chunks: 0,
        })
    }

    /// Samples in one chunk: half a second of every channel.
    fn chunk_len(&self) -> usize {
        (self.sample_rate as usize / 2).max(1) * usize::from(self.channels.max(1))
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            match self.format_reader.next_packet() {
                Ok(packet) if packet.track_id() == self.track_id => return Ok(Some(packet)),
                Ok(_) => continue,
                Err(SymphoniaError::ResetRequired) => self.decoder.reset(),
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn decode_packet(&mut self, packet: &Packet) -> Result<Vec<i16>> {
        let decoded = match self.decoder.decode(packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::ResetRequired) => {
                self.decoder.reset();
                self.decoder.decode(packet)?
            }
            // A corrupt packet is skipped.
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(err = e, "Skipping undecodable packet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if decoded.frames() == 0 {
            return Ok(Vec::new());
        }
        let mut pcm = PcmBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec());
        pcm.copy_interleaved_ref(decoded);
        Ok(pcm.samples().to_vec())
    }

    /// The next chunk, or `None` once the file is exhausted. The last chunk
    /// may be short.
    fn next_chunk(&mut self, name: &str) -> Result<Option<SampleBuffer>> {
        let target = self.chunk_len();
        while !self.finished && self.leftover.len() < target {
            match self.next_packet()? {
                Some(packet) => {
                    let samples = self.decode_packet(&packet)?;
                    self.leftover.extend_from_slice(&samples);
                }
                None => self.finished = true,
            }
        }
        if self.leftover.is_empty() {
            return Ok(None);
        }

        let take = target.min(self.leftover.len());
        let data: Vec<i16> = self.leftover.drain(..take).collect();
        self.chunks += 1;
        Ok(Some(SampleBuffer::new(
            &format!("{}#{}", name, self.chunks),
            data,
            self.sample_rate,
            self.channels,
        )))
    }

    fn is_exhausted(&self) -> bool {
        self.finished && self.leftover.is_empty()
    }
}

/// A compressed file decoded chunk by chunk while it plays.
pub struct Stream {
    name: String,
    path: PathBuf,
    decoder: Option<ChunkDecoder>,
    voice: Option<Arc<dyn Voice>>,
    intensity: f32,
    position: [f32; 3],
    looping: bool,
    silent: bool,
    chunks_played: usize,
    clock: Clock,
    events: Vec<SoundEventKind>,
    last_error: Option<ErrorKind>,
}

impl Stream {
    /// Records the file. Nothing is decoded until the stream plays.
    pub fn new(name: &str, path: &Path) -> Result<Stream> {
        if !path.is_file() {
            return Err(SoundError::FileNotFound(path.display().to_string()));
        }
        Ok(Stream {
            name: name.to_string(),
            path: path.to_path_buf(),
            decoder: None,
            voice: None,
            intensity: 1.0,
            position: [0.0; 3],
            looping: false,
            silent: false,
            chunks_played: 0,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn renamed(&self, name: &str) -> Stream {
        Stream {
            name: name.to_string(),
            path: self.path.clone(),
            decoder: None,
            voice: None,
            intensity: self.intensity,
            position: self.position,
            looping: false,
            silent: false,
            chunks_played: 0,
            clock: Clock::default(),
            events: Vec::new(),
            last_error: None,
        }
    }

    /// True until the first chunk has been decoded.
    pub fn is_empty(&self) -> bool {
        self.decoder.as_ref().map_or(true, |d| d.chunks == 0)
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        if let Some(voice) = &self.voice {
            voice.set_gain(self.intensity);
        }
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
        if let Some(voice) = &self.voice {
            voice.set_position(position);
        }
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn chunks_played(&self) -> usize {
        self.chunks_played
    }

    pub fn is_playing(&self) -> bool {
        self.voice.is_some()
    }

    pub fn is_paused(&self) -> bool {
        false
    }

    pub fn is_stopped(&self) -> bool {
        self.voice.is_none()
    }

    pub fn percent_played(&self) -> f32 {
        0.0
    }

    pub fn play(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        let result = self.start(ctx, looping, silent);
        record(&mut self.last_error, result)
    }

    fn start(&mut self, ctx: PlayContext<'_>, looping: bool, silent: bool) -> Result<()> {
        if self.voice.is_some() {
            return Err(SoundError::AlreadyPlaying);
        }
        self.decoder = Some(ChunkDecoder::open(&self.path)?);
        self.looping = looping;
        self.silent = silent;
        self.chunks_played = 0;

        let voice = ctx.sources.check_out().ok_or(SoundError::NoVoiceAvailable)?;
        voice.set_gain(self.intensity);
        voice.set_position(self.position);
        let started = self.fill(&voice, QUEUED_CHUNKS).and_then(|queued| {
            if queued == 0 {
                return Err(SoundError::EmptySound);
            }
            voice.play()
        });
        if let Err(e) = started {
            ctx.sources.check_in(&voice);
            return Err(e);
        }

        self.voice = Some(voice);
        self.clock.restart();
        self.push_event(SoundEventKind::SoundPlaying);
        info!(stream = self.name, path = ?self.path, looping, "Stream playing");
        Ok(())
    }

    /// Queues up to `count` chunks. Returns how many were queued.
    fn fill(&mut self, voice: &Arc<dyn Voice>, count: usize) -> Result<usize> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(0);
        };
        let mut queued = 0;
        while queued < count {
            match decoder.next_chunk(&self.name)? {
                Some(chunk) => {
                    voice.queue(&[Arc::new(chunk)])?;
                    queued += 1;
                }
                None => break,
            }
        }
        Ok(queued)
    }

    pub fn pause(&mut self) -> Result<()> {
        record(&mut self.last_error, Err(SoundError::NotImplemented("pause")))
    }

    pub fn stop(&mut self, ctx: PlayContext<'_>) -> Result<()> {
        let result = if self.voice.is_some() {
            self.finish(ctx);
            Ok(())
        } else {
            Err(SoundError::AlreadyStopped)
        };
        record(&mut self.last_error, result)
    }

    fn finish(&mut self, ctx: PlayContext<'_>) {
        if let Some(voice) = self.voice.take() {
            voice.stop();
            ctx.sources.check_in(&voice);
        }
        self.push_event(SoundEventKind::SoundStopped);
        debug!(stream = self.name, chunks = self.chunks_played, "Stream stopped");
    }

    /// Swaps finished chunks for fresh ones. Returns true when the stream ran
    /// out and stopped.
    pub fn update(&mut self, ctx: PlayContext<'_>) -> bool {
        let Some(voice) = self.voice.clone() else {
            return false;
        };
        match self.advance(&voice) {
            Ok(true) => {
                self.finish(ctx);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(stream = self.name, err = %e, "Stream failed");
                self.last_error = Some(e.kind());
                self.finish(ctx);
                true
            }
        }
    }

    fn advance(&mut self, voice: &Arc<dyn Voice>) -> Result<bool> {
        let done = voice.unqueue_processed();
        self.chunks_played += done;
        self.fill(voice, done)?;

        if voice.state() != VoiceState::Stopped {
            return Ok(false);
        }

        // The voice drained its queue. Either it starved or the file ended.
        let exhausted = self.decoder.as_ref().map_or(true, |d| d.is_exhausted());
        if exhausted {
            if !self.looping {
                return Ok(true);
            }
            self.decoder = Some(ChunkDecoder::open(&self.path)?);
            self.clock.restart();
            debug!(stream = self.name, "Stream looping");
        }
        if self.fill(voice, QUEUED_CHUNKS)? == 0 {
            return Ok(true);
        }
        voice.play()?;
        Ok(false)
    }

    fn push_event(&mut self, kind: SoundEventKind) {
        if !self.silent {
            self.events.push(kind);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SoundEventKind> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("playing", &self.is_playing())
            .finish()
    }
}
