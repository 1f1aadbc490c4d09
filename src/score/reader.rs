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
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{MusicScore, Score, ScoreBody, ScoreRhythm, ScoreTrack};
use crate::error::{Result, SoundError};
use crate::music::{decoded_octave, Note, NoteDuration, Pitch, Tempo, TimeSignature};

/// Octave of a music note that doesn't name one.
const DEFAULT_OCTAVE: u8 = 3;

fn parse_error(message: impl std::fmt::Display) -> SoundError {
    SoundError::Parse(message.to_string())
}

/// The attributes of one element, unescaped.
struct Attrs {
    element: String,
    pairs: Vec<(String, String)>,
}

impl Attrs {
    fn of(start: &BytesStart) -> Result<Attrs> {
        let element = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut pairs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(parse_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(parse_error)?.into_owned();
            pairs.push((key, value));
        }
        Ok(Attrs { element, pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            parse_error(format!("<{}> is missing the {} attribute", self.element, key))
        })
    }

    /// Parses an attribute through one of the music value types, which report
    /// their own `Unknown*` errors.
    fn value<T: FromStr<Err = SoundError>>(&self, key: &str) -> Result<T> {
        self.require(key)?.parse()
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|_| {
                    parse_error(format!("<{}> {}: bad number {:?}", self.element, key, raw))
                })
            })
            .transpose()
    }
}

struct Header {
    name: String,
    tempo: Tempo,
    duration: Option<u32>,
    music: bool,
    representation: Option<i32>,
}

#[derive(Default)]
struct Builder {
    header: Option<Header>,
    tracks: Vec<ScoreTrack>,
    melody: Option<MusicScore>,
    rhythms: Vec<ScoreRhythm>,
    in_melody: bool,
}

impl Builder {
    fn header(&self, element: &str) -> Result<&Header> {
        self.header
            .as_ref()
            .ok_or_else(|| parse_error(format!("<{}> outside of <music>", element)))
    }

    fn open(&mut self, attrs: &Attrs) -> Result<()> {
        match attrs.element.as_str() {
            "music" => self.open_root(attrs),
            "melody" => self.open_melody(attrs),
            "note" => self.add_note(attrs),
            "rhythm" => self.add_rhythm(attrs),
            other => Err(parse_error(format!("unexpected element <{}>", other))),
        }
    }

    fn open_root(&mut self, attrs: &Attrs) -> Result<()> {
        if self.header.is_some() {
            return Err(parse_error("nested <music>"));
        }
        self.header = Some(Header {
            name: attrs.get("name").unwrap_or_default().to_string(),
            tempo: attrs.value("tempo")?,
            duration: attrs.number("duration")?,
            music: attrs.get("kind") == Some("music"),
            representation: attrs.number("representation")?,
        });
        Ok(())
    }

    fn open_melody(&mut self, attrs: &Attrs) -> Result<()> {
        if self.in_melody {
            return Err(parse_error("nested <melody>"));
        }
        let header = self.header("melody")?;
        if header.music {
            if self.melody.is_some() {
                return Err(parse_error("a music line has exactly one <melody>"));
            }
            self.melody = Some(MusicScore {
                instrument: attrs.value("instrument")?,
                notes: Vec::new(),
                rhythms: Vec::new(),
                representation: header.representation,
            });
        } else {
            let time_signature = match attrs.get("compass") {
                Some(code) => code.parse()?,
                None => TimeSignature::default(),
            };
            self.tracks.push(ScoreTrack {
                instrument: attrs.value("instrument")?,
                time_signature,
                notes: Vec::new(),
            });
        }
        self.in_melody = true;
        Ok(())
    }

    fn add_note(&mut self, attrs: &Attrs) -> Result<()> {
        if !self.in_melody {
            return Err(parse_error("<note> outside of <melody>"));
        }
        let duration: NoteDuration = attrs.value("duration")?;
        let height: i32 = attrs
            .number("height")?
            .ok_or_else(|| parse_error("<note> is missing the height attribute"))?;
        let octave: Option<u8> = attrs.number("octave")?;

        match (self.melody.as_mut(), self.tracks.last_mut()) {
            (Some(melody), _) => {
                let octave = decoded_octave(octave.unwrap_or(DEFAULT_OCTAVE))?;
                let pitch = Pitch::try_from(height)?;
                melody.notes.push(Note::new(duration, pitch, octave));
            }
            (None, Some(track)) => {
                track.notes.push(Note::from_height(height, duration, octave)?);
            }
            (None, None) => return Err(parse_error("<note> outside of <melody>")),
        }
        Ok(())
    }

    fn add_rhythm(&mut self, attrs: &Attrs) -> Result<()> {
        if !self.header("rhythm")?.music {
            return Err(parse_error("<rhythm> belongs to a music line"));
        }
        let variation = match attrs.number::<i32>("variation")? {
            Some(code) if code >= 0 => Some(code.try_into()?),
            _ => None,
        };
        self.rhythms.push(ScoreRhythm {
            instrument: attrs.value("instrument")?,
            variation,
        });
        Ok(())
    }

    fn close(&mut self, element: &[u8]) {
        if element == b"melody" {
            self.in_melody = false;
        }
    }

    fn finish(self) -> Result<Score> {
        let header = self.header.ok_or_else(|| parse_error("missing <music> root"))?;
        let body = if header.music {
            let mut melody = self
                .melody
                .ok_or_else(|| parse_error("music line without <melody>"))?;
            melody.rhythms = self.rhythms;
            ScoreBody::Music(melody)
        } else {
            ScoreBody::Sound(self.tracks)
        };
        Ok(Score {
            name: header.name,
            tempo: header.tempo,
            duration: header.duration,
            body,
        })
    }
}

/// Parses a score document.
pub fn from_str(xml: &str) -> Result<Score> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut builder = Builder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            parse_error(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(start) => builder.open(&Attrs::of(&start)?)?,
            Event::Empty(start) => {
                builder.open(&Attrs::of(&start)?)?;
                builder.close(start.name().as_ref());
            }
            Event::End(end) => builder.close(end.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    let score = builder.finish()?;
    debug!(score = score.name, music = score.is_music(), "Parsed score");
    Ok(score)
}
