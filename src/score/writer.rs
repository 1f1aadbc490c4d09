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
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::{MusicScore, Score, ScoreBody, ScoreTrack};
use crate::error::{Result, SoundError};
use crate::music::Note;

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| SoundError::Parse(format!("writing score: {}", e)))
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    emit(writer, Event::Start(element))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn empty(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    emit(writer, Event::Empty(element))
}

/// Pauses keep their octave so a written score reads back identically.
fn sound_note(writer: &mut XmlWriter, note: &Note) -> Result<()> {
    let mut element = BytesStart::new("note");
    element.push_attribute(("height", note.height().to_string().as_str()));
    element.push_attribute(("duration", note.duration().to_string().as_str()));
    if note.is_pause() {
        element.push_attribute(("octave", note.octave().to_string().as_str()));
    }
    empty(writer, element)
}

fn sound_track(writer: &mut XmlWriter, track: &ScoreTrack) -> Result<()> {
    let mut melody = BytesStart::new("melody");
    melody.push_attribute(("instrument", track.instrument.to_string().as_str()));
    melody.push_attribute(("compass", track.time_signature.to_string().as_str()));
    start(writer, melody)?;
    for note in track.notes.iter() {
        sound_note(writer, note)?;
    }
    end(writer, "melody")
}

fn music_line(writer: &mut XmlWriter, music: &MusicScore) -> Result<()> {
    let mut melody = BytesStart::new("melody");
    melody.push_attribute(("instrument", music.instrument.to_string().as_str()));
    start(writer, melody)?;
    for note in music.notes.iter() {
        let mut element = BytesStart::new("note");
        element.push_attribute(("height", note.pitch().to_string().as_str()));
        element.push_attribute(("duration", note.duration().to_string().as_str()));
        element.push_attribute(("octave", note.octave().to_string().as_str()));
        empty(writer, element)?;
    }
    end(writer, "melody")?;

    for rhythm in music.rhythms.iter() {
        let mut element = BytesStart::new("rhythm");
        element.push_attribute(("instrument", rhythm.instrument.to_string().as_str()));
        if let Some(variation) = rhythm.variation {
            element.push_attribute(("variation", variation.to_string().as_str()));
        }
        empty(writer, element)?;
    }
    Ok(())
}

/// Renders a score document.
pub fn to_string(score: &Score) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut root = BytesStart::new("music");
    root.push_attribute(("name", score.name.as_str()));
    root.push_attribute(("tempo", score.tempo.to_string().as_str()));
    if let Some(duration) = score.duration {
        root.push_attribute(("duration", duration.to_string().as_str()));
    }
    if let ScoreBody::Music(music) = &score.body {
        root.push_attribute(("kind", "music"));
        if let Some(representation) = music.representation {
            root.push_attribute(("representation", representation.to_string().as_str()));
        }
    }
    start(&mut writer, root)?;

    match &score.body {
        ScoreBody::Sound(tracks) => {
            for track in tracks.iter() {
                sound_track(&mut writer, track)?;
            }
        }
        ScoreBody::Music(music) => music_line(&mut writer, music)?,
    }
    end(&mut writer, "music")?;

    String::from_utf8(writer.into_inner()).map_err(|e| SoundError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Instrument, NoteDuration, Pitch, Tempo, TimeSignature};

    #[test]
    fn test_sound_layout() {
        let score = Score {
            name: "a & b".to_string(),
            tempo: Tempo::Bpm200,
            duration: None,
            body: ScoreBody::Sound(vec![ScoreTrack {
                instrument: Instrument::Xylophone,
                time_signature: TimeSignature::TwoFour,
                notes: vec![
                    Note::new(NoteDuration::Quaver, Pitch::La, 4),
                    Note::new(NoteDuration::Quaver, Pitch::Pause, 3),
                ],
            }]),
        };
        let xml = to_string(&score).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<music name=\"a &amp; b\" tempo=\"200\">"));
        assert!(xml.contains("<melody instrument=\"4\" compass=\"24\">"));
        assert!(xml.contains("<note height=\"81\" duration=\"16\"/>"));
        assert!(xml.contains("<note height=\"-1\" duration=\"16\" octave=\"3\"/>"));
        assert!(!xml.contains("kind="));
    }
}
