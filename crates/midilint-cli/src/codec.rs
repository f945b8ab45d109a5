//! Standard MIDI File <-> Piece conversion
//!
//! Decoding copies note data and delta times out of a parsed `midly::Smf`.
//! Encoding writes them back into the same Smf, event for event, so every
//! non-note event (meta, sysex, controllers) is saved exactly as it was read.

use anyhow::{bail, ensure, Context, Result};
use midly::num::{u28, u7};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use midilint_core::{Event, EventKind, Note, Piece, Track};

/// Build a Piece from a parsed Smf.
pub fn decode(smf: &Smf) -> Result<Piece> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, subframes) => {
            tracing::warn!(?fps, subframes, "Rejecting SMPTE-timed file");
            bail!("SMPTE timecode timing is not supported, only ticks per beat");
        }
    };
    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };

    let tracks = smf
        .tracks
        .iter()
        .enumerate()
        .map(|(i, events)| Track::new(track_name(events, i), events.iter().map(decode_event).collect()))
        .collect();

    Ok(Piece::new(format, ticks_per_beat, tracks))
}

fn track_name(events: &[TrackEvent], index: usize) -> String {
    events
        .iter()
        .find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        })
        .unwrap_or_else(|| format!("track {}", index))
}

fn decode_event(event: &TrackEvent) -> Event {
    let kind = match event.kind {
        TrackEventKind::Midi { channel, message: MidiMessage::NoteOn { key, vel } } => {
            EventKind::NoteOn(Note::new(channel.as_int(), key.as_int(), vel.as_int()))
        }
        TrackEventKind::Midi { channel, message: MidiMessage::NoteOff { key, vel } } => {
            EventKind::NoteOff(Note::new(channel.as_int(), key.as_int(), vel.as_int()))
        }
        _ => EventKind::Other,
    };
    Event { delta: event.delta.as_int(), kind }
}

/// Write the piece's note data and delta times back into the Smf it was
/// decoded from.
pub fn encode(smf: &mut Smf, piece: &Piece) -> Result<()> {
    ensure!(
        smf.tracks.len() == piece.tracks.len(),
        "Piece has {} tracks but the file has {}",
        piece.tracks.len(),
        smf.tracks.len()
    );

    for (events, track) in smf.tracks.iter_mut().zip(&piece.tracks) {
        ensure!(
            events.len() == track.events.len(),
            "Track '{}' has {} events but the file has {}",
            track.name,
            track.events.len(),
            events.len()
        );

        for (raw, event) in events.iter_mut().zip(&track.events) {
            raw.delta = u28::try_from(event.delta)
                .with_context(|| format!("Delta time {} does not fit in a MIDI file", event.delta))?;

            let Some(note) = event.note() else { continue };
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel } | MidiMessage::NoteOff { key, vel },
                ..
            } = &mut raw.kind
            {
                *key = u7::try_from(note.pitch).with_context(|| format!("Pitch {} is out of range", note.pitch))?;
                *vel = u7::try_from(note.velocity)
                    .with_context(|| format!("Velocity {} is out of range", note.velocity))?;
            }
        }
    }
    Ok(())
}
