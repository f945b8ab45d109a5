//! In-memory representation of a decoded MIDI piece

use serde::{Deserialize, Serialize};

/// Highest MIDI velocity
pub const MAX_VELOCITY: u8 = 127;

/// Pitch and velocity of a note event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub channel: u8,
    /// MIDI note number (0-127, 60 = middle C)
    pub pitch: u8,
    /// Velocity (0-127); a note-on with velocity 0 acts as a note-off
    pub velocity: u8,
}

impl Note {
    pub fn new(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self { channel, pitch, velocity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    NoteOn(Note),
    NoteOff(Note),
    /// Any event the transforms pass through untouched
    Other,
}

/// A track event with its delta time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Ticks since the previous event in the same track
    pub delta: u32,
    pub kind: EventKind,
}

impl Event {
    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self { delta, kind: EventKind::NoteOn(Note::new(0, pitch, velocity)) }
    }

    pub fn note_off(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self { delta, kind: EventKind::NoteOff(Note::new(0, pitch, velocity)) }
    }

    pub fn other(delta: u32) -> Self {
        Self { delta, kind: EventKind::Other }
    }

    pub fn note(&self) -> Option<&Note> {
        match &self.kind {
            EventKind::NoteOn(note) | EventKind::NoteOff(note) => Some(note),
            EventKind::Other => None,
        }
    }

    pub fn note_mut(&mut self) -> Option<&mut Note> {
        match &mut self.kind {
            EventKind::NoteOn(note) | EventKind::NoteOff(note) => Some(note),
            EventKind::Other => None,
        }
    }

    pub fn is_note(&self) -> bool {
        self.note().is_some()
    }

    /// Note-on with a nonzero velocity
    pub fn is_sounding(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn(note) if note.velocity > 0)
    }
}

/// Ordered events of one track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub events: Vec<Event>,
}

impl Track {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self { name: name.into(), events }
    }

    pub fn notes_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.events.iter_mut().filter_map(Event::note_mut)
    }

    /// Sum of all delta times
    pub fn duration(&self) -> u64 {
        self.events.iter().map(|e| e.delta as u64).sum()
    }
}

/// A decoded piece: timing resolution plus tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Standard MIDI File format (0, 1 or 2)
    pub format: u8,
    /// Pulses per quarter note
    pub ticks_per_beat: u16,
    pub tracks: Vec<Track>,
}

impl Piece {
    pub fn new(format: u8, ticks_per_beat: u16, tracks: Vec<Track>) -> Self {
        Self { format, ticks_per_beat, tracks }
    }

    /// Every note event across all tracks, in track order
    pub fn note_events(&self) -> impl Iterator<Item = &Event> {
        self.tracks.iter().flat_map(|t| t.events.iter()).filter(|e| e.is_note())
    }

    pub fn notes_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.tracks.iter_mut().flat_map(Track::notes_mut)
    }
}
