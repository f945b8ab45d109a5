//! In-memory pieces shared by unit tests

use crate::piece::{Event, Piece, Track};

fn held_notes(pitches: &[(u8, u32)], velocity: u8) -> Vec<Event> {
    let mut events = vec![Event::other(0)];
    for &(pitch, ticks) in pitches {
        events.push(Event::note_on(0, pitch, velocity));
        events.push(Event::note_off(ticks, pitch, velocity));
    }
    events.push(Event::other(0));
    events
}

/// Every semitone from c4 to c5, one beat each
pub(crate) fn chromatic_run() -> Piece {
    let pitches: Vec<(u8, u32)> = (60..=72).map(|p| (p, 128)).collect();
    Piece::new(1, 128, vec![Track::new("chromatic", held_notes(&pitches, 64))])
}

/// Ascending c major octave with a long opening c
pub(crate) fn c_major_run() -> Piece {
    let pitches = [(60, 512), (62, 128), (64, 128), (65, 128), (67, 128), (69, 128), (71, 128), (72, 128)];
    Piece::new(1, 128, vec![Track::new("scale", held_notes(&pitches, 80))])
}

/// Four notes played slightly off a 128-tick beat
pub(crate) fn sloppy_timing() -> Piece {
    let events = vec![
        Event::other(0),
        Event::note_on(0, 60, 29),
        Event::note_off(120, 60, 0),
        Event::note_on(8, 62, 64),
        Event::note_off(136, 62, 0),
        Event::note_on(50, 64, 125),
        Event::note_off(70, 64, 0),
        Event::note_on(150, 60, 29),
        Event::note_off(106, 60, 0),
        Event::other(0),
    ];
    Piece::new(1, 128, vec![Track::new("sloppy", events)])
}
