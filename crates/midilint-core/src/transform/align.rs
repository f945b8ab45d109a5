//! Beat alignment
//!
//! Snaps note delta times to a grid of `ticks_per_beat / precision` ticks.
//! The rounding error of each snapped event is carried into the next note
//! event of the same track, so later events keep their absolute position.
//! Exact half-grid offsets round half to even.

use serde::{Deserialize, Serialize};

use super::{impl_transform_boilerplate, Transform};
use crate::error::{MidilintError, Result};
use crate::piece::{Piece, Track};

/// Quantizes note timing to 1/`precision` of a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Align {
    /// Grid divisions per beat: 1 = quarter, 2 = eighth, 4 = sixteenth
    pub precision: u32,
}

impl Default for Align {
    fn default() -> Self {
        Self { precision: 1 }
    }
}

impl Align {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    fn validate(&self, piece: &Piece) -> Result<()> {
        if piece.ticks_per_beat % 2 != 0 {
            return Err(MidilintError::InvalidTicksPerBeat(piece.ticks_per_beat));
        }
        if self.precision == 0 || (self.precision != 1 && self.precision % 2 != 0) {
            return Err(MidilintError::InvalidPrecision(self.precision));
        }
        if self.grid(piece.ticks_per_beat) == 0 {
            return Err(MidilintError::GridTooFine {
                ticks_per_beat: piece.ticks_per_beat,
                precision: self.precision,
            });
        }
        if piece.ticks_per_beat as u32 % self.precision != 0 {
            return Err(MidilintError::UnevenGrid {
                ticks_per_beat: piece.ticks_per_beat,
                precision: self.precision,
            });
        }
        Ok(())
    }

    /// Grid unit in ticks
    fn grid(&self, ticks_per_beat: u16) -> i64 {
        ticks_per_beat as i64 / self.precision as i64
    }

    fn process_impl(&self, mut piece: Piece) -> Piece {
        let tick = self.grid(piece.ticks_per_beat);
        for track in &mut piece.tracks {
            let carry = align_track(track, tick);
            if carry != 0 {
                tracing::debug!(track = %track.name, carry, "Dropped residual carry at end of track");
            }
        }
        piece
    }
}

impl_transform_boilerplate!(Align, "align");

/// Align one track, returning the residual carry left after its last note.
fn align_track(track: &mut Track, tick: i64) -> i64 {
    let mut carry: i64 = 0;
    for event in track.events.iter_mut().filter(|e| e.is_note()) {
        let effective = event.delta as i64 + carry;
        if effective % tick == 0 {
            event.delta = effective as u32;
            carry = 0;
        } else {
            let snapped = round_to_grid(effective, tick);
            event.delta = snapped as u32;
            carry = effective - snapped;
        }
    }
    carry
}

/// Nearest multiple of `tick`, ties to the even multiple
fn round_to_grid(value: i64, tick: i64) -> i64 {
    let quotient = value.div_euclid(tick);
    let remainder = value.rem_euclid(tick);
    let rounded = match (2 * remainder).cmp(&tick) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient.rem_euclid(2),
    };
    rounded * tick
}

/// Quantize every track's note timing to 1/`precision` of a beat.
///
/// `ticks_per_beat` must be even and `precision` must be 1 or a positive
/// even number dividing `ticks_per_beat`; otherwise nothing is modified.
pub fn align(piece: Piece, precision: u32) -> Result<Piece> {
    Align::new(precision).apply(piece)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::piece::Event;

    fn note_deltas(piece: &Piece) -> Vec<u32> {
        piece.note_events().map(|e| e.delta).collect()
    }

    fn note_sum(track: &Track) -> i64 {
        track.events.iter().filter(|e| e.is_note()).map(|e| e.delta as i64).sum()
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to_grid(64, 128), 0);
        assert_eq!(round_to_grid(192, 128), 256);
        assert_eq!(round_to_grid(320, 128), 256);
        assert_eq!(round_to_grid(65, 128), 128);
        assert_eq!(round_to_grid(63, 128), 0);
        assert_eq!(round_to_grid(-64, 128), 0);
        assert_eq!(round_to_grid(-20, 128), 0);
    }

    #[test]
    fn test_align_quarter() {
        let piece = align(fixtures::sloppy_timing(), 1).unwrap();
        assert_eq!(note_deltas(&piece), vec![0, 128, 0, 128, 0, 128, 128, 128]);
    }

    #[test]
    fn test_align_eighth() {
        let piece = align(fixtures::sloppy_timing(), 2).unwrap();
        assert_eq!(note_deltas(&piece), vec![0, 128, 0, 128, 64, 64, 128, 128]);
    }

    #[test]
    fn test_carry_preserves_track_duration() {
        for precision in [1, 2, 4, 8] {
            let original = fixtures::sloppy_timing();
            let mut aligned = original.clone();
            let tick = Align::new(precision).grid(aligned.ticks_per_beat);
            let carry = align_track(&mut aligned.tracks[0], tick);
            assert_eq!(note_sum(&aligned.tracks[0]) + carry, note_sum(&original.tracks[0]));
        }
    }

    #[test]
    fn test_carry_crosses_other_events() {
        let events = vec![
            Event::note_on(100, 60, 80),
            Event::other(7),
            Event::note_off(100, 60, 0),
        ];
        let piece = Piece::new(1, 128, vec![Track::new("t", events)]);
        let piece = align(piece, 1).unwrap();

        // 100 -> 128 carries -28 past the untouched meta event
        assert_eq!(piece.tracks[0].events[0].delta, 128);
        assert_eq!(piece.tracks[0].events[1].delta, 7);
        assert_eq!(piece.tracks[0].events[2].delta, 128);
    }

    #[test]
    fn test_carry_is_per_track() {
        let track = || Track::new("t", vec![Event::note_on(100, 60, 80), Event::note_off(40, 60, 0)]);
        let piece = Piece::new(1, 128, vec![track(), track()]);
        let piece = align(piece, 1).unwrap();

        assert_eq!(piece.tracks[0].events[0].delta, 128);
        assert_eq!(piece.tracks[0].events[1].delta, 0);
        assert_eq!(piece.tracks[0], piece.tracks[1]);
    }

    #[test]
    fn test_align_is_idempotent_on_aligned_piece() {
        let once = align(fixtures::chromatic_run(), 1).unwrap();
        assert_eq!(once, fixtures::chromatic_run());
        let twice = align(once.clone(), 1).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_bad_configuration_without_mutation() {
        assert!(matches!(
            align(fixtures::sloppy_timing(), 3),
            Err(MidilintError::InvalidPrecision(3))
        ));
        assert!(matches!(
            align(fixtures::sloppy_timing(), 0),
            Err(MidilintError::InvalidPrecision(0))
        ));

        let mut odd = fixtures::sloppy_timing();
        odd.ticks_per_beat = 127;
        assert!(matches!(align(odd, 1), Err(MidilintError::InvalidTicksPerBeat(127))));

        let fine = align(fixtures::sloppy_timing(), 256).unwrap_err();
        assert!(fine.is_configuration());
    }

    #[test]
    fn test_rejects_grid_that_does_not_divide_the_beat() {
        let on_beat = || {
            let events = vec![Event::note_on(128, 60, 80), Event::note_off(128, 60, 0)];
            Piece::new(0, 128, vec![Track::new("t", events)])
        };

        let err = align(on_beat(), 6).unwrap_err();
        assert!(matches!(
            err,
            MidilintError::UnevenGrid { ticks_per_beat: 128, precision: 6 }
        ));
        assert!(err.is_configuration());

        let mut triplet = on_beat();
        triplet.ticks_per_beat = 96;
        assert!(matches!(align(triplet, 64), Err(MidilintError::UnevenGrid { .. })));
    }

    #[test]
    fn test_beat_aligned_piece_unchanged_at_every_accepted_precision() {
        let on_beat = || {
            let events = vec![Event::note_on(96, 60, 80), Event::note_off(192, 60, 0)];
            Piece::new(0, 96, vec![Track::new("t", events)])
        };
        for precision in 1..=96 {
            match align(on_beat(), precision) {
                Ok(piece) => assert_eq!(piece, on_beat(), "precision {}", precision),
                Err(err) => assert!(err.is_configuration()),
            }
        }
        assert_eq!(align(on_beat(), 6).unwrap(), on_beat());
        assert_eq!(align(on_beat(), 32).unwrap(), on_beat());
    }
}
