//! Velocity normalization

use serde::{Deserialize, Serialize};

use super::{impl_transform_boilerplate, Transform};
use crate::error::{MidilintError, Result};
use crate::piece::{Piece, MAX_VELOCITY};

/// Velocity used when none is configured
pub const DEFAULT_VELOCITY: u8 = 127;

/// Sets every note event's velocity to a fixed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalize {
    pub velocity: u8,
}

impl Default for Normalize {
    fn default() -> Self {
        Self { velocity: DEFAULT_VELOCITY }
    }
}

impl Normalize {
    pub fn new(velocity: u8) -> Self {
        Self { velocity }
    }

    fn validate(&self, _piece: &Piece) -> Result<()> {
        if self.velocity > MAX_VELOCITY {
            return Err(MidilintError::InvalidVelocity(self.velocity));
        }
        Ok(())
    }

    fn process_impl(&self, mut piece: Piece) -> Piece {
        for note in piece.notes_mut() {
            note.velocity = self.velocity;
        }
        piece
    }
}

impl_transform_boilerplate!(Normalize, "normalize");

/// Set every note-on and note-off velocity in the piece to `velocity`
pub fn normalize(piece: Piece, velocity: u8) -> Result<Piece> {
    Normalize::new(velocity).apply(piece)
}
