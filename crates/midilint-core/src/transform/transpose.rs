//! Transposition between keys by scale degree

use serde::{Deserialize, Serialize};

use super::Transform;
use crate::error::{MidilintError, Result};
use crate::identify::{infer_key, KeyLabel};
use crate::piece::Piece;
use crate::pitch::PitchClass;
use crate::scale::Key;

/// Moves every note from the piece's identified key into `key`, keeping its
/// scale degree and staying as close as possible to the original pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transpose {
    /// Destination key
    pub key: Key,
}

impl Transpose {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    /// Inferred key of the piece, or an error when it is ambiguous
    fn source_key(piece: &Piece) -> Result<Key> {
        match infer_key(piece)? {
            KeyLabel::Resolved(key) => Ok(key),
            KeyLabel::Unresolved(tonal_center) => Err(MidilintError::UnidentifiableKey { tonal_center }),
        }
    }
}

/// Map `pitch` from `source` to the same degree of `destination`.
///
/// Returns `None` when the pitch class is not a degree of `source`.
pub fn map_pitch(pitch: u8, source: &Key, destination: &Key) -> Option<u8> {
    let degree = source.degree_of(PitchClass::of(pitch))?;
    destination.degrees()[degree]
        .notes()
        .min_by_key(|p| p.abs_diff(pitch))
}

impl Transform for Transpose {
    fn name(&self) -> &str {
        "transpose"
    }

    fn apply(&self, mut piece: Piece) -> Result<Piece> {
        let source = Self::source_key(&piece)?;
        tracing::debug!(from = %source, to = %self.key, tracks = piece.tracks.len(), "Applying transform");

        let mut unmapped = 0usize;
        for note in piece.notes_mut() {
            match map_pitch(note.pitch, &source, &self.key) {
                Some(pitch) => note.pitch = pitch,
                None => unmapped += 1,
            }
        }
        if unmapped > 0 {
            tracing::warn!(unmapped, key = %source, "Notes outside the source key were left unchanged");
        }
        Ok(piece)
    }
}

/// Transpose the piece from its identified key into `destination`.
///
/// Fails with `UnidentifiableKey` when no key fits the piece's pitch classes.
/// Note velocities play no part.
pub fn transpose(piece: Piece, destination: Key) -> Result<Piece> {
    Transpose::new(destination).apply(piece)
}
