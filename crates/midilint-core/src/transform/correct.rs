//! Pitch correction into a key

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{impl_transform_boilerplate, Transform};
use crate::error::{MidilintError, Result};
use crate::piece::Piece;
use crate::pitch::MAX_PITCH;
use crate::scale::Key;

/// How an out-of-key pitch is moved into the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Closest in-key pitch; the lower one on ties
    #[default]
    Nearest,
    /// Raise until in key, falling back to lowering at the top of the range
    ShiftUp,
    /// Lower until in key, falling back to raising at the bottom of the range
    ShiftDown,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::ShiftUp => "shift_up",
            Self::ShiftDown => "shift_down",
        }
    }

    /// Snap `pitch` into `targets`, given as a 128-entry membership table
    fn snap(self, pitch: u8, targets: &PitchSet) -> u8 {
        match self {
            Self::Nearest => targets.nearest(pitch),
            Self::ShiftUp => targets.search_up(pitch).or_else(|| targets.search_down(pitch)),
            Self::ShiftDown => targets.search_down(pitch).or_else(|| targets.search_up(pitch)),
        }
        .unwrap_or(pitch)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = MidilintError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "nearest" => Ok(Self::Nearest),
            "shift_up" | "up" => Ok(Self::ShiftUp),
            "shift_down" | "down" => Ok(Self::ShiftDown),
            _ => Err(MidilintError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Absolute pitches a note may be snapped to
pub(crate) struct PitchSet {
    members: [bool; MAX_PITCH as usize + 1],
}

impl PitchSet {
    pub(crate) fn new(pitches: impl IntoIterator<Item = u8>) -> Self {
        let mut members = [false; MAX_PITCH as usize + 1];
        for p in pitches {
            if p <= MAX_PITCH {
                members[p as usize] = true;
            }
        }
        Self { members }
    }

    fn contains(&self, pitch: u8) -> bool {
        self.members.get(pitch as usize).copied().unwrap_or(false)
    }

    fn search_up(&self, pitch: u8) -> Option<u8> {
        (pitch.min(MAX_PITCH)..=MAX_PITCH).find(|&p| self.contains(p))
    }

    fn search_down(&self, pitch: u8) -> Option<u8> {
        (0..=pitch.min(MAX_PITCH)).rev().find(|&p| self.contains(p))
    }

    /// Closest member by absolute distance; members are scanned ascending
    /// so the lower pitch wins a tie
    pub(crate) fn nearest(&self, pitch: u8) -> Option<u8> {
        (0..=MAX_PITCH)
            .filter(|&p| self.contains(p))
            .min_by_key(|&p| p.abs_diff(pitch))
    }
}

/// Snaps every note into a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectPitch {
    pub key: Key,
    #[serde(default)]
    pub strategy: Strategy,
}

impl CorrectPitch {
    pub fn new(key: Key, strategy: Strategy) -> Self {
        Self { key, strategy }
    }

    fn validate(&self, _piece: &Piece) -> Result<()> {
        Ok(())
    }

    fn process_impl(&self, mut piece: Piece) -> Piece {
        let targets = PitchSet::new(self.key.notes());
        tracing::debug!(key = %self.key, strategy = %self.strategy, "Correcting pitches");
        for note in piece.notes_mut() {
            note.pitch = self.strategy.snap(note.pitch, &targets);
        }
        piece
    }
}

impl_transform_boilerplate!(CorrectPitch, "correct_pitch");

/// Snap every note in the piece into `key` using `strategy`
pub fn correct_pitch(piece: Piece, key: Key, strategy: Strategy) -> Result<Piece> {
    CorrectPitch::new(key, strategy).apply(piece)
}
