//! Pitch classes, enharmonic spellings and absolute MIDI pitches

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MidilintError;

/// Highest MIDI pitch number
pub const MAX_PITCH: u8 = 127;

/// Canonical spelling, indexed by pitch class value
const NAMES: [&str; 12] = ["c", "db", "d", "eb", "e", "f", "gb", "g", "ab", "a", "bb", "b"];

/// Enharmonic alternate spelling, indexed by pitch class value
const ALTERNATES: [Option<&str>; 12] = [
    None,
    Some("cs"),
    None,
    Some("ds"),
    None,
    None,
    Some("fs"),
    None,
    Some("gs"),
    None,
    Some("as"),
    None,
];

/// One of the 12 pitch classes (value mod 12 of a MIDI pitch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order starting at c
    pub const ALL: [PitchClass; 12] = [
        Self::C,
        Self::Db,
        Self::D,
        Self::Eb,
        Self::E,
        Self::F,
        Self::Gb,
        Self::G,
        Self::Ab,
        Self::A,
        Self::Bb,
        Self::B,
    ];

    /// Pitch class for a value, wrapping mod 12
    pub fn from_index(value: u8) -> Self {
        Self::ALL[(value % 12) as usize]
    }

    /// Pitch class of an absolute MIDI pitch
    pub fn of(pitch: u8) -> Self {
        Self::from_index(pitch)
    }

    /// Semitones above c (0-11)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Canonical (flat) spelling, e.g. "db"
    pub fn name(self) -> &'static str {
        NAMES[self.index() as usize]
    }

    /// Enharmonic alternate (sharp) spelling, e.g. "cs" for db
    pub fn alternate(self) -> Option<&'static str> {
        ALTERNATES[self.index() as usize]
    }

    /// Every spelling of this class, canonical first
    pub fn spellings(self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name()).chain(self.alternate())
    }

    pub fn is_natural(self) -> bool {
        self.alternate().is_none()
    }

    /// The class `semitones` above this one
    pub fn shifted(self, semitones: u8) -> Self {
        Self::from_index((self.index() + semitones % 12) % 12)
    }

    /// Every absolute pitch in 0..=127 belonging to this class, ascending
    pub fn notes(self) -> impl Iterator<Item = u8> {
        (self.index()..=MAX_PITCH).step_by(12)
    }
}

/// Expand a set of pitch classes into every matching absolute pitch, ascending.
///
/// ```
/// use midilint_core::pitch::{notes_in, PitchClass};
/// let notes = notes_in(&[PitchClass::C]);
/// assert_eq!(notes.first(), Some(&0));
/// assert_eq!(notes.last(), Some(&120));
/// assert_eq!(notes.len(), 11);
/// ```
pub fn notes_in(classes: &[PitchClass]) -> Vec<u8> {
    let mut notes: Vec<u8> = classes.iter().flat_map(|pc| pc.notes()).collect();
    notes.sort_unstable();
    notes.dedup();
    notes
}

/// First letter of a spelling ("d" for "db")
pub(crate) fn letter(spelling: &str) -> char {
    spelling.chars().next().unwrap_or_default()
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = MidilintError;

    /// Accepts canonical flats ("eb"), sharps spelled "ds" or "d#", any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('#', "s");
        Self::ALL
            .into_iter()
            .find(|pc| pc.spellings().any(|name| name == normalized))
            .ok_or_else(|| MidilintError::UnknownPitchClass(s.to_string()))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = MidilintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(pc: PitchClass) -> Self {
        pc.name().to_string()
    }
}
