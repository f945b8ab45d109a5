//! Modes and keys

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MidilintError;
use crate::pitch::{self, PitchClass};

/// Diatonic modes, in the priority order used for key identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Self::Major,
        Self::Minor,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::Locrian,
    ];

    /// Get scale intervals (semitones from root)
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Self::Major => [0, 2, 4, 5, 7, 9, 11],
            Self::Minor => [0, 2, 3, 5, 7, 8, 10],
            Self::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Self::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Dorian => "dorian",
            Self::Phrygian => "phrygian",
            Self::Lydian => "lydian",
            Self::Mixolydian => "mixolydian",
            Self::Locrian => "locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = MidilintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| MidilintError::UnknownMode(s.to_string()))
    }
}

/// A root pitch class plus a mode, e.g. `e_phrygian`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    pub root: PitchClass,
    pub mode: Mode,
}

impl Key {
    pub fn new(root: PitchClass, mode: Mode) -> Self {
        Self { root, mode }
    }

    /// The 7 scale degrees in ascending order starting at the root
    pub fn degrees(&self) -> [PitchClass; 7] {
        self.mode.intervals().map(|interval| self.root.shifted(interval))
    }

    /// Zero-based index of the degree holding `pc`, if any
    pub fn degree_of(&self, pc: PitchClass) -> Option<usize> {
        self.degrees().iter().position(|&d| d == pc)
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        self.degree_of(pc).is_some()
    }

    /// Every absolute pitch in the key, ascending
    pub fn notes(&self) -> Vec<u8> {
        pitch::notes_in(&self.degrees())
    }

    /// Label in `<root>_<mode>` form
    pub fn label(&self) -> String {
        format!("{}_{}", self.root, self.mode)
    }

    /// Display spelling of the 7 degrees.
    ///
    /// An altered degree is spelled with whichever of its names uses a
    /// letter not already held by a natural degree of the same scale, so
    /// d major reads `fs` and `cs` rather than `gb` and `db`. Matching never
    /// depends on this.
    pub fn spelled(&self) -> Vec<&'static str> {
        let degrees = self.degrees();
        let natural_letters: Vec<char> = degrees
            .iter()
            .filter(|d| d.is_natural())
            .map(|d| pitch::letter(d.name()))
            .collect();

        degrees
            .iter()
            .map(|d| {
                d.spellings()
                    .find(|name| d.is_natural() || !natural_letters.contains(&pitch::letter(name)))
                    .unwrap_or_else(|| d.name())
            })
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.root, self.mode)
    }
}

impl FromStr for Key {
    type Err = MidilintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (root, mode) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| MidilintError::UnknownKey(s.to_string()))?;
        Ok(Self::new(root.parse()?, mode.parse()?))
    }
}

impl TryFrom<String> for Key {
    type Error = MidilintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.label()
    }
}
