//! Error types for midilint

use thiserror::Error;

use crate::pitch::PitchClass;

#[derive(Debug, Error)]
pub enum MidilintError {
    #[error("ticks per beat was {0} but must be divisible by 2")]
    InvalidTicksPerBeat(u16),
    #[error("precision was {0} but must be 1 or a positive even number")]
    InvalidPrecision(u32),
    #[error("a 1/{precision} beat grid does not fit in {ticks_per_beat} ticks per beat")]
    GridTooFine { ticks_per_beat: u16, precision: u32 },
    #[error("precision was {precision} but must divide {ticks_per_beat} ticks per beat evenly")]
    UnevenGrid { ticks_per_beat: u16, precision: u32 },
    #[error("velocity was {0} but must be between 0 and 127 (inclusive)")]
    InvalidVelocity(u8),
    #[error("Unknown pitch class: {0}")]
    UnknownPitchClass(String),
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Unknown key: {0} (expected <root>_<mode>, e.g. c_major)")]
    UnknownKey(String),
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
    /// The piece does not fit any key with its tonal center as root.
    #[error("Could not identify a key for the piece (tonal center {tonal_center})")]
    UnidentifiableKey { tonal_center: PitchClass },
    #[error("No {0} to summarize")]
    NoData(&'static str),
}

impl MidilintError {
    /// True for errors caused by invalid caller-supplied settings.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::UnidentifiableKey { .. } | Self::NoData(_))
    }
}

pub type Result<T> = std::result::Result<T, MidilintError>;
