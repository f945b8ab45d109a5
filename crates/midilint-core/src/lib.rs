//! midilint-core: music-theory transforms over decoded MIDI pieces

pub mod error;
pub mod identify;
pub mod piece;
pub mod pitch;
pub mod scale;
pub mod transform;

#[cfg(test)]
mod fixtures;

pub use error::{MidilintError, Result};
pub use identify::{identify, infer_key, Identification, KeyLabel};
pub use piece::{Event, EventKind, Note, Piece, Track};
pub use pitch::PitchClass;
pub use scale::{Key, Mode};
pub use transform::{
    align, correct_pitch, normalize, transpose, Align, CorrectPitch, Normalize, PieceTransform,
    Strategy, Transform, TransformChain, Transpose,
};
