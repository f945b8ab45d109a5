//! Whole-piece transforms
//!
//! Every transform validates its settings against the piece before touching
//! it, so a failed call leaves nothing half-applied. Transforms take the
//! piece by value and hand it back, which lets them chain.

mod align;
mod correct;
mod normalize;
mod transpose;

pub use align::{align, Align};
pub use correct::{correct_pitch, CorrectPitch, Strategy};
pub use normalize::{normalize, Normalize, DEFAULT_VELOCITY};
pub use transpose::{transpose, Transpose};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::piece::Piece;

/// Trait for piece transforms
pub trait Transform {
    fn name(&self) -> &str;
    fn apply(&self, piece: Piece) -> Result<Piece>;
}

/// Implements `Transform` for structs with `validate(&Piece) -> Result<()>`
/// and `process_impl(Piece) -> Piece`.
/// Usage: `impl_transform_boilerplate!(StructName, "name");`
macro_rules! impl_transform_boilerplate {
    ($ty:ty, $name:expr) => {
        impl super::Transform for $ty {
            fn name(&self) -> &str { $name }

            fn apply(&self, piece: Piece) -> Result<Piece> {
                self.validate(&piece)?;
                tracing::debug!(transform = $name, tracks = piece.tracks.len(), "Applying transform");
                Ok(self.process_impl(piece))
            }
        }
    };
}

pub(crate) use impl_transform_boilerplate;

/// Enum wrapper for all transforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PieceTransform {
    Normalize(Normalize),
    Align(Align),
    CorrectPitch(CorrectPitch),
    Transpose(Transpose),
}

impl PieceTransform {
    pub fn name(&self) -> &str {
        match self {
            Self::Normalize(t) => t.name(),
            Self::Align(t) => t.name(),
            Self::CorrectPitch(t) => t.name(),
            Self::Transpose(t) => t.name(),
        }
    }

    pub fn apply(&self, piece: Piece) -> Result<Piece> {
        match self {
            Self::Normalize(t) => t.apply(piece),
            Self::Align(t) => t.apply(piece),
            Self::CorrectPitch(t) => t.apply(piece),
            Self::Transpose(t) => t.apply(piece),
        }
    }
}

/// Ordered transforms applied one after another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformChain {
    pub steps: Vec<PieceTransform>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, step: PieceTransform) {
        self.steps.push(step);
    }

    /// Apply every step in order, stopping at the first error
    pub fn apply(&self, mut piece: Piece) -> Result<Piece> {
        for step in &self.steps {
            piece = step.apply(piece)?;
        }
        Ok(piece)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MidilintError;
    use crate::fixtures;
    use crate::scale::Key;

    #[test]
    fn test_chain_applies_in_order() {
        let mut chain = TransformChain::new();
        chain.add(PieceTransform::Normalize(Normalize::new(90)));
        chain.add(PieceTransform::CorrectPitch(CorrectPitch::new(
            "c_major".parse::<Key>().unwrap(),
            Strategy::ShiftUp,
        )));
        assert_eq!(chain.len(), 2);

        let piece = chain.apply(fixtures::chromatic_run()).unwrap();
        let pitches: Vec<u8> = piece.note_events().map(|e| e.note().unwrap().pitch).collect();
        assert_eq!(&pitches[..6], &[60, 60, 62, 62, 62, 62]);
        assert!(piece.note_events().all(|e| e.note().unwrap().velocity == 90));
    }

    #[test]
    fn test_chain_stops_at_first_error() {
        let mut chain = TransformChain::new();
        chain.add(PieceTransform::Align(Align::new(3)));
        chain.add(PieceTransform::Normalize(Normalize::new(1)));

        assert!(matches!(
            chain.apply(fixtures::chromatic_run()),
            Err(MidilintError::InvalidPrecision(3))
        ));
    }

    #[test]
    fn test_deserialize_tagged_steps() {
        let json = r#"{"steps": [
            {"type": "normalize", "velocity": 100},
            {"type": "align", "precision": 2},
            {"type": "correct_pitch", "key": "e_phrygian", "strategy": "shift_down"},
            {"type": "transpose", "key": "g_mixolydian"}
        ]}"#;
        let chain: TransformChain = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = chain.steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["normalize", "align", "correct_pitch", "transpose"]);
        assert_eq!(
            chain.steps[2],
            PieceTransform::CorrectPitch(CorrectPitch::new("e_phrygian".parse().unwrap(), Strategy::ShiftDown))
        );
    }
}
