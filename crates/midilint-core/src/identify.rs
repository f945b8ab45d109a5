//! Key identification and note statistics
//!
//! Pitch classes, their cumulative durations and velocities are tallied per
//! track and merged. The key is then chosen by brute force over all 84
//! candidates: a candidate matches when every used pitch class is one of its
//! degrees and its root is the tonal center (the class with the greatest
//! cumulative duration). Modes are tried in `Mode::ALL` order, so the first
//! match wins.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{MidilintError, Result};
use crate::piece::{Event, Piece, Track};
use crate::pitch::PitchClass;
use crate::scale::{Key, Mode};

/// Identified key, or just the tonal center when no key fits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum KeyLabel {
    Resolved(Key),
    Unresolved(PitchClass),
}

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(key) => write!(f, "{}", key),
            Self::Unresolved(center) => write!(f, "{}_?", center),
        }
    }
}

impl From<KeyLabel> for String {
    fn from(label: KeyLabel) -> Self {
        label.to_string()
    }
}

/// Summary of a piece as reported by `identify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    #[serde(rename = "type")]
    pub format: u8,
    pub ticks_per_beat: u16,
    pub note_duration_min: u32,
    pub note_duration_max: u32,
    pub velocity_min: u8,
    pub velocity_max: u8,
    pub velocity_mean: u8,
    pub velocity_median: u8,
    pub velocity_mode: u8,
    pub tonal_center: PitchClass,
    /// Used pitch classes sorted by name, rotated to start at the tonal center
    pub notes: Vec<&'static str>,
    pub key: KeyLabel,
    /// Display spelling of the key's degrees, when the key resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<&'static str>>,
}

/// Per-track aggregates, mergeable across tracks
#[derive(Debug, Clone, Default)]
struct Tally {
    /// Cumulative delta per pitch class, in first-seen order
    durations: Vec<(PitchClass, u64)>,
    /// Smallest nonzero delta
    duration_min: Option<u32>,
    duration_max: Option<u32>,
    velocities: Vec<u8>,
}

impl Tally {
    fn from_track(track: &Track) -> Self {
        let mut tally = Self::default();
        for event in &track.events {
            tally.add(event);
        }
        tally
    }

    fn add(&mut self, event: &Event) {
        let Some(note) = event.note() else { return };

        self.add_duration(PitchClass::of(note.pitch), event.delta as u64);
        if event.delta > 0 {
            self.duration_min = Some(self.duration_min.map_or(event.delta, |m| m.min(event.delta)));
        }
        self.duration_max = Some(self.duration_max.map_or(event.delta, |m| m.max(event.delta)));
        if event.is_sounding() {
            self.velocities.push(note.velocity);
        }
    }

    fn add_duration(&mut self, pc: PitchClass, ticks: u64) {
        match self.durations.iter_mut().find(|(class, _)| *class == pc) {
            Some((_, total)) => *total += ticks,
            None => self.durations.push((pc, ticks)),
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        for (pc, ticks) in other.durations {
            self.add_duration(pc, ticks);
        }
        self.duration_min = match (self.duration_min, other.duration_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.duration_max = match (self.duration_max, other.duration_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.velocities.extend(other.velocities);
        self
    }

    /// Class with the greatest cumulative duration; earliest seen wins ties
    fn tonal_center(&self) -> Option<PitchClass> {
        let mut best: Option<(PitchClass, u64)> = None;
        for &(pc, ticks) in &self.durations {
            if best.is_none_or(|(_, most)| ticks > most) {
                best = Some((pc, ticks));
            }
        }
        best.map(|(pc, _)| pc)
    }

    fn used(&self) -> Vec<PitchClass> {
        self.durations.iter().map(|&(pc, _)| pc).collect()
    }

    /// Tonal center and the key rooted at it, from durations alone
    fn key(&self) -> Result<(PitchClass, KeyLabel)> {
        let tonal_center = self.tonal_center().ok_or(MidilintError::NoData("note events"))?;
        let key = match find_key(&self.used(), tonal_center) {
            Some(key) => KeyLabel::Resolved(key),
            None => KeyLabel::Unresolved(tonal_center),
        };
        Ok((tonal_center, key))
    }
}

fn tally(piece: &Piece) -> Tally {
    piece
        .tracks
        .iter()
        .map(Tally::from_track)
        .fold(Tally::default(), Tally::merge)
}

struct VelocityStats {
    min: u8,
    max: u8,
    mean: u8,
    median: u8,
    mode: u8,
}

impl VelocityStats {
    fn from_velocities(velocities: &[u8]) -> Result<Self> {
        if velocities.is_empty() {
            return Err(MidilintError::NoData("velocities"));
        }

        let mut sorted = velocities.to_vec();
        sorted.sort_unstable();
        let sum: u32 = velocities.iter().map(|&v| v as u32).sum();

        let mut counts: HashMap<u8, usize> = HashMap::new();
        for &v in velocities {
            *counts.entry(v).or_default() += 1;
        }
        let mut mode = velocities[0];
        for &v in velocities {
            if counts[&v] > counts[&mode] {
                mode = v;
            }
        }

        Ok(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: (sum / velocities.len() as u32) as u8,
            median: sorted[sorted.len() / 2],
            mode,
        })
    }
}

/// First candidate key fitting all used classes and rooted at the tonal center
pub fn find_key(used: &[PitchClass], tonal_center: PitchClass) -> Option<Key> {
    Mode::ALL.into_iter().find_map(|mode| {
        PitchClass::ALL
            .into_iter()
            .map(|root| Key::new(root, mode))
            .find(|key| key.root == tonal_center && used.iter().all(|&pc| key.contains(pc)))
    })
}

/// Infer the key of a piece from pitch-class durations.
///
/// Velocities play no part, so silent note-ons still count. Fails with
/// `NoData` only when the piece has no note events.
pub fn infer_key(piece: &Piece) -> Result<KeyLabel> {
    let (_, key) = tally(piece).key()?;
    Ok(key)
}

/// Summarize a piece and infer its key.
///
/// Fails with `NoData` when the piece has no note events or no sounding
/// (nonzero-velocity) note-ons.
pub fn identify(piece: &Piece) -> Result<Identification> {
    let tally = tally(piece);
    let (tonal_center, key) = tally.key()?;
    let velocity = VelocityStats::from_velocities(&tally.velocities)?;

    let used = tally.used();
    tracing::info!(key = %key, classes = used.len(), "Identified key");

    let mut notes: Vec<&'static str> = used.iter().map(|pc| pc.name()).collect();
    notes.sort_unstable();
    if let Some(start) = notes.iter().position(|&name| name == tonal_center.name()) {
        notes.rotate_left(start);
    }

    let scale = match key {
        KeyLabel::Resolved(key) => Some(key.spelled()),
        KeyLabel::Unresolved(_) => None,
    };

    Ok(Identification {
        format: piece.format,
        ticks_per_beat: piece.ticks_per_beat,
        note_duration_min: tally.duration_min.unwrap_or(0),
        note_duration_max: tally.duration_max.unwrap_or(0),
        velocity_min: velocity.min,
        velocity_max: velocity.max,
        velocity_mean: velocity.mean,
        velocity_median: velocity.median,
        velocity_mode: velocity.mode,
        tonal_center,
        notes,
        key,
        scale,
    })
}
