// Melodic symbols: the states of the Markov model.
//
// A symbol is a (pitch, duration) pair. Pitch is either a pitch class 0-11
// or a rest. Durations live on the union of two rhythmic grids, sixteenth
// notes (n/4 beat) and sixteenth-note triplets (m/6 beat), so they are
// stored exactly as a whole number of twelfths of a beat. That keeps
// equality and hashing exact: two symbols decoded from different files
// compare equal whenever they denote the same grid value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch class or silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pitch {
    Rest,
    /// Pitch class 0-11 (0 = C).
    Class(u8),
}

impl Pitch {
    /// Numeric stand-in for a rest when a pitch is printed as an integer.
    pub const REST_SENTINEL: i32 = -1;

    /// Reduce any absolute or relative semitone value to its pitch class.
    pub fn from_semitone(semitone: i32) -> Self {
        Pitch::Class(semitone.rem_euclid(12) as u8)
    }

    pub fn is_rest(self) -> bool {
        matches!(self, Pitch::Rest)
    }

    /// Shift by a number of semitones, wrapping within the octave.
    /// Rests are unaffected.
    pub fn shifted(self, semitones: i32) -> Self {
        match self {
            Pitch::Rest => Pitch::Rest,
            Pitch::Class(pc) => Pitch::from_semitone(pc as i32 + semitones),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Pitch::Rest => Self::REST_SENTINEL,
            Pitch::Class(pc) => pc as i32,
        }
    }
}

/// A quantized duration in beats, counted in twelfths of a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Beats {
    twelfths: u32,
}

impl Beats {
    pub const ZERO: Beats = Beats { twelfths: 0 };
    pub const SIXTEENTH: Beats = Beats { twelfths: 3 };
    pub const TRIPLET_SIXTEENTH: Beats = Beats { twelfths: 2 };
    pub const EIGHTH: Beats = Beats { twelfths: 6 };
    pub const QUARTER: Beats = Beats { twelfths: 12 };

    /// `n` sixteenth notes (n/4 beat). Saturates at the longest
    /// representable duration.
    pub fn from_sixteenths(n: u32) -> Self {
        Beats {
            twelfths: n.saturating_mul(3),
        }
    }

    /// `m` sixteenth-note triplets (m/6 beat). Saturates like
    /// `from_sixteenths`.
    pub fn from_triplet_sixteenths(m: u32) -> Self {
        Beats {
            twelfths: m.saturating_mul(2),
        }
    }

    /// `n` sixteenth notes, or `None` if that does not fit.
    pub fn checked_from_sixteenths(n: u32) -> Option<Self> {
        n.checked_mul(3).map(|twelfths| Beats { twelfths })
    }

    /// `m` sixteenth-note triplets, or `None` if that does not fit.
    pub fn checked_from_triplet_sixteenths(m: u32) -> Option<Self> {
        m.checked_mul(2).map(|twelfths| Beats { twelfths })
    }

    pub fn twelfths(self) -> u32 {
        self.twelfths
    }

    pub fn as_f64(self) -> f64 {
        self.twelfths as f64 / 12.0
    }

    /// True when the duration is a whole number of triplet eighths (1/3 beat).
    pub fn is_third_multiple(self) -> bool {
        self.twelfths % 4 == 0
    }
}

impl fmt::Display for Beats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.twelfths % 3 == 0 {
            write!(f, "{}", self.as_f64())
        } else {
            write!(f, "{}/6", self.twelfths / 2)
        }
    }
}

/// One Markov state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub pitch: Pitch,
    pub duration: Beats,
}

impl Symbol {
    pub fn note(pitch_class: u8, duration: Beats) -> Self {
        Symbol {
            pitch: Pitch::from_semitone(pitch_class as i32),
            duration,
        }
    }

    pub fn rest(duration: Beats) -> Self {
        Symbol {
            pitch: Pitch::Rest,
            duration,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.pitch.as_i32(), self.duration)
    }
}
