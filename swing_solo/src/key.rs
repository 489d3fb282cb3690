// Keys, pitch names and transposition.
//
// Training material comes in many keys. Before training, every performance
// is normalized into one shared pitch-class space whose reference is
// C major (and its relative minor, A minor): a piece in key K has
// `Key::offset()` added to every pitch. After generation the melody is moved
// to the requested key by adding `Key::shift()`, the inverse of the offset,
// so normalizing and then transposing to the same key is the identity on
// pitch classes.
//
// The pitch-name table is static read-only data. Both sharp and flat
// spellings are accepted; names are case-normalized first so `bb`, `BB` and
// `Bb` all mean B-flat.

use crate::error::{Result, SoloError};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Pitch name to semitone above C.
static PITCH_NAMES: [(&str, u8); 17] = [
    ("C", 0),
    ("C#", 1),
    ("Db", 1),
    ("D", 2),
    ("D#", 3),
    ("Eb", 3),
    ("E", 4),
    ("F", 5),
    ("F#", 6),
    ("Gb", 6),
    ("G", 7),
    ("G#", 8),
    ("Ab", 8),
    ("A", 9),
    ("A#", 10),
    ("Bb", 10),
    ("B", 11),
];

/// Semitones from a minor key's tonic up to its relative major.
const RELATIVE_MAJOR: u8 = 3;

/// All accepted pitch names, in table order.
pub fn pitch_names() -> impl Iterator<Item = &'static str> {
    PITCH_NAMES.iter().map(|&(name, _)| name)
}

/// Canonical spelling: upper-case letter, lower-case `b` for flats.
pub fn normalize_pitch_name(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(letter) => {
            let mut out = letter.to_ascii_uppercase().to_string();
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
            out
        }
        None => String::new(),
    }
}

/// Look up a pitch name, returning the table's spelling and its semitone.
fn lookup(name: &str) -> Result<(&'static str, u8)> {
    let normalized = normalize_pitch_name(name);
    PITCH_NAMES
        .iter()
        .find(|&&(n, _)| n == normalized)
        .copied()
        .ok_or_else(|| SoloError::UnknownKey(name.to_string()))
}

/// Semitone above C for a pitch name such as `"F#"` or `"Db"`.
pub fn pitch_semitone(name: &str) -> Result<u8> {
    lookup(name).map(|(_, semitone)| semitone)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Major,
    Minor,
}

impl ScaleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleType {
    type Err = SoloError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(ScaleType::Major),
            "minor" => Ok(ScaleType::Minor),
            other => Err(SoloError::InvalidParameter(format!(
                "scale type must be 'major' or 'minor', got '{other}'"
            ))),
        }
    }
}

/// A tonic plus a scale type, e.g. B-flat major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    root_name: &'static str,
    root: u8,
    pub scale: ScaleType,
}

impl Key {
    pub fn new(root_name: &str, scale: ScaleType) -> Result<Self> {
        let (root_name, root) = lookup(root_name)?;
        Ok(Key {
            root_name,
            root,
            scale,
        })
    }

    /// Parse `"Bb"`, `"Bb major"`, `"g minor"` or `"F#_minor"`. A bare root
    /// is a major key.
    pub fn parse(name: &str) -> Result<Self> {
        let unknown = || SoloError::UnknownKey(name.to_string());
        let mut parts = name.split(|c: char| c == '_' || c.is_whitespace()).filter(|p| !p.is_empty());
        let root = parts.next().ok_or_else(unknown)?;
        let scale = match parts.next() {
            None => ScaleType::Major,
            Some(word) => word.parse().map_err(|_| unknown())?,
        };
        if parts.next().is_some() {
            return Err(unknown());
        }
        Key::new(root, scale).map_err(|_| unknown())
    }

    pub fn root_name(&self) -> &'static str {
        self.root_name
    }

    /// Semitone of the tonic above C.
    pub fn root(&self) -> u8 {
        self.root
    }

    /// Semitones to add to move this key onto C major / A minor, in `-11..=0`.
    pub fn offset(&self) -> i8 {
        let major_root = match self.scale {
            ScaleType::Major => self.root,
            ScaleType::Minor => (self.root + RELATIVE_MAJOR) % 12,
        };
        -(major_root as i8)
    }

    /// Semitones to add to move C major / A minor material into this key.
    pub fn shift(&self) -> i32 {
        -(self.offset() as i32)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root_name, self.scale)
    }
}

/// Decode-time normalization offset for a key name.
pub fn resolve_offset(key_name: &str) -> Result<i8> {
    Key::parse(key_name).map(|key| key.offset())
}

/// Infer the key from a `..._<Note>_<major|minor>.mid` file name.
pub fn key_from_filename(path: &Path) -> Option<Key> {
    let stem = path.file_stem()?.to_str()?;
    let mut tokens = stem.rsplit('_');
    let scale: ScaleType = tokens.next()?.parse().ok()?;
    let root = tokens.next()?;
    Key::new(root, scale).ok()
}

/// Move normalized symbols into `key`. Rests pass through.
pub fn transpose_to(symbols: &[Symbol], key: &Key) -> Vec<Symbol> {
    let shift = key.shift();
    symbols
        .iter()
        .map(|s| Symbol {
            pitch: s.pitch.shifted(shift),
            duration: s.duration,
        })
        .collect()
}

/// Move normalized symbols into the key named by `target`.
pub fn transpose(symbols: &[Symbol], target: &str) -> Result<Vec<Symbol>> {
    let key = Key::parse(target)?;
    Ok(transpose_to(symbols, &key))
}
