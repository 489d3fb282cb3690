// Generator configuration.
//
// Everything the pipeline needs beyond the per-request choices (key, tempo,
// scale, bar count) lives in `GeneratorConfig`: where the corpus and output
// live, the smoothing constant, how output MIDI is laid out, and an
// optional RNG seed. Loaded from JSON; any field left out of the file takes
// its default, so `{}` is a valid config.

use crate::encode::{EncodeOptions, TICKS_PER_QUARTER};
use crate::error::{Result, SoloError};
use crate::markov::DEFAULT_SMOOTHING;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory of training MIDI files.
    pub corpus_dir: PathBuf,
    /// Directory generated files are written to. Created if missing.
    pub output_dir: PathBuf,
    /// Additive smoothing constant for the transition matrix.
    pub smoothing: f64,
    /// Symbols generated per requested bar.
    pub symbols_per_bar: usize,
    pub ticks_per_beat: u16,
    /// MIDI note that pitch class 0 (C) is written as.
    pub base_note: u8,
    pub velocity: u8,
    /// Fixed seed for reproducible output; fresh entropy when absent.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            corpus_dir: PathBuf::from("midi_files"),
            output_dir: PathBuf::from("midi_creations"),
            smoothing: DEFAULT_SMOOTHING,
            symbols_per_bar: 32,
            ticks_per_beat: TICKS_PER_QUARTER,
            base_note: 60,
            velocity: 100,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SoloError::NotFound(path.to_path_buf()),
            _ => SoloError::Io(e),
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SoloError::InvalidParameter(msg));
        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return invalid(format!("smoothing must be >= 0, got {}", self.smoothing));
        }
        if self.symbols_per_bar == 0 {
            return invalid("symbols_per_bar must be positive".into());
        }
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7fff {
            return invalid(format!("ticks_per_beat must be in 1..=32767, got {}", self.ticks_per_beat));
        }
        if self.base_note > 116 {
            return invalid(format!("base_note must be at most 116, got {}", self.base_note));
        }
        if self.velocity == 0 || self.velocity > 127 {
            return invalid(format!("velocity must be in 1..=127, got {}", self.velocity));
        }
        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            ticks_per_beat: self.ticks_per_beat,
            base_note: self.base_note,
            velocity: self.velocity,
        }
    }
}
