// Error kinds for the solo generator.
//
// Every fallible operation in the crate returns `Result<T>`. Codec and model
// failures carry enough context to be rendered directly to a user by the
// CLI; corpus-level failures wrap the per-file error together with the
// offending path so a bad training file is never silently skipped.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SoloError>;

#[derive(Debug, Error)]
pub enum SoloError {
    /// A training file or corpus directory does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The byte stream is not a usable Standard MIDI File.
    #[error("could not decode MIDI data: {0}")]
    Decode(String),

    /// A key or pitch name that is not in the pitch-name table.
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// No key was supplied and none could be inferred from the file name.
    #[error("no key found in file name '{}' (expected ..._<Note>_<major|minor>.mid)", .0.display())]
    KeyResolution(PathBuf),

    /// The corpus directory holds no training files for the requested scale.
    #[error("no {scale} MIDI files found in '{}'", dir.display())]
    EmptyCorpus { scale: String, dir: PathBuf },

    /// The model has no states to sample from.
    #[error("Markov model has not been trained on any states")]
    NotTrained,

    /// A symbol that is not part of the trained state index.
    #[error("state {0} is not in the model's state index")]
    UnknownState(String),

    /// A request or configuration value outside its accepted range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single corpus file failed; the whole build fails with it.
    #[error("{}: {source}", path.display())]
    CorpusFile {
        path: PathBuf,
        #[source]
        source: Box<SoloError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl SoloError {
    /// Attach a corpus file path to a per-file failure.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        SoloError::CorpusFile {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
