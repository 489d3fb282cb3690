// Training corpus discovery and loading.
//
// A corpus is a directory of MIDI files whose names end in a key token,
// e.g. `JustFriends_Bb_major.mid`. Files are selected by scale type (the
// word `major` or `minor` in the name), sorted by path, decoded in parallel
// and concatenated in sorted order, so the training sequence does not
// depend on thread scheduling.
//
// A single bad file fails the whole load; the error names the file.

use crate::decode::decode_file;
use crate::error::{Result, SoloError};
use crate::key::ScaleType;
use crate::symbol::Symbol;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

fn is_midi_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
}

/// MIDI files in `dir` whose name mentions `scale`, sorted by path.
pub fn training_files(dir: &Path, scale: ScaleType) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SoloError::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches_scale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.to_lowercase().contains(scale.as_str()));
        if matches_scale && is_midi_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(SoloError::EmptyCorpus {
            scale: scale.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    log::info!("found {} {scale} training files in {}", files.len(), dir.display());
    Ok(files)
}

/// Decoded training material.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub files: Vec<PathBuf>,
    /// Symbols of every file, concatenated in file order.
    pub symbols: Vec<Symbol>,
}

/// Decode `files` in parallel, keys inferred from their names.
pub fn load_corpus(files: Vec<PathBuf>) -> Result<Corpus> {
    let per_file = files
        .par_iter()
        .map(|path| decode_file(path, None).map_err(|e| e.in_file(path)))
        .collect::<Result<Vec<Vec<Symbol>>>>()?;

    let symbols: Vec<Symbol> = per_file.into_iter().flatten().collect();
    log::info!("corpus: {} symbols from {} files", symbols.len(), files.len());
    Ok(Corpus { files, symbols })
}
