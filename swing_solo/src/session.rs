// One generation request, end to end.
//
// Pipeline: validate request -> find training files for the scale ->
// decode corpus -> index states -> train -> sample 32 symbols per bar ->
// transpose into the requested key -> write MIDI.
//
// Request parameters are checked before any file is touched. The output
// file name is derived from the request alone, so repeating a request
// overwrites the previous result.

use crate::config::GeneratorConfig;
use crate::corpus::{load_corpus, training_files};
use crate::encode::{tempo_micros, write_midi};
use crate::error::{Result, SoloError};
use crate::key::{Key, ScaleType, pitch_names, transpose_to};
use crate::markov::StateIndex;
use rand::Rng;
use std::path::PathBuf;

/// What the caller asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Tonic of the output, e.g. `"Bb"`.
    pub key: String,
    pub tempo_bpm: u32,
    pub scale: ScaleType,
    pub bars: u32,
}

impl GenerationRequest {
    /// Check the request and resolve its key.
    pub fn validate(&self) -> Result<Key> {
        tempo_micros(self.tempo_bpm)?;
        if self.bars == 0 {
            return Err(SoloError::InvalidParameter("bar count must be a positive integer".into()));
        }
        Key::new(&self.key, self.scale).map_err(|_| {
            SoloError::InvalidParameter(format!(
                "invalid key '{}'; expected one of: {}",
                self.key,
                pitch_names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// `{key}_{scale}_{tempo}_{bars}.mid`
    pub fn file_name(&self, key: &Key) -> String {
        format!("{}_{}_{}_{}.mid", key.root_name(), self.scale, self.tempo_bpm, self.bars)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub corpus_files: usize,
    pub corpus_symbols: usize,
    pub model_states: usize,
    pub generated_symbols: usize,
}

/// Run one request against `config`.
pub fn run<R: Rng + ?Sized>(
    request: &GenerationRequest,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<GenerationReport> {
    let key = request.validate()?;
    config.validate()?;

    let files = training_files(&config.corpus_dir, request.scale)?;
    let corpus = load_corpus(files)?;

    let index = StateIndex::build(&corpus.symbols);
    let model = index.train(&corpus.symbols, config.smoothing)?;
    log::info!("trained on {} states", model.num_states());

    let length = config.symbols_per_bar * request.bars as usize;
    let generated = model.generate(length, None, rng)?;
    let melody = transpose_to(&generated, &key);

    std::fs::create_dir_all(&config.output_dir)?;
    let output_path = config.output_dir.join(request.file_name(&key));
    write_midi(&melody, request.tempo_bpm, &config.encode_options(), &output_path)?;

    Ok(GenerationReport {
        output_path,
        corpus_files: corpus.files.len(),
        corpus_symbols: corpus.symbols.len(),
        model_states: model.num_states(),
        generated_symbols: melody.len(),
    })
}
