// Swing Solo Generator
//
// Learns a first-order Markov model from a corpus of monophonic MIDI
// performances and samples it to write a new solo in any key and tempo.
// Each note is reduced to a symbol: its pitch class relative to the
// performance's key plus its length snapped to a sixteenth or
// sixteenth-triplet grid. Gaps between notes become rest symbols.
//
// Architecture:
// - symbol.rs: Pitch / Beats / Symbol value types (exact grid durations)
// - quantize.rs: seconds-at-tempo to grid duration
// - key.rs: pitch-name table, keys, normalization offsets, transposition
// - decode.rs: MIDI bytes to symbols (tempo tracking, rest insertion)
// - markov.rs: state index, smoothed transition matrix, sampler with
//   fallback for states that never lead anywhere
// - encode.rs: symbols to MIDI bytes
// - corpus.rs: training-file discovery, filename key inference, parallel load
// - config.rs: JSON-loadable generator settings
// - session.rs: one request end to end (validate, train, generate, write)
// - error.rs: error kinds shared by all of the above
//
// Generation is deterministic given a seed.

pub mod config;
pub mod corpus;
pub mod decode;
pub mod encode;
pub mod error;
pub mod key;
pub mod markov;
pub mod quantize;
pub mod session;
pub mod symbol;

pub use error::{Result, SoloError};
pub use symbol::{Beats, Pitch, Symbol};
