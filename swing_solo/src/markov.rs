// First-order Markov model over melodic symbols.
//
// Built in two phases so that the call order is enforced by the types:
// - StateIndex: the dictionary of distinct states, ids assigned in
//   first-seen order. Built once from the whole training corpus.
// - MarkovModel: produced by `StateIndex::train`, owns the index, the
//   smoothed N x N transition matrix and the per-state source counts.
//   Immutable; `generate` can be called any number of times.
//
// Smoothing is additive: a row with at least one observed transition
// becomes `(count + k) / (row_total + k * N)`. A row with no observed
// transitions (a state only ever seen last) stays all-zero, and sampling
// from it falls back to the distribution of source counts over all states,
// so generation never gets stuck.
//
// Sampling walks precomputed cumulative distributions with a binary search.
// The index order is fixed, so a seeded RNG reproduces the same sequence.

use crate::error::{Result, SoloError};
use rand::Rng;
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Default additive smoothing constant.
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Dense ids for the distinct states of a corpus.
#[derive(Debug, Clone)]
pub struct StateIndex<S> {
    states: Vec<S>,
    ids: FxHashMap<S, usize>,
}

impl<S: Clone + Eq + Hash + Debug> StateIndex<S> {
    pub fn build(symbols: &[S]) -> Self {
        let mut index = StateIndex {
            states: Vec::new(),
            ids: FxHashMap::default(),
        };
        index.extend(symbols);
        index
    }

    /// Add any unseen states. Existing ids never change.
    pub fn extend(&mut self, symbols: &[S]) {
        for symbol in symbols {
            if !self.ids.contains_key(symbol) {
                self.ids.insert(symbol.clone(), self.states.len());
                self.states.push(symbol.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn id(&self, state: &S) -> Option<usize> {
        self.ids.get(state).copied()
    }

    /// States in id order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    fn require(&self, state: &S) -> Result<usize> {
        self.id(state)
            .ok_or_else(|| SoloError::UnknownState(format!("{state:?}")))
    }

    /// Count the adjacent pairs of `symbols` and smooth with `k`.
    pub fn train(self, symbols: &[S], k: f64) -> Result<MarkovModel<S>> {
        if !k.is_finite() || k < 0.0 {
            return Err(SoloError::InvalidParameter(format!(
                "smoothing constant must be a non-negative number, got {k}"
            )));
        }

        let n = self.len();
        let mut matrix = vec![0.0; n * n];
        let mut source_counts = vec![0u64; n];

        let ids = symbols
            .iter()
            .map(|s| self.require(s))
            .collect::<Result<Vec<usize>>>()?;
        for pair in ids.windows(2) {
            matrix[pair[0] * n + pair[1]] += 1.0;
            source_counts[pair[0]] += 1;
        }

        for (row, &total) in matrix.chunks_mut(n.max(1)).zip(&source_counts) {
            if total == 0 {
                continue;
            }
            let denominator = total as f64 + k * n as f64;
            for cell in row.iter_mut() {
                *cell = (*cell + k) / denominator;
            }
        }

        let cumulative = matrix.chunks(n.max(1)).flat_map(cumulate).collect();

        let total_sources: u64 = source_counts.iter().sum();
        let fallback_weights: Vec<f64> = if total_sources > 0 {
            source_counts
                .iter()
                .map(|&c| c as f64 / total_sources as f64)
                .collect()
        } else {
            vec![1.0 / n.max(1) as f64; n]
        };
        let fallback_cumulative = cumulate(&fallback_weights).collect();

        log::debug!(
            "trained Markov model: {n} states, {} transitions, smoothing k={k}",
            total_sources
        );

        Ok(MarkovModel {
            index: self,
            matrix,
            cumulative,
            source_counts,
            fallback: fallback_weights,
            fallback_cumulative,
        })
    }
}

/// A trained, immutable transition model.
#[derive(Debug, Clone)]
pub struct MarkovModel<S> {
    index: StateIndex<S>,
    /// Row-major N x N transition probabilities.
    matrix: Vec<f64>,
    /// Per-row running sums of `matrix`.
    cumulative: Vec<f64>,
    source_counts: Vec<u64>,
    /// Normalized source counts (uniform if there were no transitions).
    fallback: Vec<f64>,
    fallback_cumulative: Vec<f64>,
}

impl<S: Clone + Eq + Hash + Debug> MarkovModel<S> {
    pub fn index(&self) -> &StateIndex<S> {
        &self.index
    }

    pub fn num_states(&self) -> usize {
        self.index.len()
    }

    /// Transition probabilities out of state `id`.
    pub fn row(&self, id: usize) -> &[f64] {
        let n = self.num_states();
        &self.matrix[id * n..(id + 1) * n]
    }

    pub fn probability(&self, from: &S, to: &S) -> Result<f64> {
        let from = self.index.require(from)?;
        let to = self.index.require(to)?;
        Ok(self.row(from)[to])
    }

    /// How often `state` was the source of an observed transition.
    pub fn source_count(&self, state: &S) -> Result<u64> {
        Ok(self.source_counts[self.index.require(state)?])
    }

    /// True when `id` had no outgoing transitions in training.
    pub fn is_absorbing(&self, id: usize) -> bool {
        self.source_counts[id] == 0
    }

    /// The distribution the next symbol is drawn from when at `state`.
    pub fn next_distribution(&self, state: &S) -> Result<Vec<f64>> {
        let id = self.index.require(state)?;
        if self.is_absorbing(id) {
            Ok(self.fallback.clone())
        } else {
            Ok(self.row(id).to_vec())
        }
    }

    fn next_id<R: Rng + ?Sized>(&self, id: usize, rng: &mut R) -> usize {
        let n = self.num_states();
        let cdf = if self.is_absorbing(id) {
            &self.fallback_cumulative[..]
        } else {
            &self.cumulative[id * n..(id + 1) * n]
        };
        sample_cumulative(cdf, rng.random::<f64>())
    }

    /// Sample `length` states. Starts from `start` if given, otherwise from
    /// a uniformly chosen state.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        length: usize,
        start: Option<&S>,
        rng: &mut R,
    ) -> Result<Vec<S>> {
        if self.index.is_empty() {
            return Err(SoloError::NotTrained);
        }
        if length == 0 {
            return Err(SoloError::InvalidParameter(
                "sequence length must be at least 1".into(),
            ));
        }

        let mut current = match start {
            Some(state) => self.index.require(state)?,
            None => rng.random_range(0..self.num_states()),
        };

        let states = self.index.states();
        let mut sequence = Vec::with_capacity(length);
        sequence.push(states[current].clone());
        for _ in 1..length {
            current = self.next_id(current, rng);
            sequence.push(states[current].clone());
        }
        Ok(sequence)
    }
}

fn cumulate(weights: &[f64]) -> impl Iterator<Item = f64> + '_ {
    weights.iter().scan(0.0, |acc, &w| {
        *acc += w;
        Some(*acc)
    })
}

/// Index of the first entry whose running sum exceeds `r * total`.
fn sample_cumulative(cdf: &[f64], r: f64) -> usize {
    let total = cdf.last().copied().unwrap_or(0.0);
    let target = r * total;
    cdf.partition_point(|&c| c <= target).min(cdf.len().saturating_sub(1))
}
