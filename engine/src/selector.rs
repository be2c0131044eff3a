// Copyright 2023 Xayn AG
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Greedy maximal marginal relevance selection.

use diversify_embedding::NormalizedEmbedding;

/// The lambda parameter of the diversity phase.
pub const DIVERSITY_LAMBDA: f32 = 0.3;

/// Computes the maximal marginal relevance of a candidate.
///
/// The maximal similarity is the highest cosine similarity to any selected entity, `0` if
/// nothing is selected yet.
pub fn mmr_score(lambda: f32, relevance: f32, max_similarity: f32) -> f32 {
    lambda * relevance - (1. - lambda) * max_similarity
}

/// The progress of a selection, every index of the pool is either selected or remaining.
#[derive(Clone, Debug)]
pub struct SelectionState {
    selected: Vec<usize>,
    remaining: Vec<usize>,
}

impl SelectionState {
    /// Starts a selection from a pool of `len` entities.
    pub fn new(len: usize) -> Self {
        Self {
            selected: Vec::with_capacity(len),
            remaining: (0..len).collect(),
        }
    }

    /// The selected indices in selection order.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// The remaining indices in input order.
    pub fn remaining(&self) -> &[usize] {
        &self.remaining
    }

    /// Checks that the selected and remaining indices partition `0..len`.
    pub fn is_partition_of(&self, len: usize) -> bool {
        let mut seen = vec![false; len];
        self.selected.len() + self.remaining.len() == len
            && self
                .selected
                .iter()
                .chain(&self.remaining)
                .all(|&index| index < len && !std::mem::replace(&mut seen[index], true))
    }

    fn max_similarity(&self, candidate: usize, embeddings: &[NormalizedEmbedding]) -> f32 {
        if self.selected.is_empty() {
            return 0.;
        }
        self.selected
            .iter()
            .map(|&selected| embeddings[candidate].cosine_similarity(&embeddings[selected]))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Moves the remaining candidate with the highest score to the selection.
    ///
    /// Ties are won by the candidate which comes first in the pool and a NaN score never wins
    /// over a finite one. Returns the selected index or `None` if nothing remains.
    pub fn select_next(
        &mut self,
        relevances: &[f32],
        embeddings: &[NormalizedEmbedding],
        lambda: f32,
    ) -> Option<usize> {
        let mut best = None;
        for (position, &candidate) in self.remaining.iter().enumerate() {
            let score = mmr_score(
                lambda,
                relevances[candidate],
                self.max_similarity(candidate, embeddings),
            );
            let score = if score.is_nan() {
                f32::NEG_INFINITY
            } else {
                score
            };
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((position, score));
            }
        }

        let (position, _) = best?;
        let selected = self.remaining.remove(position);
        self.selected.push(selected);
        debug_assert!(self.is_partition_of(relevances.len()));

        Some(selected)
    }

    /// The selected indices in selection order.
    pub fn into_selected(self) -> Vec<usize> {
        self.selected
    }
}

/// Selects up to `n_total` indices from the pool in two phases.
///
/// The high affinity phase selects `n_high_affinity` entities with the given lambda parameter,
/// the diversity phase fills the remaining slots with [`DIVERSITY_LAMBDA`]. The relevances and
/// embeddings are indexed alike.
pub fn select(
    relevances: &[f32],
    embeddings: &[NormalizedEmbedding],
    n_total: usize,
    n_high_affinity: usize,
    lambda: f32,
) -> Vec<usize> {
    debug_assert_eq!(relevances.len(), embeddings.len());
    let n_total = n_total.min(relevances.len());

    let mut state = SelectionState::new(relevances.len());
    for _ in 0..n_high_affinity.min(n_total) {
        state.select_next(relevances, embeddings, lambda);
    }
    while state.selected().len() < n_total
        && state
            .select_next(relevances, embeddings, DIVERSITY_LAMBDA)
            .is_some()
    {}

    state.into_selected()
}
