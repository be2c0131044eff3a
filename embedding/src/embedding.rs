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

use derive_more::{Deref, From};
use displaydoc::Display;
use ndarray::Array1;
use thiserror::Error;

/// A 1-dimensional sequence embedding of shape `(embedding_size,)`.
#[derive(Clone, Debug, Default, Deref, From, PartialEq)]
pub struct Embedding1(Array1<f32>);

/// A normalized embedding.
///
/// The embedding has unit length, except for the embedding of a text without any features which
/// stays the zero vector.
#[derive(Clone, Debug, Deref, PartialEq)]
pub struct NormalizedEmbedding(Embedding1);

#[derive(Clone, Debug, Display, Error)]
/// Values don't represent a valid embedding.
pub struct InvalidEmbedding;

impl Embedding1 {
    pub fn normalize(mut self) -> Result<NormalizedEmbedding, InvalidEmbedding> {
        let norm = self.0.dot(&self.0).sqrt();
        if !norm.is_finite() {
            return Err(InvalidEmbedding);
        }

        if norm > 0. {
            self.0 /= norm;
        } else {
            self.0 = Array1::zeros(self.len());
        }

        Ok(NormalizedEmbedding(self))
    }
}

impl From<Vec<f32>> for Embedding1 {
    fn from(vec: Vec<f32>) -> Self {
        Array1::from_vec(vec).into()
    }
}

impl<const N: usize> From<[f32; N]> for Embedding1 {
    fn from(array: [f32; N]) -> Self {
        Vec::from(array).into()
    }
}

impl NormalizedEmbedding {
    /// Computes the cosine similarity to another embedding of the same size.
    ///
    /// The value is bounded in `[-1, 1]`. The similarity to the zero vector is `0`.
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        debug_assert_eq!(self.len(), other.len());
        self.dot(&other.0 .0).clamp(-1., 1.)
    }
}

impl TryFrom<Vec<f32>> for NormalizedEmbedding {
    type Error = InvalidEmbedding;

    fn try_from(vec: Vec<f32>) -> Result<Self, Self::Error> {
        Embedding1::from(vec).normalize()
    }
}

impl<const N: usize> TryFrom<[f32; N]> for NormalizedEmbedding {
    type Error = InvalidEmbedding;

    fn try_from(array: [f32; N]) -> Result<Self, Self::Error> {
        Embedding1::from(array).normalize()
    }
}
