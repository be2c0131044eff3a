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

use displaydoc::Display;
use thiserror::Error;

use crate::embedding::{InvalidEmbedding, NormalizedEmbedding};

/// The potential errors of an [`Embedder`].
#[derive(Debug, Display, Error)]
pub enum EmbedderError {
    /// Invalid embedding size {0}, expected a positive value
    Size(usize),
    /// Embedding size mismatch, expected {expected} but got {got}
    SizeMismatch { expected: usize, got: usize },
    /// The embedder produced an invalid embedding: {0}
    Invalid(#[from] InvalidEmbedding),
}

/// Computes embeddings of texts.
///
/// All embeddings of one embedder have the same size and are comparable via
/// [`NormalizedEmbedding::cosine_similarity()`].
pub trait Embedder {
    /// Gets the size of the computed embeddings.
    fn embedding_size(&self) -> usize;

    /// Computes the embedding of a text.
    fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError>;

    /// Computes the embeddings of the texts, in the same order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<NormalizedEmbedding>, EmbedderError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

impl<E> Embedder for &E
where
    E: Embedder + ?Sized,
{
    fn embedding_size(&self) -> usize {
        (**self).embedding_size()
    }

    fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<NormalizedEmbedding>, EmbedderError> {
        (**self).encode_batch(texts)
    }
}

impl<E> Embedder for Box<E>
where
    E: Embedder + ?Sized,
{
    fn embedding_size(&self) -> usize {
        (**self).embedding_size()
    }

    fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<NormalizedEmbedding>, EmbedderError> {
        (**self).encode_batch(texts)
    }
}
