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

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{
    embedder::{Embedder, EmbedderError},
    embedding::{Embedding1, NormalizedEmbedding},
};

/// Configurations of the hashing embedder.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
#[must_use]
pub struct Config {
    dimension: usize,
}

impl Default for Config {
    fn default() -> Self {
        // same size as the sentence embeddings the engine was tuned with
        Self { dimension: 384 }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), EmbedderError> {
        if self.dimension == 0 {
            return Err(EmbedderError::Size(self.dimension));
        }

        Ok(())
    }

    /// The size of the embeddings.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Sets the size of the embeddings.
    ///
    /// # Errors
    /// Fails if the size is zero.
    pub fn with_dimension(mut self, dimension: usize) -> Result<Self, EmbedderError> {
        self.dimension = dimension;
        self.validate()?;

        Ok(self)
    }

    /// Creates a hashing embedder.
    pub fn build(&self) -> Result<HashingEmbedder, EmbedderError> {
        self.validate()?;

        Ok(HashingEmbedder {
            dimension: self.dimension,
        })
    }
}

/// An embedder based on feature hashing.
///
/// Each lower-cased word of a text and each character trigram of the words is hashed into one of
/// `dimension` buckets, words weighing twice as much as trigrams. Texts sharing words or word
/// parts are similar. The embeddings are deterministic for a given build.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dimension: usize,
}

const WORD_WEIGHT: f32 = 2.;
const TRIGRAM_WEIGHT: f32 = 1.;

impl HashingEmbedder {
    fn bucket(&self, feature: &impl Hash) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hasher.finish() % self.dimension as u64) as usize;
        bucket
    }
}

impl Embedder for HashingEmbedder {
    fn embedding_size(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
        let mut embedding = Array1::<f32>::zeros(self.dimension);
        let text = text.to_lowercase();

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            embedding[self.bucket(&word)] += WORD_WEIGHT;

            let padded = format!(" {word} ").chars().collect_vec();
            for trigram in padded.windows(3) {
                embedding[self.bucket(&trigram)] += TRIGRAM_WEIGHT;
            }
        }

        Embedding1::from(embedding)
            .normalize()
            .map_err(EmbedderError::from)
    }
}
