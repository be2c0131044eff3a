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

use std::iter::zip;

use diversify_embedding::{Embedder, EmbedderError, NormalizedEmbedding};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    entity::{Entity, Interaction},
    fallback,
    features,
    preference::{Example, PreferenceModel},
};

/// The preference model is trained only with more interactions than this.
pub const MIN_INTERACTIONS: usize = 2;

/// The score of a failed prediction.
pub const NEUTRAL_PREDICTION: f32 = 0.5;

/// Maps a raw prediction from roughly `[-1, 1]` to the unit interval.
pub fn normalize_prediction(raw: f32) -> f32 {
    if raw.is_nan() {
        NEUTRAL_PREDICTION
    } else {
        ((raw + 1.) / 2.).clamp(0., 1.)
    }
}

/// The signal which is blended with the semantic similarity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Signal {
    /// The normalized prediction of a trained preference model.
    Personalized(f32),
    /// The lexical fallback score.
    Fallback(f32),
}

impl Signal {
    /// Blends the signal with the base similarity.
    pub fn blend(self, base: f32) -> f32 {
        match self {
            Self::Personalized(score) => 0.6 * base + 0.4 * score,
            Self::Fallback(score) => 0.7 * base + 0.3 * score,
        }
    }
}

/// Scores the relevance of entities for the preferences of one call.
pub(crate) struct RelevanceScorer<'a> {
    preferences: &'a [String],
    preference_embedding: NormalizedEmbedding,
    model: Box<dyn PreferenceModel + 'a>,
    personalized: bool,
}

impl<'a> RelevanceScorer<'a> {
    /// Embeds the preferences and trains the model if there are enough interactions.
    pub(crate) fn new(
        embedder: &impl Embedder,
        mut model: Box<dyn PreferenceModel + 'a>,
        preferences: &'a [String],
        interactions: &[Interaction],
    ) -> Result<Self, EmbedderError> {
        let preference_embedding = embedder.encode(&preferences.join(" "))?;

        let personalized = if interactions.len() <= MIN_INTERACTIONS {
            debug!(
                interactions = interactions.len(),
                "too few interactions to personalize",
            );
            false
        } else if !model.is_enabled() {
            info!("preference model is unavailable, falling back to lexical scoring");
            false
        } else {
            let texts = interactions
                .iter()
                .map(|interaction| features::extract(&interaction.entity))
                .collect_vec();
            let embeddings = embedder.encode_batch(&texts)?;
            let examples = zip(interactions, &embeddings)
                .map(|(interaction, embedding)| {
                    Example::training(interaction, embedding, preferences)
                })
                .collect_vec();
            model.train(&examples)
        };

        Ok(Self {
            preferences,
            preference_embedding,
            model,
            personalized,
        })
    }

    /// Whether the scores are blended with the preference model.
    pub(crate) fn is_personalized(&self) -> bool {
        self.personalized
    }

    pub(crate) fn preference_embedding(&self) -> &NormalizedEmbedding {
        &self.preference_embedding
    }

    /// Scores the relevance of an entity.
    pub(crate) fn score(&self, entity: &Entity, embedding: &NormalizedEmbedding) -> f32 {
        let base = embedding.cosine_similarity(&self.preference_embedding);

        let signal = if self.personalized {
            let example = Example::prediction(entity, embedding, self.preferences);
            let score = self.model.predict(&example).map_or_else(
                |error| {
                    warn!(%error, entity = %entity.name, "prediction failed, scoring neutral");
                    NEUTRAL_PREDICTION
                },
                normalize_prediction,
            );
            Signal::Personalized(score)
        } else {
            Signal::Fallback(fallback::score(entity, self.preferences))
        };

        let relevance = signal.blend(base);
        debug!(entity = %entity.name, base, ?signal, relevance, "scored relevance");

        relevance
    }
}
