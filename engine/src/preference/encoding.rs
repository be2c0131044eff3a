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

use std::fmt;

use diversify_embedding::NormalizedEmbedding;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::entity::{Entity, Interaction};

/// The reward of a liked entity.
pub const LIKED_REWARD: f32 = 1.;

/// The reward of an entity which wasn't liked.
pub const DISLIKED_REWARD: f32 = -0.5;

/// The number of leading embedding dimensions which become features.
const EMBEDDING_FEATURES: usize = 50;

const MAX_RATING_BUCKET: i64 = 5;
const MAX_PRICE_BUCKET: i64 = 10;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-zA-Z0-9]").unwrap(/* valid regex */));

fn sanitize(token: &str) -> String {
    NON_ALPHANUMERIC.replace_all(token, "_").into_owned()
}

/// A (un)labeled example of the preference model.
///
/// The context consists of the user preferences and the features describe the entity. Both are
/// encoded the same way for training and prediction. The display format is the vowpal wabbit
/// text format, e.g. `1 |context pref_thai_food |entity name_len:9 emb_0:3 tag_cuisine_Thai`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Example {
    pub reward: Option<f32>,
    pub context: Vec<String>,
    pub features: Vec<String>,
}

impl Example {
    /// Creates a labeled example from a past interaction.
    pub fn training(
        interaction: &Interaction,
        embedding: &NormalizedEmbedding,
        preferences: &[String],
    ) -> Self {
        let reward = if interaction.liked {
            LIKED_REWARD
        } else {
            DISLIKED_REWARD
        };

        Self {
            reward: Some(reward),
            context: context_tokens(preferences),
            features: entity_features(&interaction.entity, embedding),
        }
    }

    /// Creates an unlabeled example of a candidate.
    pub fn prediction(
        entity: &Entity,
        embedding: &NormalizedEmbedding,
        preferences: &[String],
    ) -> Self {
        Self {
            reward: None,
            context: context_tokens(preferences),
            features: entity_features(entity, embedding),
        }
    }
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reward) = self.reward {
            write!(f, "{reward} ")?;
        }
        write!(
            f,
            "|context {} |entity {}",
            self.context.join(" "),
            self.features.join(" "),
        )
    }
}

fn context_tokens(preferences: &[String]) -> Vec<String> {
    preferences
        .iter()
        .map(|preference| format!("pref_{}", sanitize(&preference.to_lowercase())))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn entity_features(entity: &Entity, embedding: &NormalizedEmbedding) -> Vec<String> {
    let mut features = vec![format!(
        "name_len:{}",
        entity.name.to_lowercase().chars().count(),
    )];

    features.extend(
        embedding
            .iter()
            .take(EMBEDDING_FEATURES)
            .enumerate()
            .map(|(index, value)| format!("emb_{index}:{}", (value * 10.).trunc() as i32)),
    );

    features.extend(
        entity
            .tags
            .iter()
            .map(|tag| format!("tag_{}_{}", sanitize(&tag.kind), sanitize(&tag.name))),
    );

    let rating = entity.rating();
    if rating > 0. {
        let bucket = (rating.trunc() as i64).min(MAX_RATING_BUCKET);
        features.push(format!("rating_bucket:{bucket}"));
    }

    if let Some(price_range) = entity.properties.price_range {
        let average = (price_range.from + price_range.to) / 2.;
        let bucket = ((average / 10.).trunc() as i64).min(MAX_PRICE_BUCKET);
        features.push(format!("price_bucket:{bucket}"));
    }

    features
}
