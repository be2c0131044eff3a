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

use diversify_embedding::{Embedder, EmbedderError};
use displaydoc::Display;
use itertools::Itertools;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    config::{Config, Error as ConfigError},
    entity::{Entity, Interaction},
    features,
    preference::Personalization,
    relevance::RelevanceScorer,
    selector,
};

/// The potential errors of the [`Diversifier`].
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Invalid lambda parameter {0}, expected value from the unit interval
    InvalidLambda(f32),
    /// Failed to embed the texts: {0}
    Embedder(#[from] EmbedderError),
    /// Invalid configuration: {0}
    Config(#[from] ConfigError),
}

/// The parameters of one diversification call.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Free-text preferences of the user.
    pub preferences: Vec<String>,
    /// The maximal number of selected entities.
    pub n_total: usize,
    /// The number of entities selected with `lambda_param`.
    pub n_high_affinity: usize,
    /// The trade-off between relevance (`1`) and diversity (`0`) of the high affinity phase.
    pub lambda_param: f32,
    /// Past reactions of the user, used to train the preference model.
    pub interactions: Vec<Interaction>,
}

impl Default for Request {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Request {
    fn from(config: &Config) -> Self {
        Self {
            preferences: Vec::new(),
            n_total: config.n_total(),
            n_high_affinity: config.n_high_affinity(),
            lambda_param: config.lambda_param(),
            interactions: Vec::new(),
        }
    }
}

impl Request {
    #[must_use]
    pub fn with_preferences(
        mut self,
        preferences: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_interactions(mut self, interactions: Vec<Interaction>) -> Self {
        self.interactions = interactions;
        self
    }
}

/// The ranked result of a diversification call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Indices into the candidates in rank order.
    pub indices: Vec<usize>,
    /// Whether the relevance was blended with a trained preference model.
    pub personalized: bool,
}

impl Selection {
    /// Maps the selection back to the candidates it was made from.
    pub fn entities<'a>(&'a self, candidates: &'a [Entity]) -> impl Iterator<Item = &'a Entity> {
        self.indices.iter().map(|&index| &candidates[index])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Selects relevant yet diverse entities for the preferences of a user.
pub struct Diversifier<E, P> {
    embedder: E,
    personalization: P,
    config: Config,
}

impl<E, P> Diversifier<E, P>
where
    E: Embedder,
    P: Personalization,
{
    /// Creates a diversifier.
    ///
    /// # Errors
    /// Fails if the configuration is invalid.
    pub fn new(embedder: E, personalization: P, config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            embedder,
            personalization,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates a request with the configured defaults.
    pub fn request(&self) -> Request {
        Request::from(&self.config)
    }

    /// Whether the preference model backend works.
    pub fn is_personalization_available(&self) -> bool {
        self.personalization.is_available()
    }

    /// Selects up to `n_total` candidates in rank order.
    ///
    /// # Errors
    /// Fails if the lambda parameter is outside of the unit interval or if the embedder fails.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn diversify(&self, candidates: &[Entity], request: &Request) -> Result<Selection, Error> {
        if !(0. ..=1.).contains(&request.lambda_param) {
            return Err(Error::InvalidLambda(request.lambda_param));
        }
        if candidates.is_empty() {
            info!("no candidates to diversify");
            return Ok(Selection::default());
        }

        let scorer = RelevanceScorer::new(
            &self.embedder,
            self.personalization.session(),
            &request.preferences,
            &request.interactions,
        )?;

        let texts = candidates.iter().map(features::extract).collect_vec();
        let embeddings = self.embedder.encode_batch(&texts)?;
        let expected = scorer.preference_embedding().len();
        if let Some(embedding) = embeddings.iter().find(|embedding| embedding.len() != expected) {
            return Err(EmbedderError::SizeMismatch {
                expected,
                got: embedding.len(),
            }
            .into());
        }

        let relevances = zip(candidates, &embeddings)
            .map(|(candidate, embedding)| scorer.score(candidate, embedding))
            .collect_vec();
        let indices = selector::select(
            &relevances,
            &embeddings,
            request.n_total,
            request.n_high_affinity,
            request.lambda_param,
        );

        let personalized = scorer.is_personalized();
        info!(
            selected = indices.len(),
            interactions = request.interactions.len(),
            enhancement = if personalized { "personalized" } else { "fallback" },
            "diversified candidates",
        );

        Ok(Selection {
            indices,
            personalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use diversify_embedding::{Config as EmbeddingConfig, HashingEmbedder, NormalizedEmbedding};

    use super::*;
    use crate::preference::Disabled;

    struct Counting {
        inner: HashingEmbedder,
        calls: Cell<usize>,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                inner: EmbeddingConfig::default().build().unwrap(),
                calls: Cell::new(0),
            }
        }
    }

    impl Embedder for Counting {
        fn embedding_size(&self) -> usize {
            self.inner.embedding_size()
        }

        fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.encode(text)
        }
    }

    fn candidates() -> Vec<Entity> {
        ["Thai Orchid", "Curry House", "Pasta Place", "Sushi Bar", "Taco Stand"]
            .into_iter()
            .map(|name| Entity::new(name, "urn:entity:place"))
            .collect()
    }

    #[test]
    fn test_invalid_lambda_fails_before_embedding() {
        let diversifier = Diversifier::new(Counting::new(), Disabled, Config::default()).unwrap();
        for lambda_param in [-0.1, 1.1, f32::NAN, f32::INFINITY] {
            let request = Request {
                lambda_param,
                ..diversifier.request()
            };
            assert!(matches!(
                diversifier.diversify(&candidates(), &request),
                Err(Error::InvalidLambda(_)),
            ));
        }
        assert_eq!(diversifier.embedder.calls.get(), 0);
    }

    #[test]
    fn test_empty_candidates() {
        let diversifier = Diversifier::new(Counting::new(), Disabled, Config::default()).unwrap();
        let selection = diversifier.diversify(&[], &diversifier.request()).unwrap();
        assert!(selection.is_empty());
        assert!(!selection.personalized);
    }

    #[test]
    fn test_embeds_once_per_text() {
        let diversifier = Diversifier::new(Counting::new(), Disabled, Config::default()).unwrap();
        let request = diversifier.request().with_preferences(["thai"]);
        let selection = diversifier.diversify(&candidates(), &request).unwrap();
        assert_eq!(selection.len(), 5);
        assert_eq!(diversifier.embedder.calls.get(), 1 + 5);
    }

    #[test]
    fn test_selection_entities() {
        let candidates = candidates();
        let selection = Selection {
            indices: vec![3, 0],
            personalized: false,
        };
        assert_eq!(
            selection.entities(&candidates).map(|entity| entity.name.as_str()).collect_vec(),
            ["Sushi Bar", "Thai Orchid"],
        );
    }

    #[test]
    fn test_request_defaults() {
        let config = Config::default().with_n_total(4).with_n_high_affinity(1);
        let diversifier = Diversifier::new(Counting::new(), Disabled, config).unwrap();
        let request = diversifier.request();
        assert_eq!(request.n_total, 4);
        assert_eq!(request.n_high_affinity, 1);
        assert!(request.preferences.is_empty());
        assert!(request.interactions.is_empty());
        assert!(!diversifier.is_personalization_available());
    }
}
