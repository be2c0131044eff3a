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

use std::sync::atomic::{AtomicUsize, Ordering};

use diversify_embedding::{
    Config as EmbeddingConfig,
    Embedder,
    EmbedderError,
    Embedding1,
    NormalizedEmbedding,
};
use diversify_engine::{
    fallback_score,
    select,
    Config,
    Disabled,
    Diversifier,
    Entity,
    Error,
    Example,
    Interaction,
    Personalization,
    PreferenceError,
    PreferenceModel,
    Request,
    SelectionState,
};
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Embeds texts by counting keywords, the last dimension is a constant bias.
struct Keywords;

const KEYWORDS: [&str; 6] = ["indian", "thai", "food", "curry", "noodle", "coffee"];

impl Embedder for Keywords {
    fn embedding_size(&self) -> usize {
        KEYWORDS.len() + 1
    }

    fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
        let text = text.to_lowercase();
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect_vec();
        let mut embedding = KEYWORDS
            .iter()
            .map(|keyword| {
                #[allow(clippy::cast_precision_loss)]
                let count = words.iter().filter(|word| word.starts_with(keyword)).count() as f32;
                count
            })
            .collect_vec();
        embedding.push(0.1);

        Ok(Embedding1::from(embedding).normalize()?)
    }
}

fn place(name: &str, cuisine: Option<&str>, description: &str) -> Entity {
    let mut entity = Entity::new(name, "urn:entity:place");
    if let Some(cuisine) = cuisine {
        entity = entity.with_tag(cuisine, "urn:tag:genre:restaurant:cuisine");
    }
    entity.properties.description = description.into();
    entity
}

fn pool() -> Vec<Entity> {
    vec![
        place("Thai Orchid", Some("Thai"), "Thai noodles"),
        place("Curry House", Some("Indian"), "Indian curry"),
        place("Bangkok Street", Some("Thai"), "Thai street food"),
        place("Spice Route", Some("Indian"), "North Indian food"),
        place("Corner Cafe", None, "coffee"),
    ]
}

fn names<'a>(pool: &'a [Entity], indices: &[usize]) -> Vec<&'a str> {
    indices.iter().map(|&index| pool[index].name.as_str()).collect()
}

fn relevances(pool: &[Entity], preferences: &[String]) -> Vec<f32> {
    let preference = Keywords.encode(&preferences.join(" ")).unwrap();
    pool.iter()
        .map(|entity| {
            let embedding = Keywords
                .encode(&diversify_engine::extract_features(entity))
                .unwrap();
            0.7 * embedding.cosine_similarity(&preference)
                + 0.3 * fallback_score(entity, preferences)
        })
        .collect()
}

#[test]
fn test_indian_then_diverse() {
    let pool = pool();
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    let request = Request {
        n_total: 3,
        n_high_affinity: 1,
        ..diversifier.request().with_preferences(["Indian food"])
    };

    let selection = diversifier.diversify(&pool, &request).unwrap();
    let selected = names(&pool, &selection.indices);

    assert_eq!(selected.len(), 3);
    assert_eq!(selected[0], "Spice Route");
    assert_eq!(selected[1], "Thai Orchid");
    assert!(!selected.contains(&"Curry House"));
    assert!(!selection.personalized);
}

#[test]
fn test_pure_relevance() {
    let pool = pool();
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    let request = Request {
        n_total: pool.len(),
        n_high_affinity: pool.len(),
        lambda_param: 1.,
        ..diversifier.request().with_preferences(["Indian food"])
    };

    let relevances = relevances(&pool, &request.preferences);
    let expected = (0..pool.len())
        .sorted_by(|&a, &b| relevances[b].total_cmp(&relevances[a]))
        .collect_vec();

    let selection = diversifier.diversify(&pool, &request).unwrap();
    assert_eq!(selection.indices, expected);
}

#[test]
fn test_pure_diversity_starts_with_first_candidate() {
    let pool = pool();
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    let request = Request {
        n_total: 2,
        n_high_affinity: 1,
        lambda_param: 0.,
        ..diversifier.request().with_preferences(["Indian food"])
    };

    let selection = diversifier.diversify(&pool, &request).unwrap();
    assert_eq!(selection.indices[0], 0);
}

#[test]
fn test_selection_size() {
    let pool = pool();
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    for n_total in 0..8 {
        for n_high_affinity in 0..=n_total {
            let request = Request {
                n_total,
                n_high_affinity,
                ..diversifier.request().with_preferences(["Thai"])
            };
            let selection = diversifier.diversify(&pool, &request).unwrap();
            assert_eq!(selection.len(), n_total.min(pool.len()));
            assert!(selection.indices.iter().all_unique());
        }
    }
}

#[test]
fn test_phase_one_prefix() {
    let mut rng = StdRng::seed_from_u64(42);
    let embedder = EmbeddingConfig::default().with_dimension(32).unwrap().build().unwrap();

    for n in [1, 5, 20] {
        let embeddings = (0..n)
            .map(|i| embedder.encode(&format!("entity {i} {}", rng.gen::<u32>())).unwrap())
            .collect_vec();
        let relevances = (0..n).map(|_| rng.gen_range(0_f32..1.)).collect_vec();

        for n_high_affinity in 0..=n {
            let mut state = SelectionState::new(n);
            for _ in 0..n_high_affinity {
                state.select_next(&relevances, &embeddings, 0.8);
                assert!(state.is_partition_of(n));
            }

            let selected = select(&relevances, &embeddings, n, n_high_affinity, 0.8);
            assert_eq!(&selected[..n_high_affinity], state.selected());
        }
    }
}

#[test]
fn test_empty_pool() {
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    let selection = diversifier.diversify(&[], &diversifier.request()).unwrap();
    assert!(selection.is_empty());
    assert!(diversify_engine::analyze(selection.entities(&[])).is_empty());
}

#[test]
fn test_invalid_lambda() {
    let diversifier = Diversifier::new(Keywords, Disabled, Config::default()).unwrap();
    let request = Request {
        lambda_param: 1.5,
        ..diversifier.request()
    };
    assert!(matches!(
        diversifier.diversify(&pool(), &request),
        Err(Error::InvalidLambda(_)),
    ));
}

#[test]
fn test_mismatched_embedder_fails() {
    struct Broken;

    impl Embedder for Broken {
        fn embedding_size(&self) -> usize {
            2
        }

        fn encode(&self, text: &str) -> Result<NormalizedEmbedding, EmbedderError> {
            let size = if text.contains("Thai") { 3 } else { 2 };
            Ok(Embedding1::from(vec![1.; size]).normalize()?)
        }
    }

    let diversifier = Diversifier::new(Broken, Disabled, Config::default()).unwrap();
    let request = diversifier.request().with_preferences(["food"]);
    assert!(matches!(
        diversifier.diversify(&pool(), &request),
        Err(Error::Embedder(EmbedderError::SizeMismatch { .. })),
    ));
}

/// Likes everything which mentions thai.
#[derive(Default)]
struct LikesThai {
    sessions: AtomicUsize,
    trainings: AtomicUsize,
}

struct LikesThaiSession<'a>(&'a LikesThai);

impl PreferenceModel for LikesThaiSession<'_> {
    fn train(&mut self, examples: &[Example]) -> bool {
        self.0.trainings.fetch_add(1, Ordering::SeqCst);
        !examples.is_empty()
    }

    fn predict(&self, example: &Example) -> Result<f32, PreferenceError> {
        let likes = example
            .features
            .iter()
            .any(|feature| feature.to_lowercase().contains("thai"));
        Ok(if likes { 1. } else { -1. })
    }
}

impl Personalization for LikesThai {
    fn is_available(&self) -> bool {
        true
    }

    fn session(&self) -> Box<dyn PreferenceModel + '_> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Box::new(LikesThaiSession(self))
    }
}

fn interactions(n: usize) -> Vec<Interaction> {
    pool()
        .into_iter()
        .cycle()
        .take(n)
        .map(|entity| {
            let liked = entity.name.contains("Thai");
            Interaction::new(entity, liked)
        })
        .collect()
}

#[test]
fn test_personalized_selection() {
    let pool = pool();
    let diversifier = Diversifier::new(Keywords, LikesThai::default(), Config::default()).unwrap();
    let request = Request {
        n_total: 2,
        n_high_affinity: 2,
        lambda_param: 1.,
        ..diversifier
            .request()
            .with_preferences(["sushi"])
            .with_interactions(interactions(3))
    };

    let selection = diversifier.diversify(&pool, &request).unwrap();
    assert!(selection.personalized);
    assert!(selection
        .entities(&pool)
        .all(|entity| entity.cuisine_tags().any(|tag| tag.name == "Thai")));
    assert_eq!(
        names(&pool, &selection.indices).into_iter().sorted().collect_vec(),
        ["Bangkok Street", "Thai Orchid"],
    );
}

#[test]
fn test_few_interactions_are_not_personalized() {
    let pool = pool();
    let personalization = LikesThai::default();
    let diversifier = Diversifier::new(Keywords, &personalization, Config::default()).unwrap();
    let request = Request {
        n_total: 1,
        n_high_affinity: 1,
        lambda_param: 1.,
        ..diversifier
            .request()
            .with_preferences(["sushi"])
            .with_interactions(interactions(2))
    };

    let selection = diversifier.diversify(&pool, &request).unwrap();
    assert!(!selection.personalized);
    assert_eq!(names(&pool, &selection.indices), ["Corner Cafe"]);
    assert_eq!(personalization.trainings.load(Ordering::SeqCst), 0);
}

#[test]
fn test_one_session_and_training_per_call() {
    let pool = pool();
    let personalization = LikesThai::default();
    let diversifier = Diversifier::new(Keywords, &personalization, Config::default()).unwrap();
    let request = diversifier
        .request()
        .with_preferences(["Indian food"])
        .with_interactions(interactions(4));

    for _ in 0..3 {
        assert!(diversifier.diversify(&pool, &request).unwrap().personalized);
    }
    assert_eq!(personalization.sessions.load(Ordering::SeqCst), 3);
    assert_eq!(personalization.trainings.load(Ordering::SeqCst), 3);
}
