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

use itertools::Itertools;
use serde::Serialize;

use crate::entity::Entity;

/// Summary statistics of the diversity of a selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiversityMetrics {
    pub unique_cuisines: usize,
    /// Cuisine and category tag names in order of first occurrence.
    pub cuisine_types: Vec<String>,
    pub unique_entity_types: usize,
    /// Entity types in order of first occurrence.
    pub entity_types: Vec<String>,
    /// Population standard deviation of the average prices.
    pub price_range_std: f64,
    /// Lowest and highest rating of the rated entities.
    pub rating_range: (f64, f64),
    pub avg_rating: f64,
    pub total_entities: usize,
}

impl DiversityMetrics {
    /// Whether the metrics describe an empty selection.
    pub fn is_empty(&self) -> bool {
        self.total_entities == 0
    }
}

/// Computes the diversity metrics of a selection.
///
/// Unpriced entities are ignored for the price deviation and unrated entities for the ratings.
#[allow(clippy::cast_precision_loss)]
pub fn analyze<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> DiversityMetrics {
    let mut cuisines = Vec::new();
    let mut kinds = Vec::new();
    let mut prices = Vec::new();
    let mut ratings = Vec::new();
    let mut total_entities = 0;

    for entity in entities {
        total_entities += 1;
        cuisines.extend(entity.cuisine_tags().map(|tag| tag.name.as_str()));
        if !entity.kind.is_empty() {
            kinds.push(entity.kind.as_str());
        }
        prices.extend(
            entity
                .properties
                .price_range
                .and_then(|price_range| price_range.average()),
        );
        let rating = entity.rating();
        if rating > 0. {
            ratings.push(rating);
        }
    }

    if total_entities == 0 {
        return DiversityMetrics::default();
    }

    let cuisine_types = cuisines.into_iter().unique().map(Into::into).collect_vec();
    let entity_types = kinds.into_iter().unique().map(Into::into).collect_vec();

    let price_range_std = if prices.is_empty() {
        0.
    } else {
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        let variance = prices
            .iter()
            .map(|price| (price - mean).powi(2))
            .sum::<f64>()
            / prices.len() as f64;
        variance.sqrt()
    };

    let (rating_range, avg_rating) = match ratings.iter().copied().minmax() {
        itertools::MinMaxResult::NoElements => ((0., 0.), 0.),
        itertools::MinMaxResult::OneElement(rating) => ((rating, rating), rating),
        itertools::MinMaxResult::MinMax(min, max) => (
            (min, max),
            ratings.iter().sum::<f64>() / ratings.len() as f64,
        ),
    };

    DiversityMetrics {
        unique_cuisines: cuisine_types.len(),
        cuisine_types,
        unique_entity_types: entity_types.len(),
        entity_types,
        price_range_std,
        rating_range,
        avg_rating,
        total_entities,
    }
}
