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

use std::collections::HashSet;

use crate::{entity::Entity, features};

/// The score if there are no preferences to compare against.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// The boost per tag which matches a preference.
const TAG_BOOST: f32 = 0.1;

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Scores the lexical overlap between an entity and the preferences.
///
/// The score is the Jaccard similarity of the lower-cased words of the entity's feature text and
/// of the preferences, boosted by [`TAG_BOOST`] for each pair of tag name and preference where
/// one contains the other, and is capped at `1`. Without any preference words the score is
/// [`NEUTRAL_SCORE`].
pub fn score(entity: &Entity, preferences: &[String]) -> f32 {
    let preference_words = words(&preferences.join(" "));
    if preference_words.is_empty() {
        return NEUTRAL_SCORE;
    }
    let entity_words = words(&features::extract(entity));

    let intersection = preference_words.intersection(&entity_words).count();
    let union = preference_words.union(&entity_words).count();
    #[allow(clippy::cast_precision_loss)]
    let jaccard = intersection as f32 / union as f32;

    let preferences = preferences
        .iter()
        .map(|preference| preference.to_lowercase())
        .collect::<Vec<_>>();
    #[allow(clippy::cast_precision_loss)]
    let tag_boost = entity
        .tags
        .iter()
        .map(|tag| tag.name.to_lowercase())
        .map(|tag| {
            preferences
                .iter()
                .filter(|preference| preference.contains(&tag) || tag.contains(*preference))
                .count()
        })
        .sum::<usize>() as f32
        * TAG_BOOST;

    (jaccard + tag_boost).min(1.)
}
