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

//! The input records of a diversification call.
//!
//! All optional fields are resolved here, once: absent, `null` or malformed values deserialize to
//! their defaults instead of failing. Fields which aren't modeled are kept verbatim so that the
//! records can be passed on unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnError};

/// A candidate item, e.g. a restaurant or a venue.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Entity {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,
    #[serde(default, rename = "type")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub kind: String,
    /// Legacy location of the description, superseded by [`Properties::description`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub description: Option<String>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed tag of an entity, e.g. `{ "name": "Thai", "type": "urn:tag:cuisine" }`.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Tag {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,
    #[serde(default, rename = "type")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named item, e.g. a specialty dish.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Named {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The price range of an entity.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PriceRange {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub from: f64,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub to: f64,
}

impl PriceRange {
    /// The average of both bounds, if any bound is set.
    pub fn average(&self) -> Option<f64> {
        #[allow(clippy::float_cmp)]
        let unset = self.from == 0. && self.to == 0.;
        (!unset).then(|| (self.from + self.to) / 2.)
    }
}

/// The optional properties of an entity.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub specialty_dishes: Vec<Named>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub good_for: Vec<Named>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub business_rating: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub address: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Creates an entity without tags and properties.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            kind: kind.into(),
            extra: Map::new(),
        });
        self
    }

    /// The description, falling back to the legacy top-level field.
    pub fn description(&self) -> &str {
        if self.properties.description.is_empty() {
            self.description.as_deref().unwrap_or_default()
        } else {
            &self.properties.description
        }
    }

    /// The rating, `0` if the entity is unrated.
    pub fn rating(&self) -> f64 {
        self.properties.business_rating
    }

    /// Tags whose type mentions a cuisine or a category.
    pub fn cuisine_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags_of_kind(&["cuisine", "category"])
    }

    /// Tags whose type mentions an amenity or offerings.
    pub fn amenity_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags_of_kind(&["amenity", "offerings"])
    }

    fn tags_of_kind<'a>(&'a self, kinds: &'a [&'a str]) -> impl Iterator<Item = &'a Tag> {
        self.tags
            .iter()
            .filter(move |tag| kinds.iter().any(|kind| tag.kind.contains(kind)))
    }
}

/// A historical reaction of the user to an entity.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Interaction {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub entity: Entity,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub liked: bool,
}

impl Interaction {
    pub fn new(entity: Entity, liked: bool) -> Self {
        Self { entity, liked }
    }
}
