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

//! Parsing of the command line inputs.

use std::{fs, path::Path};

use diversify_engine::{Entity, Interaction};
use serde_json::Value;
use tracing::{error, info, warn};

/// The candidates of a run.
///
/// The raw records are kept to write them back unchanged, both sequences are indexed alike.
#[derive(Debug, Default)]
pub(crate) struct Candidates {
    pub(crate) records: Vec<Value>,
    pub(crate) entities: Vec<Entity>,
    /// The number of input records, including the skipped malformed ones.
    pub(crate) total: usize,
}

impl Candidates {
    /// Loads the candidates from a json file.
    ///
    /// Unreadable files and unexpected shapes load no candidates.
    pub(crate) fn load(path: &Path) -> Self {
        let data = fs::read_to_string(path)
            .map_err(|error| error.to_string())
            .and_then(|data| serde_json::from_str(&data).map_err(|error| error.to_string()));
        match data {
            Ok(data) => {
                let candidates = Self::from_data(data);
                info!(
                    entities = candidates.entities.len(),
                    input = %path.display(),
                    "loaded candidates",
                );
                candidates
            }
            Err(error) => {
                error!(%error, input = %path.display(), "failed to load candidates");
                Self::default()
            }
        }
    }

    fn from_data(data: Value) -> Self {
        let records = match data {
            Value::Array(records) => records,
            Value::Object(mut data) => match data.remove("entities") {
                Some(entities) => as_array(entities),
                None => data
                    .remove("results")
                    .and_then(|mut results| results.get_mut("entities").map(Value::take))
                    .map(as_array)
                    .unwrap_or_default(),
            },
            _ => Vec::new(),
        };

        let total = records.len();
        let (records, entities) = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Entity>(record.clone()) {
                Ok(entity) => Some((record, entity)),
                Err(error) => {
                    warn!(%error, "skipping malformed entity");
                    None
                }
            })
            .unzip();

        Self {
            records,
            entities,
            total,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn as_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        _ => Vec::new(),
    }
}

/// Parses the preferences, a json array of strings.
pub(crate) fn parse_preferences(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parses the interactions, malformed interactions are ignored.
pub(crate) fn parse_interactions(raw: &str) -> Vec<Interaction> {
    serde_json::from_str(raw).unwrap_or_else(|error| {
        warn!(%error, "invalid interactions, proceeding without");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn names(candidates: &Candidates) -> Vec<&str> {
        candidates
            .entities
            .iter()
            .map(|entity| entity.name.as_str())
            .collect()
    }

    #[test]
    fn test_input_shapes() {
        let entities = json!([{ "name": "a" }, { "name": "b" }]);

        let candidates = Candidates::from_data(entities.clone());
        assert_eq!(names(&candidates), ["a", "b"]);

        let candidates = Candidates::from_data(json!({ "entities": entities.clone() }));
        assert_eq!(names(&candidates), ["a", "b"]);

        let candidates = Candidates::from_data(json!({ "results": { "entities": entities } }));
        assert_eq!(names(&candidates), ["a", "b"]);
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(Candidates::from_data(json!({ "items": [{ "name": "a" }] })).is_empty());
        assert!(Candidates::from_data(json!({ "entities": { "name": "a" } })).is_empty());
        assert!(Candidates::from_data(json!({ "results": [] })).is_empty());
        assert!(Candidates::from_data(json!("a")).is_empty());
    }

    #[test]
    fn test_records_are_kept() {
        let record = json!({
            "name": "a",
            "entity_id": "E1",
            "properties": { "business_rating": "n/a" },
        });
        let candidates = Candidates::from_data(json!([record.clone(), 42]));
        assert_eq!(candidates.records, [record]);
        assert_eq!(names(&candidates), ["a"]);
        assert_eq!(candidates.total, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Candidates::load(&dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        fs::write(&path, r#"{ "entities": [{ "name": "a", "type": "urn:entity:place" }] }"#)
            .unwrap();
        let candidates = Candidates::load(&path);
        assert_eq!(candidates.entities[0].kind, "urn:entity:place");
    }

    #[test]
    fn test_parse_preferences() {
        assert_eq!(
            parse_preferences(r#"["Thai food", "spicy"]"#).unwrap(),
            ["Thai food", "spicy"],
        );
        assert!(parse_preferences("Thai food").is_err());
        assert!(parse_preferences(r#"{ "likes": "Thai" }"#).is_err());
    }

    #[test]
    fn test_parse_interactions() {
        let interactions = parse_interactions(r#"[{ "entity": { "name": "a" }, "liked": true }]"#);
        assert_eq!(interactions.len(), 1);
        assert!(interactions[0].liked);
        assert!(parse_interactions("not json").is_empty());
    }
}
