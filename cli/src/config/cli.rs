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

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Selects relevant yet diverse recommendations from a JSON file of entities.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Args {
    /// JSON file with the candidate entities.
    ///
    /// Either an array of entities, `{ "entities": [...] }` or
    /// `{ "results": { "entities": [...] } }`.
    #[arg(short, long, required_unless_present = "print_config")]
    pub(crate) input: Option<PathBuf>,

    /// JSON file to which the recommendations are written.
    #[arg(short, long, required_unless_present = "print_config")]
    pub(crate) output: Option<PathBuf>,

    /// Preferences of the user as JSON array of strings.
    #[arg(short, long, required_unless_present = "print_config")]
    pub(crate) preferences: Option<String>,

    /// Past interactions of the user as JSON array of `{ "entity": ..., "liked": ... }`.
    #[arg(long)]
    pub(crate) interactions: Option<String>,

    /// Total number of recommendations.
    #[arg(long, alias = "n_total")]
    pub(crate) n_total: Option<usize>,

    /// Number of recommendations selected for affinity first.
    #[arg(long, alias = "n_high_affinity")]
    pub(crate) n_high_affinity: Option<usize>,

    /// Trade-off between relevance (1) and diversity (0) of the affinity selection.
    #[arg(long, alias = "lambda_param", allow_negative_numbers = true)]
    pub(crate) lambda_param: Option<f32>,

    /// File to log to additionally to logging to stderr.
    #[arg(short, long)]
    pub(crate) log_file: Option<PathBuf>,

    /// Use given configuration file.
    ///
    /// Instead of a path "inline" toml configuration can also be
    /// passed in by prefixing it with `inline:`.
    #[arg(short, long)]
    pub(crate) config: Option<String>,

    /// Print the config and exit instead of diversifying.
    #[arg(long)]
    pub(crate) print_config: bool,
}

impl Args {
    pub(super) fn to_config_overrides(&self) -> impl Serialize {
        let mut engine = Map::new();
        if let Some(n_total) = self.n_total {
            engine.insert(String::from("n_total"), json!(n_total));
        }
        if let Some(n_high_affinity) = self.n_high_affinity {
            engine.insert(String::from("n_high_affinity"), json!(n_high_affinity));
        }
        if let Some(lambda_param) = self.lambda_param {
            engine.insert(String::from("lambda_param"), json!(lambda_param));
        }

        let mut map = Map::new();
        if !engine.is_empty() {
            map.insert(String::from("engine"), Value::Object(engine));
        }
        if let Some(log_file) = &self.log_file {
            map.insert(String::from("logging"), json!({ "file": log_file }));
        }

        Value::Object(map)
    }
}
