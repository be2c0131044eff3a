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

//! The results of a run.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use diversify_engine::{DiversityMetrics, Request, Selection};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::input::Candidates;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Enhancement {
    Vw,
    Fallback,
}

#[derive(Debug, Serialize)]
pub(crate) struct Parameters {
    n_total: usize,
    n_high_affinity: usize,
    lambda_param: f32,
}

/// The content of the output file.
#[derive(Debug, Serialize)]
pub(crate) struct Report<'a> {
    diversified_recommendations: Vec<&'a Value>,
    #[serde(serialize_with = "serialize_metrics")]
    diversity_metrics: DiversityMetrics,
    total_original: usize,
    total_selected: usize,
    vw_enhanced: bool,
    enhancement_type: Enhancement,
    parameters: Parameters,
}

/// Empty metrics are an empty object.
fn serialize_metrics<S>(metrics: &DiversityMetrics, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if metrics.is_empty() {
        serde_json::Map::new().serialize(serializer)
    } else {
        metrics.serialize(serializer)
    }
}

/// The one line summary printed to stdout.
#[derive(Debug, Serialize)]
pub(crate) struct Summary {
    success: bool,
    total_original: usize,
    total_selected: usize,
    diversity_score: usize,
    vw_enhanced: bool,
    enhancement_type: Enhancement,
}

impl<'a> Report<'a> {
    pub(crate) fn new(
        candidates: &'a Candidates,
        selection: &Selection,
        diversity_metrics: DiversityMetrics,
        request: &Request,
        personalization_available: bool,
    ) -> Self {
        let enhancement_type = if personalization_available {
            Enhancement::Vw
        } else {
            Enhancement::Fallback
        };

        Self {
            diversified_recommendations: selection
                .indices
                .iter()
                .map(|&index| &candidates.records[index])
                .collect(),
            diversity_metrics,
            total_original: candidates.total,
            total_selected: selection.len(),
            vw_enhanced: selection.personalized,
            enhancement_type,
            parameters: Parameters {
                n_total: request.n_total,
                n_high_affinity: request.n_high_affinity,
                lambda_param: request.lambda_param,
            },
        }
    }

    pub(crate) fn summary(&self) -> Summary {
        Summary {
            success: true,
            total_original: self.total_original,
            total_selected: self.total_selected,
            diversity_score: self.diversity_metrics.unique_cuisines,
            vw_enhanced: self.vw_enhanced,
            enhancement_type: self.enhancement_type,
        }
    }

    /// Writes the report as pretty json.
    pub(crate) fn write(&self, path: &Path) -> Result<(), anyhow::Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
