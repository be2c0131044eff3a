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

//! Command line driver of the diversification engine.
//!
//! Reads candidate entities from a json file, selects diversified recommendations for the given
//! preferences and writes them together with their diversity metrics to a json file.

#![forbid(unsafe_code, unsafe_op_in_unsafe_fn)]
#![deny(
    clippy::pedantic,
    noop_method_call,
    rust_2018_idioms,
    unused_qualifications
)]
#![warn(unreachable_pub, rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod input;
mod logging;
mod output;

use std::process::ExitCode;

use anyhow::{anyhow, Context};
use diversify_engine::{analyze, Diversifier, VowpalWabbit};
use tracing::{error, info};

use crate::{
    config::{Args, DiversifyConfig},
    input::Candidates,
    output::Report,
};

fn main() -> ExitCode {
    let (config, args) = config::load();
    if let Err(error) = logging::initialize_global(&config.logging) {
        eprintln!("Setup logging failed: {error}");
    }

    run(config, &args).unwrap_or_else(|error| {
        error!(?error, "diversification failed");
        ExitCode::FAILURE
    })
}

fn run(config: DiversifyConfig, args: &Args) -> Result<ExitCode, anyhow::Error> {
    let input = args.input.as_deref().ok_or_else(|| anyhow!("missing --input"))?;
    let output = args.output.as_deref().ok_or_else(|| anyhow!("missing --output"))?;

    let candidates = Candidates::load(input);
    if candidates.is_empty() {
        error!(input = %input.display(), "no entities loaded");
        return Ok(ExitCode::FAILURE);
    }

    let preferences = match input::parse_preferences(args.preferences.as_deref().unwrap_or("[]")) {
        Ok(preferences) => preferences,
        Err(error) => {
            error!(%error, "invalid preferences");
            return Ok(ExitCode::FAILURE);
        }
    };
    let interactions = args
        .interactions
        .as_deref()
        .map(input::parse_interactions)
        .unwrap_or_default();

    let embedder = config
        .embedding
        .build()
        .context("invalid embedding configuration")?;
    let personalization = VowpalWabbit::new(config.engine.vowpal().clone());
    let diversifier = Diversifier::new(embedder, personalization, config.engine)?;

    let request = diversifier
        .request()
        .with_preferences(preferences)
        .with_interactions(interactions);
    let selection = diversifier.diversify(&candidates.entities, &request)?;
    let metrics = analyze(selection.entities(&candidates.entities));

    let report = Report::new(
        &candidates,
        &selection,
        metrics,
        &request,
        diversifier.is_personalization_available(),
    );
    report
        .write(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), "saved diversified recommendations");

    println!("{}", serde_json::to_string(&report.summary())?);

    Ok(ExitCode::SUCCESS)
}
