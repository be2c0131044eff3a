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

//! Diversified recommendations via maximal marginal relevance.
//!
//! The [`Diversifier`] scores the relevance of candidate entities for the free-text preferences of
//! a user, optionally personalized by a [`PreferenceModel`] trained from past interactions, and
//! greedily selects a ranked subset which balances relevance against redundancy. The selection
//! can be summarized with [`analyze()`].

#![forbid(unsafe_op_in_unsafe_fn)]
#![deny(
    clippy::pedantic,
    noop_method_call,
    rust_2018_idioms,
    unsafe_code,
    unused_qualifications
)]
#![warn(unreachable_pub, rustdoc::missing_crate_level_docs)]
#![allow(
    clippy::items_after_statements,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

mod analyzer;
mod config;
mod diversifier;
mod entity;
mod fallback;
mod features;
mod preference;
mod relevance;
mod selector;
mod utils;

pub use crate::{
    analyzer::{analyze, DiversityMetrics},
    config::{Config, Error as ConfigError},
    diversifier::{Diversifier, Error, Request, Selection},
    entity::{Entity, Interaction, Named, PriceRange, Properties, Tag},
    fallback::{score as fallback_score, NEUTRAL_SCORE as FALLBACK_NEUTRAL_SCORE},
    features::extract as extract_features,
    preference::{
        Disabled,
        Example,
        Personalization,
        PreferenceError,
        PreferenceModel,
        VowpalConfig,
        VowpalWabbit,
        DISLIKED_REWARD,
        LIKED_REWARD,
    },
    relevance::{normalize_prediction, Signal, MIN_INTERACTIONS, NEUTRAL_PREDICTION},
    selector::{mmr_score, select, SelectionState, DIVERSITY_LAMBDA},
};
