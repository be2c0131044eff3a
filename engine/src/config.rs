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

use displaydoc::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::preference::VowpalConfig;

/// Configurations of the diversification engine.
///
/// The selection parameters are the defaults of a [`Request`](crate::Request).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
#[must_use]
pub struct Config {
    n_total: usize,
    n_high_affinity: usize,
    lambda_param: f32,
    vowpal: VowpalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_total: 8,
            n_high_affinity: 3,
            lambda_param: 0.7,
            vowpal: VowpalConfig::default(),
        }
    }
}

/// Errors of the engine configuration.
#[derive(Copy, Clone, Debug, Display, Error)]
pub enum Error {
    /// Invalid lambda parameter, expected value from the unit interval
    Lambda,
    /// Invalid learning rate, expected positive value
    LearningRate,
    /// Invalid l2 regularization, expected non-negative value
    L2,
    /// Invalid timeout, expected positive duration
    Timeout,
    /// Invalid vowpal wabbit binary, expected non-empty path
    Binary,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0. ..=1.).contains(&self.lambda_param) {
            return Err(Error::Lambda);
        }
        self.vowpal.validate()
    }

    /// The default number of selected entities.
    pub fn n_total(&self) -> usize {
        self.n_total
    }

    /// Sets the default number of selected entities.
    pub fn with_n_total(mut self, n_total: usize) -> Self {
        self.n_total = n_total;
        self
    }

    /// The default number of entities selected with the caller's lambda parameter.
    pub fn n_high_affinity(&self) -> usize {
        self.n_high_affinity
    }

    /// Sets the default number of high affinity entities.
    pub fn with_n_high_affinity(mut self, n_high_affinity: usize) -> Self {
        self.n_high_affinity = n_high_affinity;
        self
    }

    /// The default trade-off between relevance and diversity of the high affinity phase.
    pub fn lambda_param(&self) -> f32 {
        self.lambda_param
    }

    /// Sets the default lambda parameter.
    ///
    /// # Errors
    /// Fails if the lambda parameter is outside of the unit interval.
    pub fn with_lambda_param(mut self, lambda_param: f32) -> Result<Self, Error> {
        self.lambda_param = lambda_param;
        self.validate()?;

        Ok(self)
    }

    /// The configuration of the vowpal wabbit preference model.
    pub fn vowpal(&self) -> &VowpalConfig {
        &self.vowpal
    }

    /// Sets the configuration of the vowpal wabbit preference model.
    ///
    /// # Errors
    /// Fails if the vowpal wabbit configuration is invalid.
    pub fn with_vowpal(mut self, vowpal: VowpalConfig) -> Result<Self, Error> {
        self.vowpal = vowpal;
        self.validate()?;

        Ok(self)
    }
}
