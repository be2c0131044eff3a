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

//! The optional personalization of the relevance scores.
//!
//! A [`Personalization`] backend hands out one [`PreferenceModel`] session per diversification
//! call. The session owns all the state of the model, hence concurrent calls never share it and
//! the state is gone once the call is done.

mod encoding;
mod vowpal;

use std::{io, process::ExitStatus, time::Duration};

use displaydoc::Display;
use thiserror::Error;

pub use self::{
    encoding::{Example, DISLIKED_REWARD, LIKED_REWARD},
    vowpal::{VowpalConfig, VowpalWabbit},
};

/// The potential errors of a [`PreferenceModel`].
#[derive(Debug, Display, Error)]
pub enum PreferenceError {
    /// The preference model is disabled
    Disabled,
    /// The preference model hasn't been trained
    Untrained,
    /// Failed to run the preference model: {0}
    Io(#[from] io::Error),
    /// The preference model failed with {0}
    Status(ExitStatus),
    /// The preference model didn't finish within {0:?}
    Timeout(Duration),
    /// Failed to parse the prediction {0:?}
    Prediction(String),
}

/// A model which learns the preferences of a user from the user's past interactions.
pub trait PreferenceModel {
    /// Whether the model can be trained at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Trains the model, returns whether the training succeeded.
    ///
    /// A failed training leaves the model untrained, it never panics.
    fn train(&mut self, examples: &[Example]) -> bool;

    /// Predicts the raw score of an unlabeled example.
    ///
    /// The score is unbounded, positive values indicate a preference.
    fn predict(&self, example: &Example) -> Result<f32, PreferenceError>;
}

/// A backend which provides preference model sessions.
pub trait Personalization: Send + Sync {
    /// Whether the backend provides working preference models.
    ///
    /// This is determined once when the backend is created.
    fn is_available(&self) -> bool;

    /// Creates a fresh, untrained preference model which lives for one diversification call.
    fn session(&self) -> Box<dyn PreferenceModel + '_>;
}

impl<P> Personalization for &P
where
    P: Personalization + ?Sized,
{
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn session(&self) -> Box<dyn PreferenceModel + '_> {
        (**self).session()
    }
}

/// The preference model of a user without personalization.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disabled;

impl PreferenceModel for Disabled {
    fn is_enabled(&self) -> bool {
        false
    }

    fn train(&mut self, _examples: &[Example]) -> bool {
        false
    }

    fn predict(&self, _example: &Example) -> Result<f32, PreferenceError> {
        Err(PreferenceError::Disabled)
    }
}

impl Personalization for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    fn session(&self) -> Box<dyn PreferenceModel + '_> {
        Box::new(Disabled)
    }
}
