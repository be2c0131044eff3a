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

//! Embeddings of texts and the interface to compute them.
//!
//! The diversification engine only relies on the [`Embedder`] trait and on the cosine similarity
//! of [`NormalizedEmbedding`]s. The [`HashingEmbedder`] is a deterministic embedder which doesn't
//! require any model assets.

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

mod embedder;
mod embedding;
mod hashing;

pub use crate::{
    embedder::{Embedder, EmbedderError},
    embedding::{Embedding1, InvalidEmbedding, NormalizedEmbedding},
    hashing::{Config, HashingEmbedder},
};
