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

use std::iter::once;

use itertools::Itertools;

use crate::entity::Entity;

/// Extracts the descriptive text of an entity which is fed to the embedder.
///
/// The text consists of, in this order: the name, the description, the cuisine and category tag
/// names, the specialty dishes, the "good for" names, the amenity and offerings tag names, the
/// address and the entity type. Absent pieces are skipped. The result is deterministic.
pub fn extract(entity: &Entity) -> String {
    let properties = &entity.properties;

    once(entity.name.as_str())
        .chain(once(entity.description()))
        .chain(entity.cuisine_tags().map(|tag| tag.name.as_str()))
        .chain(properties.specialty_dishes.iter().map(|dish| dish.name.as_str()))
        .chain(properties.good_for.iter().map(|item| item.name.as_str()))
        .chain(entity.amenity_tags().map(|tag| tag.name.as_str()))
        .chain(once(properties.address.as_str()))
        .chain(once(entity.kind.as_str()))
        .filter(|piece| !piece.is_empty())
        .join(" ")
}
