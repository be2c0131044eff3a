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

/// Serde of a duration as a string with a unit suffix, e.g. `"30s"` or `"500ms"`.
pub(crate) mod serde_duration_in_config {
    use std::time::Duration;

    use serde::{
        de::{Error, Unexpected},
        Deserialize,
        Deserializer,
        Serialize,
        Serializer,
    };

    pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis();
        if millis % 1000 == 0 {
            format!("{}s", millis / 1000).serialize(serializer)
        } else {
            format!("{millis}ms").serialize(serializer)
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.strip_suffix("ms")
            .map(|value| (value, Duration::from_millis as fn(u64) -> Duration))
            .or_else(|| raw.strip_suffix('s').map(|value| (value, Duration::from_secs as _)))
            .and_then(|(value, from_fn)| value.parse::<u64>().ok().map(from_fn))
            .ok_or_else(|| {
                Error::invalid_value(
                    Unexpected::Str(&raw),
                    &"an integer with a supported suffix (`s`, `ms`)",
                )
            })
    }
}
