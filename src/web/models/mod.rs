pub mod tag_models;
pub mod todo_models;

use serde::{Deserialize, Deserializer};

/// Maps a present field (including an explicit `null`) to `Some`, so that
/// together with `#[serde(default)]` an absent field stays `None`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
