use std::time::Duration;

use serde::{Deserialize, Deserializer, de};

/// Deserialize an optional human-readable duration such as `"30s"` or `"2m"`
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    duration_str::parse(&raw)
        .map(Some)
        .map_err(|e| de::Error::custom(format!("invalid duration '{raw}': {e}")))
}
