pub mod health;
pub mod tags;
pub mod tasks;

use serde::{Deserialize, Deserializer};

/// Deserialize a numeric query parameter that may arrive with an empty value
/// (`?page=&total=`). Empty counts as absent; a non-numeric value is still an
/// error.
pub(crate) fn empty_as_none<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
