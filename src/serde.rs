use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Skips `"name": null` entries, which GitHub uses for removed files
pub fn present_entries<'de, D, V>(deser: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let map = <BTreeMap<String, Option<V>>>::deserialize(deser)?;
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

pub mod rfc3339 {
    use std::borrow::Cow;

    use serde::{de::Error as _, ser::Error as _, Deserialize as _};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        let s = dt.format(&Rfc3339).map_err(S::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        let s = <Cow<'_, str>>::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, &Rfc3339).map_err(D::Error::custom)
    }

}
