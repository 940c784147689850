//! Serialization implementations for LockFile
//!
//! On disk the lock file is one flat JSON object: digest entries and the two
//! metadata sentinels share the same key space.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserializer, Serializer};

use super::{GENERATED_AT_KEY, GENERATED_BY_KEY, LockMetadata};

/// Serialize entries and metadata as one flat map with sorted keys
pub fn serialize_lockfile<S>(
    entries: &BTreeMap<String, String>,
    metadata: &LockMetadata,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut flat: BTreeMap<&str, &str> = entries
        .iter()
        .map(|(key, digest)| (key.as_str(), digest.as_str()))
        .collect();
    if let Some(generated_at) = &metadata.generated_at {
        flat.insert(GENERATED_AT_KEY, generated_at);
    }
    if let Some(generated_by) = &metadata.generated_by {
        flat.insert(GENERATED_BY_KEY, generated_by);
    }

    let mut map = serializer.serialize_map(Some(flat.len()))?;
    for (key, value) in flat {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Deserialize a flat map, splitting the sentinels out of the entries
pub fn deserialize_lockfile<'de, D>(
    deserializer: D,
) -> std::result::Result<(BTreeMap<String, String>, LockMetadata), D::Error>
where
    D: Deserializer<'de>,
{
    struct LockFileVisitor;

    impl<'de> Visitor<'de> for LockFileVisitor {
        type Value = (BTreeMap<String, String>, LockMetadata);

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a flat JSON object of string values")
        }

        fn visit_map<M>(self, map: M) -> std::result::Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            process_map(map)
        }
    }

    deserializer.deserialize_map(LockFileVisitor)
}

fn process_map<'de, M>(
    mut map: M,
) -> std::result::Result<(BTreeMap<String, String>, LockMetadata), M::Error>
where
    M: MapAccess<'de>,
{
    let mut entries = BTreeMap::new();
    let mut metadata = LockMetadata::default();
    while let Some((key, value)) = map.next_entry::<String, String>()? {
        match key.as_str() {
            GENERATED_AT_KEY => metadata.generated_at = Some(value),
            GENERATED_BY_KEY => metadata.generated_by = Some(value),
            _ => {
                entries.insert(key, value);
            }
        }
    }
    Ok((entries, metadata))
}
