use indexmap::{IndexMap, IndexSet};

pub type MetadataMap = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMerge {
    pub merged: MetadataMap,
    /// Target keys dropped because clearing was requested.
    pub removed: Vec<String>,
}

/// Merges metadata by priority: locked keys keep the target value; every other key takes the
/// translated value, then the target value, then the source value.
///
/// With `remove_unlisted`, the target is not consulted for unlocked keys, and target keys that
/// neither the translation nor the source carry are removed.
pub fn apply_metadata_locks<S: AsRef<str>>(
    translated: &MetadataMap,
    target: &MetadataMap,
    source: &MetadataMap,
    locked_keys: &[S],
    remove_unlisted: bool,
) -> MetadataMerge {
    let locked: IndexSet<&str> = locked_keys.iter().map(AsRef::as_ref).collect();
    let keys: IndexSet<&str> = source
        .keys()
        .chain(translated.keys())
        .chain(target.keys())
        .map(String::as_str)
        .collect();

    let mut result = MetadataMerge::default();
    for key in keys {
        if locked.contains(key) {
            if let Some(value) = target.get(key) {
                result.merged.insert(key.to_string(), value.clone());
            }
            continue;
        }

        let value = if remove_unlisted {
            translated.get(key).or_else(|| source.get(key))
        } else {
            translated
                .get(key)
                .or_else(|| target.get(key))
                .or_else(|| source.get(key))
        };
        match value {
            Some(value) => {
                result.merged.insert(key.to_string(), value.clone());
            }
            None => {
                log::debug!("Removing metadata key '{}' from target", key);
                result.removed.push(key.to_string());
            }
        }
    }
    result
}
