use ahash::AHashMap;
use std::fmt;

/// A kind of locally recovered anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Recovery {
    /// A block delimiter could not be interpreted and was kept as literal text.
    MalformedDelimiter,
    /// An attribute capsule could not be decoded; the block got an empty attribute map.
    CapsuleDecode,
    /// A locked block index did not exist in the translated or target tree.
    LockOutOfRange,
    /// A locked path string did not follow the `blocks/<i>/...` grammar.
    InvalidLockPath,
    /// A replacer could not resolve a cross-entity identifier.
    UnresolvedReference,
    /// A translated attribute path did not exist in the original attributes.
    UnknownAttributePath,
    /// A translated value could not be coerced back into the original leaf type.
    LeafCoercion,
}

impl Recovery {
    /// Whether this recovery may hide lost data and should be surfaced as a warning.
    pub fn is_lossy(self) -> bool {
        !matches!(self, Recovery::UnresolvedReference)
    }
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Recovery::MalformedDelimiter => "malformed delimiter",
            Recovery::CapsuleDecode => "capsule decode",
            Recovery::LockOutOfRange => "lock out of range",
            Recovery::InvalidLockPath => "invalid lock path",
            Recovery::UnresolvedReference => "unresolved reference",
            Recovery::UnknownAttributePath => "unknown attribute path",
            Recovery::LeafCoercion => "leaf coercion",
        };
        f.write_str(name)
    }
}

/// A single recorded recovery with its human readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryNote {
    pub kind: Recovery,
    pub detail: String,
}

/// Collects every recovery performed during one engine operation.
///
/// Nothing recorded here fails the operation; callers inspect the counts to detect
/// silent data loss.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    counts: AHashMap<Recovery, usize>,
    notes: Vec<RecoveryNote>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a recovery and logs it.
    pub fn record(&mut self, kind: Recovery, detail: impl Into<String>) {
        let detail = detail.into();
        if kind.is_lossy() {
            log::warn!("Recovered from {}: {}", kind, detail);
        } else {
            log::debug!("Recovered from {}: {}", kind, detail);
        }
        *self.counts.entry(kind).or_insert(0) += 1;
        self.notes.push(RecoveryNote { kind, detail });
    }

    pub fn count(&self, kind: Recovery) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[RecoveryNote] {
        &self.notes
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "no recoveries");
        }
        let mut kinds: Vec<_> = self.counts.iter().collect();
        kinds.sort_by_key(|(kind, _)| **kind);
        let summary = itertools::join(
            kinds
                .into_iter()
                .map(|(kind, count)| format!("{} x{}", kind, count)),
            ", ",
        );
        write!(f, "{}", summary)
    }
}
