//! Opaque identifier newtypes for resources and converters.
//!
//! Both IDs are intentionally minimal: [`ResourceId`] only needs equality
//! and hashing (it is a map key), [`ConverterId`] additionally carries a
//! stable identity that the host can compare across ticks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle for a resource kind.
///
/// Equality and hashing are the only operations the broker relies on.
/// `Ord`/`Display` are derived purely so `BTreeMap`-keyed tests and
/// diagnostics have a stable order; the allocation algorithm never
/// compares two `ResourceId`s for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Wrap a raw integer as a resource id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the wrapped integer.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<ResourceId> for u64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Globally unique identity assigned to a converter at creation.
///
/// Wraps a UUID v7 (time-ordered) so identifiers created later in a run
/// sort after earlier ones, matching the convention the rest of the
/// simulation's identifiers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConverterId(pub Uuid);

impl ConverterId {
    /// Create a new, unique converter identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConverterId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConverterId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConverterId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ConverterId> for Uuid {
    fn from(id: ConverterId) -> Self {
        id.0
    }
}
