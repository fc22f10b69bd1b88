//! Type-safe identifier wrappers.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Agent, site and patch
//! IDs are dense counters handed out by their owners so that seeded runs are
//! reproducible; a run is tagged with a UUID v7 for its recorded output.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a raw integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($raw:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $raw);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            /// Return the inner raw value.
            pub const fn into_inner(self) -> $raw {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(raw: $raw) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent. Assigned once at spawn and never reused.
    AgentId(u64)
}

define_id! {
    /// Identifier for an aggregation site.
    SiteId(u32)
}

define_id! {
    /// Identifier for a grass patch center.
    PatchId(u32)
}

/// Identifier for one simulation run, attached to its recorded snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new run identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
