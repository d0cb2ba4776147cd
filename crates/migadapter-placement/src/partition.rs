//! GPU partition identifiers.
//!
//! A partition is named by its compute-slice count and memory size, e.g.
//! `nvidia.com/mig-2g.10gb`. Identifiers order by compute first, then
//! memory, which is the order the upsizing search walks.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use migadapter_core::PARTITION_RESOURCE_PREFIX;

static PARTITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^nvidia\.com/mig-([0-9]+)g\.([0-9]+)gb$").expect("partition pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("not a partition resource name: {0:?}")]
    Format(String),

    #[error("partition {0:?} has a zero or out-of-range size")]
    Size(String),
}

/// A `(compute, memory)` partition size.
///
/// Field order gives the derived `Ord` its compute-then-memory ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionId {
    pub compute: u32,
    pub memory: u32,
}

impl PartitionId {
    pub const fn new(compute: u32, memory: u32) -> Self {
        Self { compute, memory }
    }

    /// Canonical resource name, e.g. `nvidia.com/mig-1g.5gb`.
    pub fn resource_name(&self) -> String {
        self.to_string()
    }
}

/// Whether `name` belongs to the partition resource family.
pub fn is_partition_resource(name: &str) -> bool {
    name.starts_with(PARTITION_RESOURCE_PREFIX)
}

impl FromStr for PartitionId {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PARTITION_RE
            .captures(s)
            .ok_or_else(|| PartitionError::Format(s.to_string()))?;
        let size = |i: usize| -> Result<u32, PartitionError> {
            caps[i]
                .parse::<u32>()
                .ok()
                .filter(|v| *v >= 1)
                .ok_or_else(|| PartitionError::Size(s.to_string()))
        };
        let id = PartitionId {
            compute: size(1)?,
            memory: size(2)?,
        };
        // Leading zeros would alias the canonical name.
        if id.to_string() != s {
            return Err(PartitionError::Format(s.to_string()));
        }
        Ok(id)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PARTITION_RESOURCE_PREFIX}{}g.{}gb",
            self.compute, self.memory
        )
    }
}

impl Serialize for PartitionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartitionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
