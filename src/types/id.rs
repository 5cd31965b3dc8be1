// ABOUTME: Phantom-typed identifiers for provider resources.
// ABOUTME: Each resource kind carries its label and the prefix used for locally minted IDs.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

/// A kind of provider resource that can be named by an [`Id`].
pub trait ResourceKind {
    /// How the resource is called in messages, e.g. `ip block`.
    const LABEL: &'static str;
    /// Prefix of IDs minted in-process, e.g. `nic` for `nic-3`.
    const PREFIX: &'static str;
}

pub enum DatacenterMarker {}
pub enum ServerMarker {}
pub enum PoolMarker {}
pub enum NicMarker {}
pub enum RequestMarker {}

impl ResourceKind for DatacenterMarker {
    const LABEL: &'static str = "datacenter";
    const PREFIX: &'static str = "dc";
}

impl ResourceKind for ServerMarker {
    const LABEL: &'static str = "server";
    const PREFIX: &'static str = "srv";
}

impl ResourceKind for PoolMarker {
    const LABEL: &'static str = "ip block";
    const PREFIX: &'static str = "ipblock";
}

impl ResourceKind for NicMarker {
    const LABEL: &'static str = "nic";
    const PREFIX: &'static str = "nic";
}

impl ResourceKind for RequestMarker {
    const LABEL: &'static str = "request";
    const PREFIX: &'static str = "req";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("{kind} id cannot be empty")]
    Empty { kind: &'static str },
}

/// Opaque provider ID tagged with the kind of resource it names, so a
/// `ServerId` can't be passed where a `DatacenterId` is expected.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T: ResourceKind> Id<T> {
    /// Parse an ID handed in by a caller. Surrounding whitespace is dropped;
    /// nothing else is assumed about the provider's ID format.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: T::LABEL });
        }
        Ok(Self::new(trimmed))
    }

    /// ID for the `n`th resource of this kind created in-process.
    pub fn numbered(n: u64) -> Self {
        Self::new(format!("{}-{n}", T::PREFIX))
    }

    /// The ID qualified with its kind, e.g. `ip block pool-1`.
    pub fn labelled(&self) -> String {
        format!("{} {}", T::LABEL, self.value)
    }
}

impl<T: ResourceKind> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({} {:?})", T::LABEL, self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

// Pool snapshots and fixtures must not carry blank IDs.
impl<'de, T: ResourceKind> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

pub type DatacenterId = Id<DatacenterMarker>;
pub type ServerId = Id<ServerMarker>;
pub type PoolId = Id<PoolMarker>;
pub type NicId = Id<NicMarker>;
pub type RequestId = Id<RequestMarker>;
