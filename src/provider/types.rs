// ABOUTME: Shared types used across provider trait definitions.
// ABOUTME: AddressPool, ComputeResourceRef, NicSpec, OperationRef, OperationState.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::types::{DatacenterId, NetworkId, NicId, PoolId, RequestId, ServerId};

/// Snapshot of a floating address pool (a reserved IP block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPool {
    /// Pool identifier.
    pub id: PoolId,
    /// Reserved addresses, in the order the provider reports them.
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    /// Active bindings of pool addresses to resources.
    #[serde(default)]
    pub consumers: Vec<IpConsumer>,
}

/// A binding recording that a pool address is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConsumer {
    /// The address held.
    pub ip: IpAddr,
    /// NIC holding the address, if the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic: Option<NicId>,
    /// Server the NIC belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
    /// Datacenter the server lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<DatacenterId>,
}

impl IpConsumer {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            nic: None,
            server: None,
            datacenter: None,
        }
    }
}

impl AddressPool {
    pub fn new(id: PoolId, addresses: Vec<IpAddr>) -> Self {
        Self {
            id,
            addresses,
            consumers: Vec::new(),
        }
    }

    /// Whether any consumer currently holds `ip`.
    pub fn is_held(&self, ip: &IpAddr) -> bool {
        self.consumers.iter().any(|c| c.ip == *ip)
    }

    /// Whether `ip` is one of the pool's reserved addresses.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addresses.contains(ip)
    }

    /// All free addresses, in pool order.
    pub fn free_addresses(&self) -> Vec<IpAddr> {
        self.addresses
            .iter()
            .filter(|ip| !self.is_held(ip))
            .copied()
            .collect()
    }
}

/// The compute resource a NIC gets attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComputeResourceRef {
    pub datacenter: DatacenterId,
    pub server: ServerId,
}

impl ComputeResourceRef {
    pub fn new(datacenter: DatacenterId, server: ServerId) -> Self {
        Self { datacenter, server }
    }
}

impl fmt::Display for ComputeResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.datacenter.labelled(), self.server.labelled())
    }
}

/// Specification of a network interface to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicSpec {
    /// LAN the interface is bound to.
    pub lan: NetworkId,
    /// Addresses assigned to the interface. Empty lets the provider choose.
    pub ips: Vec<IpAddr>,
}

impl NicSpec {
    pub fn for_lan(lan: NetworkId) -> Self {
        Self {
            lan,
            ips: Vec::new(),
        }
    }

    /// Bind the interface to `ip` as its only assigned address.
    pub fn with_address(mut self, ip: IpAddr) -> Self {
        self.ips = vec![ip];
        self
    }
}

/// Reference to the provider-side operation created by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRef {
    /// Provider request tracking the operation.
    pub request_id: RequestId,
    /// NIC being created.
    pub nic_id: NicId,
    /// Resource the NIC is attached to.
    pub target: ComputeResourceRef,
}

/// Lifecycle state of a provider operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OperationState {
    Queued,
    Running,
    Done,
    Failed { message: String },
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Done | OperationState::Failed { .. })
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Queued => write!(f, "queued"),
            OperationState::Running => write!(f, "running"),
            OperationState::Done => write!(f, "done"),
            OperationState::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}
