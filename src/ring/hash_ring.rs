//! This file contains the [`HashRing`] data structure.
//! It owns the [`PartitioningScheme`] provided during construction and delegates
//! questions like "which server owns a given key" to it.
//!
//! On top of that, it keeps track of every key that was explicitly assigned through [`HashRing::assign_key`]
//! and of which server it is currently routed to. Whenever the topology changes (a server joins or leaves),
//! only the keys whose owning arc changed are moved between servers.
//!
//! Every routing decision (assignment, reassignment after a join, relocation after a leave) goes through
//! [`PartitioningScheme::key_owner`]. This guarantees that a recorded key always sits under the server
//! that [`HashRing::locate`] would return for it.
use std::{
    collections::HashMap,
    fmt::{Debug, Display},
    path::Path,
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{event, instrument, Level};

use crate::{
    error::{Error, Result},
    utils::{serde_utf8_bytes, serde_vec_utf8_bytes},
};

use super::{
    config::RingConfig,
    partitioning::{consistent_hashing::ConsistentHashing, PartitioningScheme, RingPosition},
};

pub struct HashRing {
    partitioning_scheme: Box<dyn PartitioningScheme + Send>,
    // keys currently routed to each registered server, in the order they were received
    assignments: HashMap<Bytes, Vec<Bytes>>,
    // reverse index of `assignments`: key -> server it is recorded under
    owners: HashMap<Bytes, Bytes>,
}

impl Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashRing {{ positions: {}, servers: {}, keys: {} }}",
            self.partitioning_scheme.len(),
            self.assignments.len(),
            self.owners.len()
        )
    }
}

impl HashRing {
    /// Builds an empty ring where every server is represented by `virtual_nodes` positions.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if `virtual_nodes` is 0
    pub fn new(virtual_nodes: usize) -> Result<Self> {
        Ok(Self::with_partitioning_scheme(Box::new(
            ConsistentHashing::new(virtual_nodes)?,
        )))
    }

    pub fn with_partitioning_scheme(partitioning_scheme: Box<dyn PartitioningScheme + Send>) -> Self {
        Self {
            partitioning_scheme,
            assignments: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn from_config(config: &RingConfig) -> Result<Self> {
        let partitioning_scheme = ConsistentHashing::new_with_hash_fn(
            config.virtual_nodes,
            config.hash_function.hash_fn(),
        )?;
        Ok(Self::with_partitioning_scheme(Box::new(partitioning_scheme)))
    }

    pub fn from_config_path(path: &Path) -> Result<Self> {
        Self::from_config(&RingConfig::from_path(path)?)
    }

    /// Registers a new server and moves to it every recorded key it now owns.
    ///
    /// Only servers that previously owned one of the arcs now covered by the new server's virtual
    /// nodes are inspected. Keys recorded under any other server are never touched.
    ///
    /// # Errors
    /// [`Error::DuplicateServer`] if the server is already registered
    pub fn add_server(&mut self, server: impl Into<Bytes>) -> Result<()> {
        self.insert_server(server.into())
    }

    #[instrument(name = "hash_ring::add_server", level = "info", skip(self))]
    fn insert_server(&mut self, server: Bytes) -> Result<()> {
        if self.assignments.contains_key(&server) {
            return Err(Error::DuplicateServer { server });
        }

        let donors = self.partitioning_scheme.add_node(server.clone())?;
        self.assignments.insert(server.clone(), Vec::new());

        event!(
            Level::INFO,
            "Reassigning keys for new server {}...",
            String::from_utf8_lossy(&server)
        );

        // decide everything against the current ring before touching any key sequence
        let mut plan = Vec::with_capacity(donors.len());
        for donor in donors {
            let mut staying = Vec::new();
            let mut moving = Vec::new();
            for key in self.keys_slice(&donor) {
                if self.partitioning_scheme.key_owner(key)? == server {
                    moving.push(key.clone());
                } else {
                    staying.push(key.clone());
                }
            }
            plan.push((donor, staying, moving));
        }

        for (donor, staying, moving) in plan {
            for key in moving {
                event!(
                    Level::DEBUG,
                    "Key {} reassigned from {} to {}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&donor),
                    String::from_utf8_lossy(&server)
                );
                self.record(key, server.clone());
            }
            self.assignments.insert(donor, staying);
        }

        Ok(())
    }

    /// Unregisters a server and relocates each of its keys to their new owner.
    ///
    /// # Errors
    ///  - [`Error::UnknownServer`] if the server is not part of the ring
    ///  - [`Error::NoServerAvailable`] if the server still holds keys and no other server owns a ring position.
    ///    In this case nothing is changed.
    ///
    /// "Available" means owning at least one ring position, not merely being registered. After a hash
    /// collision a registered server can be left with no position at all (see
    /// [`ConsistentHashing`]); such a server never receives keys, so it can't take over the leaving
    /// server's keys either.
    #[instrument(
        name = "hash_ring::remove_server",
        level = "info",
        skip_all,
        fields(server = %String::from_utf8_lossy(server))
    )]
    pub fn remove_server(&mut self, server: &[u8]) -> Result<()> {
        let has_keys = match self.assignments.get(server) {
            Some(keys) => !keys.is_empty(),
            None => {
                return Err(Error::UnknownServer {
                    server: Bytes::copy_from_slice(server),
                })
            }
        };

        if has_keys && !self.partitioning_scheme.has_other_owners(server) {
            return Err(Error::NoServerAvailable);
        }

        self.partitioning_scheme.remove_node(server)?;
        let keys = self.assignments.remove(server).unwrap_or_default();

        if keys.is_empty() {
            event!(
                Level::INFO,
                "No keys were assigned to {}",
                String::from_utf8_lossy(server)
            );
            return Ok(());
        }

        event!(
            Level::INFO,
            "Reassigning {} keys from {}...",
            keys.len(),
            String::from_utf8_lossy(server)
        );

        let mut relocations = Vec::with_capacity(keys.len());
        for key in keys {
            let new_owner = self.partitioning_scheme.key_owner(&key)?;
            relocations.push((key, new_owner));
        }

        for (key, new_owner) in relocations {
            event!(
                Level::DEBUG,
                "Key {} reassigned from {} to {}",
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(server),
                String::from_utf8_lossy(&new_owner)
            );
            self.record(key, new_owner);
        }

        Ok(())
    }

    /// Routes `key` and records it under its owner. Returns the owner.
    ///
    /// Assigning a key that was already assigned doesn't duplicate it. If it is recorded under the
    /// server [`HashRing::locate`] returns, nothing changes. Otherwise it is dropped from the server it
    /// was recorded under and appended to the owner's keys.
    ///
    /// # Errors
    /// [`Error::NoServerAvailable`] if the ring is empty
    pub fn assign_key(&mut self, key: impl Into<Bytes>) -> Result<Bytes> {
        self.record_key(key.into())
    }

    #[instrument(name = "hash_ring::assign_key", level = "debug", skip(self))]
    fn record_key(&mut self, key: Bytes) -> Result<Bytes> {
        let owner = self.partitioning_scheme.key_owner(&key)?;

        match self.owners.get(&key) {
            Some(recorded) if *recorded == owner => {
                event!(
                    Level::DEBUG,
                    "Key {} already assigned to server {}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&owner)
                );
                return Ok(owner);
            }
            Some(recorded) => {
                let recorded = recorded.clone();
                event!(
                    Level::DEBUG,
                    "Key {} moved from server {} to {}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&recorded),
                    String::from_utf8_lossy(&owner)
                );
                if let Some(keys) = self.assignments.get_mut(&recorded) {
                    keys.retain(|k| *k != key);
                }
            }
            None => {}
        }

        event!(
            Level::DEBUG,
            "Assigned key {} to server {}",
            String::from_utf8_lossy(&key),
            String::from_utf8_lossy(&owner)
        );
        self.record(key, owner.clone());

        Ok(owner)
    }

    /// Returns the server that owns `key` without recording anything
    pub fn locate(&self, key: &[u8]) -> Result<Bytes> {
        self.partitioning_scheme.key_owner(key)
    }

    /// Keys currently recorded under `server`. Empty if the server is unknown.
    pub fn keys_of(&self, server: &[u8]) -> Vec<Bytes> {
        self.keys_slice(server).to_vec()
    }

    /// Server a key is currently recorded under, if it was ever assigned
    pub fn owner_of(&self, key: &[u8]) -> Option<Bytes> {
        self.owners.get(key).cloned()
    }

    pub fn contains_server(&self, server: &[u8]) -> bool {
        self.assignments.contains_key(server)
    }

    /// Registered servers, sorted
    pub fn servers(&self) -> Vec<Bytes> {
        let mut servers: Vec<Bytes> = self.assignments.keys().cloned().collect();
        servers.sort();
        servers
    }

    /// Ring positions currently owned by `server`
    pub fn positions(&self, server: &[u8]) -> Vec<RingPosition> {
        self.partitioning_scheme.positions(server)
    }

    /// Total number of ring positions
    pub fn len(&self) -> usize {
        self.partitioning_scheme.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitioning_scheme.is_empty()
    }

    /// Number of distinct keys recorded across all servers
    pub fn key_count(&self) -> usize {
        self.owners.len()
    }

    pub fn distribution(&self) -> Distribution {
        Distribution {
            servers: self
                .servers()
                .into_iter()
                .map(|server| ServerKeys {
                    keys: self.keys_of(&server),
                    server,
                })
                .collect(),
        }
    }

    fn keys_slice(&self, server: &[u8]) -> &[Bytes] {
        self.assignments
            .get(server)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn record(&mut self, key: Bytes, server: Bytes) {
        self.assignments
            .entry(server.clone())
            .or_default()
            .push(key.clone());
        self.owners.insert(key, server);
    }
}

/// Snapshot of which keys are recorded under which server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub servers: Vec<ServerKeys>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerKeys {
    #[serde(with = "serde_utf8_bytes")]
    pub server: Bytes,
    #[serde(with = "serde_vec_utf8_bytes")]
    pub keys: Vec<Bytes>,
}

impl Distribution {
    pub fn total_keys(&self) -> usize {
        self.servers.iter().map(|s| s.keys.len()).sum()
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in self.servers.iter() {
            let keys: Vec<_> = entry.keys.iter().map(|k| String::from_utf8_lossy(k)).collect();
            writeln!(
                f,
                "Server: {}, Keys: [{}]",
                String::from_utf8_lossy(&entry.server),
                keys.join(", ")
            )?;
        }

        Ok(())
    }
}
