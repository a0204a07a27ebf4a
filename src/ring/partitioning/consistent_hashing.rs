//! Consistent-hashing is the default [`PartitioningScheme`] for chring
use crate::error::{Error, Result};
use bytes::Bytes;
use murmur3::murmur3_x86_128;
use std::{collections::HashMap, io::Cursor};
use tracing::{event, Level};

use super::{PartitioningScheme, RingPosition};

/// Separator used to derive virtual node names: `<server>_VN_<index>`
const VIRTUAL_NODE_SEPARATOR: &[u8] = b"_VN_";

/// ConsistentHashing is the partitioning scheme used by [`crate::ring::hash_ring::HashRing`].
/// Servers and keys are hashed into the same space, [0, 2^128), and that space is read as a circle:
/// a key belongs to the first server position found walking clockwise from the key's own hash
/// (a position equal to the key's hash counts), and walking past the largest position wraps back to the smallest one.
///
/// Small example with a space of [0, 10]:
/// positions: A -> 2, B -> 5, C -> 8
///
/// hash('foo') = 4 -> B (5 is the first position >= 4)
/// hash('bar') = 8 -> C (equal positions count)
/// hash('zoo') = 9 -> A (nothing >= 9, wraps around to 2)
///
/// Adding or removing a server only changes the owner of the arcs that end on its positions. Every
/// other key keeps its owner.
///
/// A single position per server gives very uneven arcs, so every server is hashed `virtual_nodes` times,
/// once per name `<server>_VN_<i>`. All of those positions point back to the same server.
///
/// Collisions: two different names can hash to the same position. When that happens the last
/// inserted virtual node wins and the previous owner silently loses that position. Removing the
/// winner later deletes the position altogether; it is NOT handed back to the previous owner.
/// A server can therefore stay registered while owning no position at all.
/// With a 128 bit hash space this is extremely unlikely, but the behavior is deterministic.
///
/// The hash is a plain `fn(&[u8]) -> RingPosition` rather than a [`std::hash::Hasher`]: names and keys are
/// short and hashed in one go, and tests can pin exact positions through [`ConsistentHashing::new_with_hash_fn`].
#[derive(Clone, Debug)]
pub struct ConsistentHashing {
    // owner of each position in `hashes` (same index)
    nodes: Vec<Bytes>,
    // sorted ring positions
    hashes: Vec<RingPosition>,
    // positions inserted on behalf of each registered node
    virtual_node_positions: HashMap<Bytes, Vec<RingPosition>>,
    virtual_nodes: usize,
    hash_fn: fn(&[u8]) -> RingPosition,
}

impl ConsistentHashing {
    /// Builds an empty ring that places `virtual_nodes` positions per server using [`murmur3_hash`]
    pub fn new(virtual_nodes: usize) -> Result<Self> {
        Self::new_with_hash_fn(virtual_nodes, murmur3_hash)
    }

    pub fn new_with_hash_fn(
        virtual_nodes: usize,
        hash_fn: fn(&[u8]) -> RingPosition,
    ) -> Result<Self> {
        if virtual_nodes == 0 {
            return Err(Error::InvalidConfig {
                reason: "virtual_nodes must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            nodes: Vec::new(),
            hashes: Vec::new(),
            virtual_node_positions: HashMap::new(),
            virtual_nodes,
            hash_fn,
        })
    }

    pub fn virtual_nodes(&self) -> usize {
        self.virtual_nodes
    }

    pub fn contains_node(&self, node: &[u8]) -> bool {
        self.virtual_node_positions.contains_key(node)
    }

    /// Index of the first position >= `position`, wrapping around to 0.
    /// Returns None if the ring is empty
    fn successor_index(&self, position: RingPosition) -> Option<usize> {
        if self.hashes.is_empty() {
            return None;
        }

        Some(self.hashes.partition_point(|elem| *elem < position) % self.hashes.len())
    }

    fn key_owner_index(&self, key: &[u8]) -> Result<usize> {
        let key_hash = (self.hash_fn)(key);
        self.successor_index(key_hash).ok_or(Error::NoServerAvailable)
    }
}

impl PartitioningScheme for ConsistentHashing {
    fn add_node(&mut self, node: Bytes) -> Result<Vec<Bytes>> {
        if self.contains_node(&node) {
            return Err(Error::DuplicateServer { server: node });
        }

        let positions: Vec<RingPosition> = (0..self.virtual_nodes)
            .map(|index| (self.hash_fn)(&virtual_node_name(&node, index)))
            .collect();

        // Every donor is resolved against the ring as it was before this call.
        // Inserting while resolving would make later virtual nodes see earlier ones as their successor.
        let mut donors: Vec<Bytes> = Vec::new();
        for position in positions.iter() {
            if let Some(index) = self.successor_index(*position) {
                let previous_owner = &self.nodes[index];
                if *previous_owner != node && !donors.contains(previous_owner) {
                    donors.push(previous_owner.clone());
                }
            }
        }

        for (index, position) in positions.iter().enumerate() {
            match self.hashes.binary_search(position) {
                Ok(existing) => {
                    if self.nodes[existing] != node {
                        event!(
                            Level::WARN,
                            "virtual node {}_VN_{} collided with a virtual node of {} at position {}. Last writer wins",
                            String::from_utf8_lossy(&node),
                            index,
                            String::from_utf8_lossy(&self.nodes[existing]),
                            position
                        );
                    }
                    self.nodes[existing] = node.clone();
                }
                Err(insert_at) => {
                    self.hashes.insert(insert_at, *position);
                    self.nodes.insert(insert_at, node.clone());
                }
            }

            event!(
                Level::DEBUG,
                "Added virtual node: {}_VN_{} with hash: {}",
                String::from_utf8_lossy(&node),
                index,
                position
            );
        }

        self.virtual_node_positions.insert(node, positions);

        Ok(donors)
    }

    fn remove_node(&mut self, node: &[u8]) -> Result<()> {
        let positions = self
            .virtual_node_positions
            .remove(node)
            .ok_or_else(|| Error::UnknownServer {
                server: Bytes::copy_from_slice(node),
            })?;

        for (index, position) in positions.iter().enumerate() {
            if let Ok(existing) = self.hashes.binary_search(position) {
                // a later collision may have handed this position to another node
                if self.nodes[existing] == node {
                    self.hashes.remove(existing);
                    self.nodes.remove(existing);
                }
            }

            event!(
                Level::DEBUG,
                "Removed virtual node: {}_VN_{} with hash: {}",
                String::from_utf8_lossy(node),
                index,
                position
            );
        }

        Ok(())
    }

    fn key_owner(&self, key: &[u8]) -> Result<Bytes> {
        let index = self.key_owner_index(key)?;
        Ok(self.nodes[index].clone())
    }

    fn has_other_owners(&self, node: &[u8]) -> bool {
        self.nodes.iter().any(|owner| owner != node)
    }

    fn positions(&self, node: &[u8]) -> Vec<RingPosition> {
        self.hashes
            .iter()
            .zip(self.nodes.iter())
            .filter(|(_, owner)| *owner == node)
            .map(|(position, _)| *position)
            .collect()
    }

    fn len(&self) -> usize {
        self.hashes.len()
    }
}

/// Builds the name that gets hashed for the `index`-th virtual node of `node`
pub fn virtual_node_name(node: &[u8], index: usize) -> Vec<u8> {
    let index = index.to_string();
    let mut name = Vec::with_capacity(node.len() + VIRTUAL_NODE_SEPARATOR.len() + index.len());
    name.extend_from_slice(node);
    name.extend_from_slice(VIRTUAL_NODE_SEPARATOR);
    name.extend_from_slice(index.as_bytes());
    name
}

/// MurmurHash3 (x86, 128 bits, seed 0). Used for servers, virtual nodes and keys alike.
pub fn murmur3_hash(key: &[u8]) -> RingPosition {
    murmur3_x86_128(&mut Cursor::new(key), 0)
        .expect("reading from an in-memory cursor never fails")
}
