//! Module that contains the partitioning schemes a [`super::hash_ring::HashRing`] can route keys with
use crate::error::Result;
use bytes::Bytes;

pub mod consistent_hashing;
#[cfg(test)]
pub mod mock;

/// Position of a node or key inside the circular hash space.
pub type RingPosition = u128;

/// This trait defines a PartitioningScheme (ie: how should keys be split amongst servers)
///
/// It only knows about ring positions and which node owns them. It never sees which keys were
/// assigned where: that bookkeeping lives in [`super::hash_ring::HashRing`], which relies on the
/// donor list returned by `add_node` to know which servers may have lost keys.
pub trait PartitioningScheme {
    /// adds a new node to the partition state.
    ///
    /// Returns every node that owned one of the arcs the new node now covers (ie: the nodes that
    /// might have to hand keys over to the new node). The new node itself is never part of this list.
    fn add_node(&mut self, node: Bytes) -> Result<Vec<Bytes>>;

    /// removes a node from the partition state
    fn remove_node(&mut self, node: &[u8]) -> Result<()>;

    /// returns the owner of a given key
    fn key_owner(&self, key: &[u8]) -> Result<Bytes>;

    /// returns true if at least one ring position is owned by a node other than `node`
    fn has_other_owners(&self, node: &[u8]) -> bool;

    /// returns the ring positions currently owned by `node`, in ascending order
    fn positions(&self, node: &[u8]) -> Vec<RingPosition>;

    /// number of positions in the ring
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
