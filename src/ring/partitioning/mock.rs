//! The mock module contains a mock [`PartitioningScheme`] used for tests
use bytes::Bytes;

use super::{PartitioningScheme, RingPosition};
use crate::error::{Error, Result};

/// Routes every key to the most recently added node and never reports donors.
/// This lets tests change a key's owner without the [`crate::HashRing`] reassigning anything,
/// which no real scheme does.
#[derive(Default)]
pub struct MockPartitioningScheme {
    nodes: Vec<Bytes>,
}

impl PartitioningScheme for MockPartitioningScheme {
    fn add_node(&mut self, node: Bytes) -> Result<Vec<Bytes>> {
        self.nodes.push(node);
        Ok(Vec::new())
    }

    fn remove_node(&mut self, node: &[u8]) -> Result<()> {
        self.nodes.retain(|n| n != node);
        Ok(())
    }

    fn key_owner(&self, _key: &[u8]) -> Result<Bytes> {
        self.nodes.last().cloned().ok_or(Error::NoServerAvailable)
    }

    fn has_other_owners(&self, node: &[u8]) -> bool {
        self.nodes.iter().any(|n| n != node)
    }

    fn positions(&self, node: &[u8]) -> Vec<RingPosition> {
        self.nodes
            .iter()
            .position(|n| n == node)
            .map(|index| vec![index as RingPosition])
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
