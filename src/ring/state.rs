//! This file contains the [`SharedRing`] data structure.
//! It is a cloneable handle over a single [`HashRing`] that can be shared between threads.
//!
//! The ring positions and the key assignments form a single unit: a topology change reads the current
//! positions and key sequences and then rewrites them. For this reason every operation holds one exclusive
//! lock for its whole duration. Readers therefore only ever observe the state before or after a change,
//! never a half-applied reassignment.
use bytes::Bytes;
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::error::{Error, Result};

use super::{
    hash_ring::{Distribution, HashRing},
    partitioning::RingPosition,
};

#[derive(Clone)]
pub struct SharedRing {
    inner: Arc<Mutex<HashRing>>,
}

impl std::fmt::Debug for SharedRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Ok(inner) => {
                write!(f, "SharedRing: {:?}", inner)
            }
            Err(_) => {
                write!(f, "Unable to acquire lock for logging at this time...")
            }
        }
    }
}

impl From<HashRing> for SharedRing {
    fn from(ring: HashRing) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ring)),
        }
    }
}

impl SharedRing {
    pub fn new(virtual_nodes: usize) -> Result<Self> {
        Ok(HashRing::new(virtual_nodes)?.into())
    }

    pub fn from_config_path(path: &Path) -> Result<Self> {
        Ok(HashRing::from_config_path(path)?.into())
    }

    /// A poisoned mutex means a previous operation panicked half way through a reassignment.
    /// The ring can't be trusted anymore so this is reported as [`Error::Internal`]
    fn acquire_lock(&self) -> Result<MutexGuard<HashRing>> {
        if let Ok(guard) = self.inner.lock() {
            Ok(guard)
        } else {
            Err(Error::Internal {
                reason: "Unable to acquire lock - poisoned...".to_string(),
            })
        }
    }

    pub fn add_server(&self, server: impl Into<Bytes>) -> Result<()> {
        self.acquire_lock()?.add_server(server)
    }

    /// See [`HashRing::remove_server`]. A registered server that owns no ring position doesn't count
    /// as available.
    pub fn remove_server(&self, server: &[u8]) -> Result<()> {
        self.acquire_lock()?.remove_server(server)
    }

    pub fn assign_key(&self, key: impl Into<Bytes>) -> Result<Bytes> {
        self.acquire_lock()?.assign_key(key)
    }

    pub fn locate(&self, key: &[u8]) -> Result<Bytes> {
        self.acquire_lock()?.locate(key)
    }

    pub fn keys_of(&self, server: &[u8]) -> Result<Vec<Bytes>> {
        Ok(self.acquire_lock()?.keys_of(server))
    }

    pub fn owner_of(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.acquire_lock()?.owner_of(key))
    }

    pub fn contains_server(&self, server: &[u8]) -> Result<bool> {
        Ok(self.acquire_lock()?.contains_server(server))
    }

    pub fn servers(&self) -> Result<Vec<Bytes>> {
        Ok(self.acquire_lock()?.servers())
    }

    pub fn positions(&self, server: &[u8]) -> Result<Vec<RingPosition>> {
        Ok(self.acquire_lock()?.positions(server))
    }

    /// Total number of ring positions
    pub fn len(&self) -> Result<usize> {
        Ok(self.acquire_lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.acquire_lock()?.is_empty())
    }

    pub fn key_count(&self) -> Result<usize> {
        Ok(self.acquire_lock()?.key_count())
    }

    pub fn distribution(&self) -> Result<Distribution> {
        Ok(self.acquire_lock()?.distribution())
    }
}
