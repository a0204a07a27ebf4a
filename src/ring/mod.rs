//! Module that contains the hash ring and everything it needs: the partitioning scheme that places
//! servers and keys on the ring, the assignment tracker and its thread-safe handle.
pub mod config;
pub mod hash_ring;
pub mod partitioning;
pub mod state;
