pub mod error;
pub mod ring;
pub mod telemetry;
pub mod utils;

pub use error::{Error, Result};
pub use ring::{config::RingConfig, hash_ring::HashRing, state::SharedRing};
