//! (de)serializes server names and keys held as [`Bytes`] as plain json strings
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serializer};

/// # Errors
/// Fails if the bytes are not valid utf8. Server names and keys are always built from strings, so
/// this would mean someone fed raw binary identifiers to the ring.
pub fn serialize<S: Serializer>(v: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    let stringified = std::str::from_utf8(v).map_err(|e| {
        serde::ser::Error::custom(format!("Unable to convert bytes into utf8 string - {}", e))
    })?;
    s.serialize_str(stringified)
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
    Ok(Bytes::from(String::deserialize(d)?))
}
