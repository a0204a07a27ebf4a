//! Same as [`super::serde_utf8_bytes`] for a whole key sequence
use bytes::Bytes;
use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(v: &[Bytes], s: S) -> Result<S::Ok, S::Error> {
    let mut seq = s.serialize_seq(Some(v.len()))?;
    for elem in v {
        seq.serialize_element(&String::from_utf8_lossy(elem))?;
    }
    seq.end()
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Bytes>, D::Error> {
    let strings = Vec::<String>::deserialize(d)?;
    Ok(strings.into_iter().map(Bytes::from).collect())
}
