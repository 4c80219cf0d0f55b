//! Byte-level persistence of parameter records.
//!
//! Implementors hold plain host data (`Vec<f64>`, shapes, flags), never
//! backend tensors, so the bytes are portable across backends and devices.

use std::error::Error;

/// Parameter representation that can be written to and read from bytes.
pub trait SerializableParams: Sized {
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}
