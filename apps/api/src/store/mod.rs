pub mod objects;
pub mod records;

#[cfg(test)]
pub mod memory;

pub use objects::ObjectStorage;
pub use records::{RecordStore, StoreError};
