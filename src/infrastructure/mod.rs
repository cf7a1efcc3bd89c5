//! Adapters for the domain ports: in-memory, JSON file and (optionally)
//! RocksDB backed.

pub mod in_memory;
pub mod json_file;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
