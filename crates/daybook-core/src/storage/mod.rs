//! Key-value storage contract shared by the file store and the in-memory double.

mod kv_store;

pub use kv_store::{InMemoryStore, KeyValueStore, StoreError};
