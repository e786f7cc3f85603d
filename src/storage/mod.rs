//! Storage Engine Module
//!
//! The process-wide keyspace for linekv: a sharded map with lazy, per-key
//! expiry. Created empty at startup and shared by every connection.
//!
//! ## Example
//!
//! ```
//! use linekv::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let engine = Arc::new(StorageEngine::new());
//!
//! engine.set(Bytes::from("name"), Bytes::from("linekv"), None);
//! assert_eq!(engine.get(&Bytes::from("name")), Some(Bytes::from("linekv")));
//!
//! engine.set(
//!     Bytes::from("session"),
//!     Bytes::from("token123"),
//!     Some(Duration::from_secs(3600)),
//! );
//! ```

pub mod engine;

pub use engine::{Entry, StorageEngine, StorageStats};
