//! # keyscan storage
//!
//! Ordered key-value store abstraction for keyscan.
//!
//! Stores are **opaque ordered byte maps** organised in named buckets. They do
//! not interpret keys or values; the index and table layers own all key
//! layouts.
//!
//! ## Design Principles
//!
//! - Keys inside a bucket are ordered bytewise (lexicographically)
//! - Cursors iterate in strictly ascending key order
//! - All access happens through a transaction; read transactions see a
//!   consistent snapshot
//! - Stores must be `Send + Sync` for shared access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - Copy-on-write in-memory store for tests and
//!   ephemeral databases
//!
//! ## Example
//!
//! ```rust
//! use keyscan_storage::{CursorKind, InMemoryStore, KvStore};
//!
//! let store = InMemoryStore::new();
//! let mut tx = store.begin(true).unwrap();
//! tx.create_bucket(b"items").unwrap();
//! tx.put(b"items", b"b", b"2").unwrap();
//! tx.put(b"items", b"a", b"1").unwrap();
//! tx.commit().unwrap();
//!
//! let tx = store.begin(false).unwrap();
//! let mut cursor = tx.cursor(b"items", CursorKind::Forward).unwrap();
//! assert!(cursor.first());
//! assert_eq!(cursor.key(), b"a");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;

pub use backend::{Cursor, CursorKind, KvStore, StorageTx};
pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryStore, MemoryCursor};
