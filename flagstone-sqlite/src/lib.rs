//! SQLite Flag Store for Flagstone
//!
//! Durable [`FlagStore`](flagstone_core::FlagStore) backed by SQLite. Every
//! multi-row mutation (override upsert, cascades, rename) runs in a single
//! transaction, so readers never observe a half-applied cascade.
//!
//! # Quick Start
//!
//! ```
//! use flagstone_core::FlagResolver;
//! use flagstone_sqlite::SqliteFlagStore;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = SqliteFlagStore::open_in_memory()?;
//! let flags = FlagResolver::new(Arc::new(store));
//!
//! flags.define_feature("dark-mode", true).await?;
//! assert!(flags.resolve("dark-mode", Some(1), None).await?);
//! # Ok::<(), flagstone_core::FlagError>(())
//! # }).unwrap();
//! ```

pub mod store;

pub use store::SqliteFlagStore;
