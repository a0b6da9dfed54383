//! Feature Flag Resolution for Flagstone
//!
//! Layered feature-flag decisions: a global default per feature, combined
//! with per-customer and per-user overrides into a single boolean answer,
//! plus the set-membership queries built on top.
//!
//! # Features
//!
//! - 🚦 **Layered Resolution** - user override > customer override > default
//! - 🗂️ **Structural Scope Keys** - no NULL-comparison tricks in the key
//! - 🧹 **Cascading Removal** - feature, customer, and user cascades
//! - 🔁 **Atomic Rename** - default and overrides move together
//! - 🔌 **Pluggable Store** - in-memory here, SQLite in `flagstone-sqlite`
//!
//! # Quick Start
//!
//! ```
//! use flagstone_core::{FlagResolver, InMemoryFlagStore};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let flags = FlagResolver::new(Arc::new(InMemoryFlagStore::new()));
//!
//! flags.define_feature("new-checkout", false).await?;
//! flags.set_override("new-checkout", Some(42), None, true).await?;
//!
//! // Customer 42 is opted in, everyone else sees the default
//! assert!(flags.resolve("new-checkout", Some(42), None).await?);
//! assert!(!flags.resolve("new-checkout", Some(7), None).await?);
//! # Ok::<(), flagstone_core::FlagError>(())
//! # }).unwrap();
//! ```
//!
//! # Scoped Overrides
//!
//! ```
//! use flagstone_core::{FlagResolver, InMemoryFlagStore};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let flags = FlagResolver::new(Arc::new(InMemoryFlagStore::new()));
//!
//! flags.define_feature("beta-ui", true).await?;
//! // Disable for one customer, but keep one of their users opted in
//! flags.set_override("beta-ui", Some(1), None, false).await?;
//! flags.set_override("beta-ui", Some(1), Some(100), true).await?;
//!
//! assert!(!flags.resolve("beta-ui", Some(1), Some(200)).await?);
//! assert!(flags.resolve("beta-ui", Some(1), Some(100)).await?);
//! # Ok::<(), flagstone_core::FlagError>(())
//! # }).unwrap();
//! ```

pub mod error;
pub mod memory;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::{FlagError, FlagResult};
pub use memory::InMemoryFlagStore;
pub use model::{CustomerId, FeatureReport, FlagScope, UserId};
pub use resolver::FlagResolver;
pub use store::FlagStore;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{FlagError, FlagResult};
    pub use crate::memory::InMemoryFlagStore;
    pub use crate::model::{CustomerId, FeatureReport, FlagScope, UserId};
    pub use crate::resolver::FlagResolver;
    pub use crate::store::FlagStore;
}
