//! Flag Store Trait
//!
//! Durable substrate for the three relations. Implementations provide
//! primitive row operations; all decision logic lives in the
//! [`FlagResolver`](crate::FlagResolver). Every mutation must be atomic —
//! readers never observe a half-applied cascade or rename.

use crate::error::FlagResult;
use crate::model::{CustomerId, FlagScope, UserId};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Flag store trait (implement with your database)
///
/// Ships with [`InMemoryFlagStore`](crate::InMemoryFlagStore); the
/// `flagstone-sqlite` crate provides a durable SQLite implementation.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Register a customer. Idempotent.
    async fn insert_customer(&self, customer_id: CustomerId) -> FlagResult<()>;

    /// Delete a customer and every override keyed to it, including
    /// user-level overrides pinned under it. Missing rows are a no-op.
    async fn delete_customer(&self, customer_id: CustomerId) -> FlagResult<()>;

    /// Delete every override keyed to this user id, regardless of which
    /// customer it was pinned under. Missing rows are a no-op.
    async fn delete_user(&self, user_id: UserId) -> FlagResult<()>;

    /// All registered customers.
    async fn customers(&self) -> FlagResult<BTreeSet<CustomerId>>;

    /// Create or replace a feature's global default.
    async fn upsert_feature(&self, name: &str, enabled: bool) -> FlagResult<()>;

    /// Global default for a feature, `None` when undefined.
    async fn feature_default(&self, name: &str) -> FlagResult<Option<bool>>;

    /// Delete a feature's default and all its overrides. Missing rows are
    /// a no-op.
    async fn delete_feature(&self, name: &str) -> FlagResult<()>;

    /// Atomically move the default row and every override from `old` to
    /// `new`. Fails with [`FlagError::NotFound`](crate::FlagError::NotFound)
    /// when `old` is undefined and
    /// [`FlagError::Conflict`](crate::FlagError::Conflict) when `new` is
    /// already defined; both checks happen inside the same transaction as
    /// the move.
    async fn rename_feature(&self, old: &str, new: &str) -> FlagResult<()>;

    /// All features with their global defaults.
    async fn features(&self) -> FlagResult<BTreeMap<String, bool>>;

    /// Create or replace the override for `(feature, scope)`.
    async fn upsert_override(
        &self,
        feature: &str,
        scope: &FlagScope,
        enabled: bool,
    ) -> FlagResult<()>;

    /// Delete the override for `(feature, scope)`. Missing row is a no-op.
    async fn delete_override(&self, feature: &str, scope: &FlagScope) -> FlagResult<()>;

    /// Override value for `(feature, scope)`, `None` when absent.
    async fn override_value(&self, feature: &str, scope: &FlagScope) -> FlagResult<Option<bool>>;

    /// Customer ids with a customer-level override of the given value for
    /// this feature. User-level rows are never included.
    async fn customer_overrides(
        &self,
        feature: &str,
        enabled: bool,
    ) -> FlagResult<BTreeSet<CustomerId>>;

    /// Feature names with an override of the given value keyed to this
    /// customer, whether customer-level or a user-level row pinned under it.
    async fn feature_overrides_for_customer(
        &self,
        customer_id: CustomerId,
        enabled: bool,
    ) -> FlagResult<BTreeSet<String>>;
}
