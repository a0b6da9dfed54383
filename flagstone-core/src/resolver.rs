//! Flag Resolver
//!
//! Decision and set-membership queries over the three relations. The store
//! is the durable substrate; everything here is set algebra.
//!
//! # Resolution order
//!
//! Most specific wins: user-level override, then customer-level override,
//! then the feature's global default.

use crate::error::{FlagError, FlagResult};
use crate::model::{CustomerId, FeatureReport, FlagScope, UserId};
use crate::store::FlagStore;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Flag resolver
///
/// High-level API over an injected [`FlagStore`].
pub struct FlagResolver {
    store: Arc<dyn FlagStore>,
}

impl FlagResolver {
    /// Create a resolver over a store
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self { store }
    }

    /// Register a customer. Idempotent.
    pub async fn add_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        self.store.insert_customer(customer_id).await
    }

    /// Remove a customer and every override keyed to it. Idempotent.
    pub async fn remove_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        debug!("removing customer {}", customer_id);
        self.store.delete_customer(customer_id).await
    }

    /// Remove every override keyed to this user id, under any customer.
    /// Idempotent.
    pub async fn remove_user(&self, user_id: UserId) -> FlagResult<()> {
        debug!("removing user {}", user_id);
        self.store.delete_user(user_id).await
    }

    /// Define a feature with its global default. Redefining replaces the
    /// default and keeps existing overrides.
    pub async fn define_feature(&self, name: &str, default_enabled: bool) -> FlagResult<()> {
        debug!("defining feature {} (default {})", name, default_enabled);
        self.store.upsert_feature(name, default_enabled).await
    }

    /// Set a feature's global default. Upserts when the feature was never
    /// defined, matching `define_feature`.
    pub async fn set_global_default(&self, name: &str, enabled: bool) -> FlagResult<()> {
        debug!("setting global default {} = {}", name, enabled);
        self.store.upsert_feature(name, enabled).await
    }

    /// Remove a feature, its default, and all its overrides. Idempotent.
    pub async fn remove_feature(&self, name: &str) -> FlagResult<()> {
        debug!("removing feature {}", name);
        self.store.delete_feature(name).await
    }

    /// Rename a feature, moving its default and every override atomically.
    ///
    /// Fails with [`FlagError::NotFound`] when `old` is undefined, and with
    /// [`FlagError::Conflict`] when `new` is already defined.
    pub async fn rename_feature(&self, old: &str, new: &str) -> FlagResult<()> {
        debug!("renaming feature {} -> {}", old, new);
        self.store.rename_feature(old, new).await
    }

    /// Upsert an override for a customer or user scope.
    ///
    /// Fails with [`FlagError::InvalidScope`] when both ids are absent.
    pub async fn set_override(
        &self,
        feature: &str,
        customer_id: Option<CustomerId>,
        user_id: Option<UserId>,
        enabled: bool,
    ) -> FlagResult<()> {
        let scope = FlagScope::from_parts(customer_id, user_id)?;
        debug!("setting override {} [{}] = {}", feature, scope, enabled);
        self.store.upsert_override(feature, &scope, enabled).await
    }

    /// Remove the single override for this key. Idempotent.
    pub async fn remove_override(
        &self,
        feature: &str,
        customer_id: Option<CustomerId>,
        user_id: Option<UserId>,
    ) -> FlagResult<()> {
        let scope = FlagScope::from_parts(customer_id, user_id)?;
        debug!("removing override {} [{}]", feature, scope);
        self.store.delete_override(feature, &scope).await
    }

    /// Resolve one flag decision, most specific scope first.
    ///
    /// Fails with [`FlagError::NotFound`] when no override matches and the
    /// feature was never defined.
    pub async fn resolve(
        &self,
        feature: &str,
        customer_id: Option<CustomerId>,
        user_id: Option<UserId>,
    ) -> FlagResult<bool> {
        if let Some(user_id) = user_id {
            let scope = FlagScope::User {
                customer_id,
                user_id,
            };
            if let Some(enabled) = self.store.override_value(feature, &scope).await? {
                return Ok(enabled);
            }
        }
        if let Some(customer_id) = customer_id {
            let scope = FlagScope::Customer { customer_id };
            if let Some(enabled) = self.store.override_value(feature, &scope).await? {
                return Ok(enabled);
            }
        }
        self.store
            .feature_default(feature)
            .await?
            .ok_or_else(|| FlagError::NotFound(feature.to_string()))
    }

    /// The effective customer population for a feature.
    ///
    /// Default-enabled: every registered customer minus explicit
    /// customer-level disables. Default-disabled (or undefined): only
    /// customers with an explicit customer-level enable. User-level
    /// overrides never change this customer-granularity set.
    pub async fn list_customers_with_feature(
        &self,
        feature: &str,
    ) -> FlagResult<BTreeSet<CustomerId>> {
        if self
            .store
            .feature_default(feature)
            .await?
            .unwrap_or(false)
        {
            let all = self.store.customers().await?;
            let disabled = self.store.customer_overrides(feature, false).await?;
            Ok(all.difference(&disabled).copied().collect())
        } else {
            self.store.customer_overrides(feature, true).await
        }
    }

    /// Customers with an explicit customer-level enable, ignoring the
    /// global default.
    pub async fn list_customers_with_feature_explicitly_enabled(
        &self,
        feature: &str,
    ) -> FlagResult<BTreeSet<CustomerId>> {
        self.store.customer_overrides(feature, true).await
    }

    /// Customers with an explicit customer-level disable, ignoring the
    /// global default.
    pub async fn list_customers_with_feature_explicitly_disabled(
        &self,
        feature: &str,
    ) -> FlagResult<BTreeSet<CustomerId>> {
        self.store.customer_overrides(feature, false).await
    }

    /// Features visible to a customer:
    /// `(globally enabled ∪ customer enables) − customer disables`.
    /// A disable always wins over an enable. Overrides keyed to the customer
    /// count at either level, including user-level rows pinned under it.
    pub async fn list_features_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> FlagResult<BTreeSet<String>> {
        let globally_enabled: BTreeSet<String> = self
            .store
            .features()
            .await?
            .into_iter()
            .filter_map(|(name, enabled)| enabled.then_some(name))
            .collect();
        let enabled = self
            .store
            .feature_overrides_for_customer(customer_id, true)
            .await?;
        let disabled = self
            .store
            .feature_overrides_for_customer(customer_id, false)
            .await?;
        Ok(globally_enabled
            .union(&enabled)
            .filter(|name| !disabled.contains(*name))
            .cloned()
            .collect())
    }

    /// All defined feature names.
    pub async fn list_all_features(&self) -> FlagResult<BTreeSet<String>> {
        Ok(self.store.features().await?.into_keys().collect())
    }

    /// All registered customer ids.
    pub async fn list_all_customers(&self) -> FlagResult<BTreeSet<CustomerId>> {
        self.store.customers().await
    }

    /// Denormalized report for every feature.
    pub async fn describe_all_features(&self) -> FlagResult<Vec<FeatureReport>> {
        let mut reports = Vec::new();
        for (feature_name, global_enabled) in self.store.features().await? {
            let explicitly_enabled_customers =
                self.store.customer_overrides(&feature_name, true).await?;
            let explicitly_disabled_customers =
                self.store.customer_overrides(&feature_name, false).await?;
            reports.push(FeatureReport {
                feature_name,
                global_enabled,
                explicitly_enabled_customers,
                explicitly_disabled_customers,
            });
        }
        Ok(reports)
    }
}
