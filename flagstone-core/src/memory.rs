//! In-memory flag store for testing and embedded use.

use crate::error::{FlagError, FlagResult};
use crate::model::{CustomerId, FlagScope, UserId};
use crate::store::FlagStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// The three relations behind a single lock, so every cascade and rename is
/// observed fully applied or not at all.
#[derive(Debug, Default)]
struct Relations {
    customers: BTreeSet<CustomerId>,
    features: BTreeMap<String, bool>,
    overrides: BTreeMap<(String, FlagScope), bool>,
}

/// In-memory flag store
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    relations: parking_lot::RwLock<Relations>,
}

impl InMemoryFlagStore {
    /// Create new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn insert_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        self.relations.write().customers.insert(customer_id);
        Ok(())
    }

    async fn delete_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        let mut relations = self.relations.write();
        relations
            .overrides
            .retain(|(_, scope), _| scope.customer_id() != Some(customer_id));
        relations.customers.remove(&customer_id);
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> FlagResult<()> {
        self.relations
            .write()
            .overrides
            .retain(|(_, scope), _| scope.user_id() != Some(user_id));
        Ok(())
    }

    async fn customers(&self) -> FlagResult<BTreeSet<CustomerId>> {
        Ok(self.relations.read().customers.clone())
    }

    async fn upsert_feature(&self, name: &str, enabled: bool) -> FlagResult<()> {
        self.relations
            .write()
            .features
            .insert(name.to_string(), enabled);
        Ok(())
    }

    async fn feature_default(&self, name: &str) -> FlagResult<Option<bool>> {
        Ok(self.relations.read().features.get(name).copied())
    }

    async fn delete_feature(&self, name: &str) -> FlagResult<()> {
        let mut relations = self.relations.write();
        relations.overrides.retain(|key, _| key.0 != name);
        relations.features.remove(name);
        Ok(())
    }

    async fn rename_feature(&self, old: &str, new: &str) -> FlagResult<()> {
        let mut relations = self.relations.write();
        let Some(default) = relations.features.get(old).copied() else {
            return Err(FlagError::NotFound(old.to_string()));
        };
        if relations.features.contains_key(new) {
            return Err(FlagError::Conflict(new.to_string()));
        }
        relations.features.remove(old);
        relations.features.insert(new.to_string(), default);

        let moved: Vec<(FlagScope, bool)> = relations
            .overrides
            .iter()
            .filter(|(key, _)| key.0 == old)
            .map(|(key, enabled)| (key.1, *enabled))
            .collect();
        relations.overrides.retain(|key, _| key.0 != old);
        for (scope, enabled) in moved {
            relations.overrides.insert((new.to_string(), scope), enabled);
        }
        Ok(())
    }

    async fn features(&self) -> FlagResult<BTreeMap<String, bool>> {
        Ok(self.relations.read().features.clone())
    }

    async fn upsert_override(
        &self,
        feature: &str,
        scope: &FlagScope,
        enabled: bool,
    ) -> FlagResult<()> {
        self.relations
            .write()
            .overrides
            .insert((feature.to_string(), *scope), enabled);
        Ok(())
    }

    async fn delete_override(&self, feature: &str, scope: &FlagScope) -> FlagResult<()> {
        self.relations
            .write()
            .overrides
            .remove(&(feature.to_string(), *scope));
        Ok(())
    }

    async fn override_value(&self, feature: &str, scope: &FlagScope) -> FlagResult<Option<bool>> {
        Ok(self
            .relations
            .read()
            .overrides
            .get(&(feature.to_string(), *scope))
            .copied())
    }

    async fn customer_overrides(
        &self,
        feature: &str,
        enabled: bool,
    ) -> FlagResult<BTreeSet<CustomerId>> {
        Ok(self
            .relations
            .read()
            .overrides
            .iter()
            .filter_map(|((name, scope), value)| match scope {
                FlagScope::Customer { customer_id }
                    if name.as_str() == feature && *value == enabled =>
                {
                    Some(*customer_id)
                }
                _ => None,
            })
            .collect())
    }

    async fn feature_overrides_for_customer(
        &self,
        customer_id: CustomerId,
        enabled: bool,
    ) -> FlagResult<BTreeSet<String>> {
        Ok(self
            .relations
            .read()
            .overrides
            .iter()
            .filter_map(|((name, scope), value)| {
                (scope.customer_id() == Some(customer_id) && *value == enabled)
                    .then(|| name.clone())
            })
            .collect())
    }
}
