//! Core Data Model
//!
//! The three relations behind every flag decision: customers, features
//! (name plus global default), and scoped overrides.

use crate::error::{FlagError, FlagResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Customer identifier.
pub type CustomerId = i64;

/// User identifier.
pub type UserId = i64;

/// Override scope as a structural key.
///
/// Uniqueness of an override is `(feature_name, FlagScope)`. A user-level
/// scope keeps its (optional) customer id as part of the key, so
/// `(f, customer 1, user 100)` and `(f, no customer, user 100)` are distinct
/// rows. Scope never encodes global state; that lives on the feature itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FlagScope {
    /// Applies to every user of one customer.
    Customer { customer_id: CustomerId },
    /// Applies to a single user, optionally pinned under a customer.
    User {
        customer_id: Option<CustomerId>,
        user_id: UserId,
    },
}

impl FlagScope {
    /// Build a scope from optional customer/user ids.
    ///
    /// Fails with [`FlagError::InvalidScope`] when both ids are absent.
    pub fn from_parts(
        customer_id: Option<CustomerId>,
        user_id: Option<UserId>,
    ) -> FlagResult<Self> {
        match (customer_id, user_id) {
            (_, Some(user_id)) => Ok(Self::User {
                customer_id,
                user_id,
            }),
            (Some(customer_id), None) => Ok(Self::Customer { customer_id }),
            (None, None) => Err(FlagError::InvalidScope),
        }
    }

    /// Customer id component, if any.
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Customer { customer_id } => Some(*customer_id),
            Self::User { customer_id, .. } => *customer_id,
        }
    }

    /// User id component, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Customer { .. } => None,
            Self::User { user_id, .. } => Some(*user_id),
        }
    }
}

impl std::fmt::Display for FlagScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer { customer_id } => write!(f, "customer {}", customer_id),
            Self::User {
                customer_id: Some(customer_id),
                user_id,
            } => write!(f, "user {} (customer {})", user_id, customer_id),
            Self::User {
                customer_id: None,
                user_id,
            } => write!(f, "user {}", user_id),
        }
    }
}

/// Denormalized per-feature report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureReport {
    /// Feature name
    pub feature_name: String,
    /// Global default
    pub global_enabled: bool,
    /// Customers with an explicit customer-level enable
    pub explicitly_enabled_customers: BTreeSet<CustomerId>,
    /// Customers with an explicit customer-level disable
    pub explicitly_disabled_customers: BTreeSet<CustomerId>,
}
