//! Resolver semantics against the SQLite store, including durability across
//! a reopen.

use flagstone_core::{FlagError, FlagResolver};
use flagstone_sqlite::SqliteFlagStore;
use std::collections::BTreeSet;
use std::sync::Arc;

fn resolver(store: SqliteFlagStore) -> FlagResolver {
    FlagResolver::new(Arc::new(store))
}

#[tokio::test]
async fn layered_resolution_end_to_end() {
    let flags = resolver(SqliteFlagStore::open_in_memory().unwrap());

    flags.define_feature("auth", false).await.unwrap();
    assert!(!flags.resolve("auth", Some(1), None).await.unwrap());

    flags.set_global_default("auth", true).await.unwrap();
    assert!(flags.resolve("auth", Some(1), None).await.unwrap());

    flags.set_override("auth", Some(1), None, false).await.unwrap();
    assert!(!flags.resolve("auth", Some(1), None).await.unwrap());
    assert!(flags.resolve("auth", Some(2), None).await.unwrap());
}

#[tokio::test]
async fn user_removal_only_affects_that_user() {
    let flags = resolver(SqliteFlagStore::open_in_memory().unwrap());

    flags.define_feature("f", true).await.unwrap();
    flags
        .set_override("f", Some(1), Some(100), false)
        .await
        .unwrap();
    flags
        .set_override("f", Some(2), Some(200), false)
        .await
        .unwrap();
    assert!(!flags.resolve("f", Some(1), Some(100)).await.unwrap());

    flags.remove_user(100).await.unwrap();

    assert!(flags.resolve("f", Some(1), Some(100)).await.unwrap());
    assert!(!flags.resolve("f", Some(2), Some(200)).await.unwrap());
}

#[tokio::test]
async fn effective_customer_set_matches_memory_semantics() {
    let flags = resolver(SqliteFlagStore::open_in_memory().unwrap());

    for id in [1, 2, 3] {
        flags.add_customer(id).await.unwrap();
    }
    flags.define_feature("f", true).await.unwrap();
    flags.set_override("f", Some(2), None, false).await.unwrap();
    flags
        .set_override("f", Some(3), Some(100), false)
        .await
        .unwrap();

    assert_eq!(
        flags.list_customers_with_feature("f").await.unwrap(),
        BTreeSet::from([1, 3])
    );

    flags.set_global_default("f", false).await.unwrap();
    flags.set_override("f", Some(1), None, true).await.unwrap();
    assert_eq!(
        flags.list_customers_with_feature("f").await.unwrap(),
        BTreeSet::from([1])
    );
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.db");

    {
        let flags = resolver(SqliteFlagStore::open(&path).unwrap());
        flags.add_customer(1).await.unwrap();
        flags.define_feature("persisted", true).await.unwrap();
        flags
            .set_override("persisted", Some(1), None, false)
            .await
            .unwrap();
    }

    let flags = resolver(SqliteFlagStore::open(&path).unwrap());
    assert!(!flags.resolve("persisted", Some(1), None).await.unwrap());
    assert!(flags.resolve("persisted", Some(2), None).await.unwrap());
    assert_eq!(
        flags.list_all_customers().await.unwrap(),
        BTreeSet::from([1])
    );
}

#[tokio::test]
async fn rename_moves_everything_atomically() {
    let flags = resolver(SqliteFlagStore::open_in_memory().unwrap());

    flags.define_feature("a", true).await.unwrap();
    flags.set_override("a", Some(1), None, false).await.unwrap();
    flags
        .set_override("a", Some(1), Some(100), true)
        .await
        .unwrap();

    flags.rename_feature("a", "b").await.unwrap();

    let names = flags.list_all_features().await.unwrap();
    assert!(names.contains("b") && !names.contains("a"));
    assert!(!flags.resolve("b", Some(1), None).await.unwrap());
    assert!(flags.resolve("b", Some(1), Some(100)).await.unwrap());
    assert!(matches!(
        flags.resolve("a", None, None).await,
        Err(FlagError::NotFound(_))
    ));
}

#[tokio::test]
async fn describe_all_features_reports() {
    let flags = resolver(SqliteFlagStore::open_in_memory().unwrap());

    flags.define_feature("f", false).await.unwrap();
    flags.set_override("f", Some(1), None, true).await.unwrap();
    flags.set_override("f", Some(2), None, false).await.unwrap();

    let reports = flags.describe_all_features().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].feature_name, "f");
    assert!(!reports[0].global_enabled);
    assert_eq!(
        reports[0].explicitly_enabled_customers,
        BTreeSet::from([1])
    );
    assert_eq!(
        reports[0].explicitly_disabled_customers,
        BTreeSet::from([2])
    );
}
