//! Cascade deletion integration tests: guard attachment, dependent
//! draining, blocked dependents, and late arrivals, driven through the
//! real driver and store.

mod common;

use kiln_core::constants::{finalizers, reasons};
use kiln_core::models::{
    Build, Component, ConditionType, EnvVar, Kind, ObjectMeta, OwnerRef, Resource, ResourceKey,
    ResultGrant, RunnerIdentity, Workload, WorkloadSpec, WorkloadStatus,
};
use kiln_core::orchestration::Verdict;
use kiln_core::store::Store;

use common::{build_named, component_driver, component_named, counting_store};

const NS: &str = "team-a";

fn workload_named(namespace: &str, name: &str, component: &str) -> Workload {
    Workload {
        meta: ObjectMeta::named(namespace, name),
        spec: WorkloadSpec {
            owner: OwnerRef::new("shop", component),
            image: "registry.example.com/shop/app:v1".to_string(),
            replicas: 1,
            env: vec![EnvVar {
                name: "PORT".to_string(),
                value: "8080".to_string(),
            }],
        },
        status: WorkloadStatus::default(),
    }
}

/// Component with its cleanup guard attached, as reconcile leaves it.
async fn provisioned_component(store: &Store, name: &str) -> anyhow::Result<ResourceKey> {
    let driver = component_driver(store);
    let created = store.create(&component_named(NS, name, "shop")).await?;
    driver.reconcile(&created.key()).await?;
    Ok(created.key())
}

#[tokio::test]
async fn test_reconcile_attaches_guard_and_reports_ready() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);

    let created = store.create(&component_named(NS, "frontend", "shop")).await?;
    let verdict = driver.reconcile(&created.key()).await?;
    assert_eq!(verdict, Verdict::Done);

    let component: Component = store.get(&created.key()).await?;
    assert!(component.meta.has_finalizer(finalizers::COMPONENT_CLEANUP));
    let ready = component.status.conditions.get(ConditionType::Ready).unwrap();
    assert!(ready.status);
    assert_eq!(ready.reason, reasons::component::PROVISIONED);
    Ok(())
}

#[tokio::test]
async fn test_cascade_removes_every_dependent_kind() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);
    let key = provisioned_component(&store, "frontend").await?;

    store.create(&build_named(NS, "frontend-v1", "frontend")).await?;
    store.create(&build_named(NS, "frontend-v2", "frontend")).await?;
    store.create(&workload_named(NS, "frontend-v1", "frontend")).await?;
    store
        .create(&RunnerIdentity::for_owner(NS, OwnerRef::new("shop", "frontend")))
        .await?;
    store
        .create(&ResultGrant::for_runner(NS, OwnerRef::new("shop", "frontend")))
        .await?;

    store.delete(Kind::Component, &key).await?;

    // First pass surfaces the finalizing state, second pass drains.
    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::RetryNow);
    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);

    for kind in Component::DEPENDENT_KINDS {
        let remaining = store.list_owned(*kind, &key).await?;
        assert!(remaining.is_empty(), "{kind} dependents not drained");
    }
    assert!(store.get::<Component>(&key).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_cascade_waits_for_guarded_dependent() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);
    let key = provisioned_component(&store, "frontend").await?;

    // One dependent carries its own guard, held by some other controller.
    let mut held = build_named(NS, "frontend-v1", "frontend");
    held.meta.add_finalizer("ci.example.com/scan-hold");
    let held = store.create(&held).await?;
    store.create(&build_named(NS, "frontend-v2", "frontend")).await?;

    store.delete(Kind::Component, &key).await?;
    driver.reconcile(&key).await?;

    // The sweep removes the free dependent and marks the held one.
    let verdict = driver.reconcile(&key).await?;
    assert!(matches!(verdict, Verdict::RetryAfter(_)));

    let waiting: Component = store.get(&key).await?;
    assert!(waiting.meta.has_finalizer(finalizers::COMPONENT_CLEANUP));
    let finalizing = waiting.status.conditions.get(ConditionType::Finalizing).unwrap();
    assert_eq!(finalizing.reason, reasons::component::AWAITING_DEPENDENTS);
    assert!(finalizing.message.contains("build=1"));

    let marked: Build = store.get(&held.key()).await?;
    assert!(marked.meta.is_deleting());
    // The coordinator never touches a guard it does not own.
    assert!(marked.meta.has_finalizer("ci.example.com/scan-hold"));

    // Stalled passes are stable: nothing changes while the hold remains.
    let version_while_blocked = waiting.meta.resource_version;
    let verdict = driver.reconcile(&key).await?;
    assert!(matches!(verdict, Verdict::RetryAfter(_)));
    let still_waiting: Component = store.get(&key).await?;
    assert_eq!(still_waiting.meta.resource_version, version_while_blocked);

    // Releasing the hold lets the cascade finish.
    let mut released: Build = store.get(&held.key()).await?;
    released.meta.remove_finalizer("ci.example.com/scan-hold");
    store.update(&released).await?;

    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);
    assert!(store.get::<Component>(&key).await.unwrap_err().is_not_found());
    assert!(store.get::<Build>(&held.key()).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_sweep_issues_one_delete_per_dependent_per_pass() -> anyhow::Result<()> {
    let (store, deletes) = counting_store();
    let driver = component_driver(&store);
    let key = provisioned_component(&store, "frontend").await?;

    let mut held = build_named(NS, "frontend-v1", "frontend");
    held.meta.add_finalizer("ci.example.com/scan-hold");
    let held = store.create(&held).await?;
    let free = store.create(&workload_named(NS, "frontend-web", "frontend")).await?;

    store.delete(Kind::Component, &key).await?;
    deletes.clear();

    // The condition pass persists intent before any dependent is touched.
    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::RetryNow);
    assert_eq!(deletes.total(), 0);

    // First sweep: one delete per dependent, no more.
    let verdict = driver.reconcile(&key).await?;
    assert!(matches!(verdict, Verdict::RetryAfter(_)));
    assert_eq!(deletes.for_key(&held.key()), 1);
    assert_eq!(deletes.for_key(&free.key()), 1);
    assert_eq!(deletes.total(), 2);

    // Later sweeps re-request only what survives, once each.
    let verdict = driver.reconcile(&key).await?;
    assert!(matches!(verdict, Verdict::RetryAfter(_)));
    assert_eq!(deletes.for_key(&held.key()), 2);
    assert_eq!(deletes.for_key(&free.key()), 1);
    assert_eq!(deletes.total(), 3);

    // Once the hold is released nothing is left to request.
    let mut released: Build = store.get(&held.key()).await?;
    released.meta.remove_finalizer("ci.example.com/scan-hold");
    store.update(&released).await?;

    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(deletes.total(), 3);
    assert!(store.get::<Component>(&key).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_dependent_created_during_cascade_is_still_drained() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);
    let key = provisioned_component(&store, "frontend").await?;

    let mut held = build_named(NS, "frontend-v1", "frontend");
    held.meta.add_finalizer("ci.example.com/scan-hold");
    let held = store.create(&held).await?;

    store.delete(Kind::Component, &key).await?;
    driver.reconcile(&key).await?;
    driver.reconcile(&key).await?;

    // A dependent lands while the cascade is already in progress.
    store.create(&build_named(NS, "frontend-v9", "frontend")).await?;

    let mut released: Build = store.get(&held.key()).await?;
    released.meta.remove_finalizer("ci.example.com/scan-hold");
    store.update(&released).await?;

    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);
    assert!(store
        .get::<Build>(&ResourceKey::new(NS, "frontend-v9"))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store.get::<Component>(&key).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_unprovisioned_component_deletes_immediately() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);

    // Never reconciled, so no guard was ever attached.
    let created = store.create(&component_named(NS, "ghost", "shop")).await?;
    store.delete(Kind::Component, &created.key()).await?;

    assert!(store
        .get::<Component>(&created.key())
        .await
        .unwrap_err()
        .is_not_found());
    let verdict = driver.reconcile(&created.key()).await?;
    assert_eq!(verdict, Verdict::Done);
    Ok(())
}

#[tokio::test]
async fn test_foreign_guard_outlives_the_cascade() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);
    let key = provisioned_component(&store, "frontend").await?;

    // Another controller holds its own guard on the component itself.
    let mut component: Component = store.get(&key).await?;
    component.meta.add_finalizer("backup.example.com/snapshot");
    store.update(&component).await?;

    store.delete(Kind::Component, &key).await?;
    driver.reconcile(&key).await?;
    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);

    // Our guard is gone, the foreign one keeps the object pinned.
    let pinned: Component = store.get(&key).await?;
    assert!(pinned.meta.is_deleting());
    assert!(!pinned.meta.has_finalizer(finalizers::COMPONENT_CLEANUP));
    assert!(pinned.meta.has_finalizer("backup.example.com/snapshot"));

    // Further passes have nothing left to manage.
    let verdict = driver.reconcile(&key).await?;
    assert_eq!(verdict, Verdict::Done);

    let mut released: Component = store.get(&key).await?;
    released.meta.remove_finalizer("backup.example.com/snapshot");
    store.update(&released).await?;
    assert!(store.get::<Component>(&key).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_cascade_scopes_to_the_owning_component() -> anyhow::Result<()> {
    let store = Store::in_memory();
    let driver = component_driver(&store);
    let frontend = provisioned_component(&store, "frontend").await?;
    provisioned_component(&store, "backend").await?;

    store.create(&build_named(NS, "frontend-v1", "frontend")).await?;
    store.create(&build_named(NS, "backend-v1", "backend")).await?;

    store.delete(Kind::Component, &frontend).await?;
    driver.reconcile(&frontend).await?;
    driver.reconcile(&frontend).await?;

    // The sibling component and its dependents are untouched.
    store.get::<Component>(&ResourceKey::new(NS, "backend")).await?;
    store.get::<Build>(&ResourceKey::new(NS, "backend-v1")).await?;
    assert!(store
        .get::<Build>(&ResourceKey::new(NS, "frontend-v1"))
        .await
        .unwrap_err()
        .is_not_found());
    Ok(())
}
