use invsync_store::{ScopeStore, Tenant, TenantLink};
use pretty_assertions::assert_eq;

// ── Tenants ─────────────────────────────────────────────────────

#[test]
fn upsert_and_list_tenants() {
    let store = ScopeStore::open_in_memory().unwrap();
    store.upsert_tenant("t-2", "Beta").unwrap();
    store.upsert_tenant("t-1", "Alpha").unwrap();
    store.upsert_tenant("t-1", "Alpha Corp").unwrap();

    assert_eq!(
        store.list_tenants().unwrap(),
        vec![
            Tenant {
                tenant_id: "t-1".into(),
                name: "Alpha Corp".into()
            },
            Tenant {
                tenant_id: "t-2".into(),
                name: "Beta".into()
            },
        ]
    );
}

// ── Links ───────────────────────────────────────────────────────

#[test]
fn link_and_resolve_building() {
    let store = ScopeStore::open_in_memory().unwrap();
    store.upsert_tenant("t-1", "Alpha").unwrap();
    assert_eq!(store.building_for_tenant("t-1").unwrap(), None);

    store.link_building("t-1", "Tower A").unwrap();
    assert_eq!(
        store.building_for_tenant("t-1").unwrap().as_deref(),
        Some("Tower A")
    );

    store.link_building("t-1", "Tower B").unwrap();
    assert_eq!(
        store.building_for_tenant("t-1").unwrap().as_deref(),
        Some("Tower B")
    );
}

#[test]
fn link_requires_known_tenant() {
    let store = ScopeStore::open_in_memory().unwrap();
    assert!(store.link_building("ghost", "Tower A").is_err());
}

#[test]
fn unlink_reports_whether_removed() {
    let store = ScopeStore::open_in_memory().unwrap();
    store.upsert_tenant("t-1", "Alpha").unwrap();
    store.link_building("t-1", "Tower A").unwrap();
    assert!(store.unlink("t-1").unwrap());
    assert!(!store.unlink("t-1").unwrap());
    assert_eq!(store.building_for_tenant("t-1").unwrap(), None);
}

#[test]
fn list_links_joins_tenant_names() {
    let store = ScopeStore::open_in_memory().unwrap();
    store.upsert_tenant("t-1", "Alpha").unwrap();
    store.upsert_tenant("t-2", "Beta").unwrap();
    store.link_building("t-1", "Tower A").unwrap();

    assert_eq!(
        store.list_links().unwrap(),
        vec![TenantLink {
            tenant_id: "t-1".into(),
            tenant_name: "Alpha".into(),
            building_name: "Tower A".into(),
        }]
    );
}

// ── Persistence ─────────────────────────────────────────────────

#[test]
fn survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scope.db");
    {
        let store = ScopeStore::open(&path).unwrap();
        store.upsert_tenant("t-1", "Alpha").unwrap();
        store.link_building("t-1", "Tower A").unwrap();
    }
    let store = ScopeStore::open(&path).unwrap();
    assert_eq!(
        store.building_for_tenant("t-1").unwrap().as_deref(),
        Some("Tower A")
    );
}
