mod common;

use invsync_sync::SyncError;
use invsync_sync::provider::{
    FixtureNetworkDiscovery, FixtureTenantDirectory, LocationFixture, NetworkDiscovery, Page,
    TenantDirectory, fetch_all_pages,
};
use pretty_assertions::assert_eq;
use std::io::Write;

// ── fetch_all_pages ─────────────────────────────────────────────

#[tokio::test]
async fn drains_every_page_in_order() {
    let pages = vec![
        Page {
            items: vec![1, 2],
            next: Some("a".to_string()),
        },
        Page {
            items: vec![3],
            next: Some("b".to_string()),
        },
        Page::last(vec![4, 5]),
    ];
    let mut seen_cursors = Vec::new();
    let all = fetch_all_pages(|cursor| {
        let index = match cursor.as_deref() {
            None => 0,
            Some("a") => 1,
            Some(_) => 2,
        };
        seen_cursors.push(cursor);
        let page = pages[index].clone();
        async move { Ok(page) }
    })
    .await
    .unwrap();

    assert_eq!(all, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        seen_cursors,
        vec![None, Some("a".to_string()), Some("b".to_string())]
    );
}

#[tokio::test]
async fn repeated_cursor_is_an_error() {
    let result = fetch_all_pages(|_cursor| async {
        Ok(Page {
            items: vec![1],
            next: Some("same".to_string()),
        })
    })
    .await;
    assert!(matches!(result, Err(SyncError::Provider(_))));
}

#[tokio::test]
async fn cursor_cycle_is_an_error() {
    let mut calls = 0;
    let result = fetch_all_pages(|cursor| {
        calls += 1;
        let next = match cursor.as_deref() {
            Some("a") => "b",
            _ => "a",
        };
        async move {
            Ok(Page {
                items: vec![1],
                next: Some(next.to_string()),
            })
        }
    })
    .await;
    assert!(matches!(result, Err(SyncError::Provider(msg)) if msg.contains("cursor a")));
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn provider_error_aborts_paging() {
    let mut calls = 0;
    let result: Result<Vec<i32>, _> = fetch_all_pages(|cursor| {
        calls += 1;
        async move {
            match cursor {
                None => Ok(Page {
                    items: vec![1],
                    next: Some("1".to_string()),
                }),
                Some(_) => Err(SyncError::Provider("unreachable".to_string())),
            }
        }
    })
    .await;
    assert!(matches!(result, Err(SyncError::Provider(msg)) if msg == "unreachable"));
    assert_eq!(calls, 2);
}

// ── Fixture providers ───────────────────────────────────────────

#[tokio::test]
async fn fixture_directory_pages_buildings() {
    let directory = FixtureTenantDirectory::new(common::location_fixture(), 1);

    let first = directory.list_buildings(None).await.unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.next.as_deref(), Some("1"));

    let second = directory.list_buildings(first.next).await.unwrap();
    assert_eq!(second.items[0].building_name, "Old Depot");
    assert_eq!(second.next, None);
}

#[tokio::test]
async fn fixture_directory_filters_rooms_by_building() {
    let directory = FixtureTenantDirectory::new(common::location_fixture(), 10);
    let rooms = fetch_all_pages(|c| directory.list_rooms(1, c)).await.unwrap();
    let names: Vec<_> = rooms.iter().map(|r| r.room_name.as_str()).collect();
    assert_eq!(names, vec!["A-101", "A-102"]);
}

#[tokio::test]
async fn fixture_directory_rejects_garbage_cursor() {
    let directory = FixtureTenantDirectory::new(LocationFixture::default(), 10);
    let result = directory.list_buildings(Some("abc".to_string())).await;
    assert!(matches!(result, Err(SyncError::Provider(_))));
}

#[tokio::test]
async fn fixture_discovery_unknown_tenant_is_provider_error() {
    let discovery = FixtureNetworkDiscovery::new(common::network_fixture(), 10);
    let result = discovery.list_devices("nobody", None).await;
    assert!(matches!(result, Err(SyncError::Provider(_))));
}

#[tokio::test]
async fn fixture_discovery_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&common::network_fixture()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let discovery = FixtureNetworkDiscovery::from_path(file.path(), 3)
        .await
        .unwrap();
    let devices = fetch_all_pages(|c| discovery.list_devices(common::TENANT, c))
        .await
        .unwrap();
    assert_eq!(devices.len(), 4);
    assert_eq!(devices[0].name, "sw1");
}

#[tokio::test]
async fn fixture_accepts_sparse_json() {
    let json = r#"{
        "buildings": [{ "id": 7, "building_name": "Annex", "status": "Live Building" }],
        "rooms": [{ "id": 70, "room_name": "B-1", "building_id": 7 }]
    }"#;
    let fixture: LocationFixture = serde_json::from_str(json).unwrap();
    assert_eq!(fixture.buildings[0].longitude, None);
    assert!(fixture.rooms[0].active);
}
