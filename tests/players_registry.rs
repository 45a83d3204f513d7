// End-to-end behaviour of the players registry against an in-process sheet:
// dedup on read, idempotent add, delete-all-matching, and concurrent adds.

use std::sync::Arc;
use std::time::Duration;

use catch_roulette::players::{PlayersRegistry, StoreId, WriteLocks, WriteSerializer};
use catch_roulette::sheets::{MemorySheet, SheetsGateway};
use futures::future::join_all;

fn registry_over(sheet: &Arc<MemorySheet>) -> PlayersRegistry {
    PlayersRegistry::new(sheet.clone(), WriteSerializer::new(), Duration::from_secs(5))
}

#[tokio::test]
async fn walkthrough_of_a_session() {
    let sheet = Arc::new(MemorySheet::new(["name", "Alice", "Bob", "alice"]));
    let reg = registry_over(&sheet);

    assert_eq!(reg.list_all().await.unwrap(), vec!["Alice", "Bob"]);

    let added = reg.add("Carol").await.unwrap();
    assert!(added.added);
    assert_eq!(added.players, vec!["Alice", "Bob", "Carol"]);

    let again = reg.add("bob ").await.unwrap();
    assert!(!again.added);
    assert_eq!(again.players, vec!["Alice", "Bob", "Carol"]);

    // "alice" appears twice in the sheet but once in the list
    let deleted = reg.delete_all_matching("ALICE").await.unwrap();
    assert_eq!(deleted.deleted_count, 2);
    assert_eq!(deleted.players, vec!["Bob", "Carol"]);
    assert_eq!(sheet.rows(), vec!["name", "Bob", "Carol"]);
}

#[tokio::test]
async fn dedup_keeps_first_seen_casing() {
    let sheet = Arc::new(MemorySheet::new(["name", "Cole", "cole ", "Amari"]));
    assert_eq!(registry_over(&sheet).list_all().await.unwrap(), vec!["Cole", "Amari"]);
}

#[tokio::test]
async fn adding_twice_stores_one_row() {
    let sheet = Arc::new(MemorySheet::new(["name"]));
    let reg = registry_over(&sheet);

    assert!(reg.add("Jaxon Smith-Njigba").await.unwrap().added);
    assert!(!reg.add("jaxon  smith-njigba").await.unwrap().added);
    assert_eq!(sheet.rows(), vec!["name", "Jaxon Smith-Njigba"]);
}

#[tokio::test]
async fn delete_removes_scattered_matches_only() {
    let sheet = Arc::new(MemorySheet::new(["name", "Cole", "Amari", "", "cole", "Nico", " COLE"]));
    let reg = registry_over(&sheet);

    let outcome = reg.delete_all_matching("Cole").await.unwrap();
    assert_eq!(outcome.deleted_count, 3);
    assert_eq!(outcome.players, vec!["Amari", "Nico"]);
    assert_eq!(sheet.rows(), vec!["name", "Amari", "", "Nico"]);
}

#[tokio::test]
async fn deleting_an_absent_name_changes_nothing() {
    let sheet = Arc::new(MemorySheet::new(["name", "Cole", "Amari"]));
    let reg = registry_over(&sheet);
    let before = reg.list_all().await.unwrap();

    let outcome = reg.delete_all_matching("Nobody").await.unwrap();
    assert_eq!(outcome.deleted_count, 0);
    assert_eq!(reg.list_all().await.unwrap(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_one_name_append_once() {
    let sheet = Arc::new(MemorySheet::new(["name"]).with_latency(Duration::from_millis(2)));
    let reg = Arc::new(registry_over(&sheet));

    let results = join_all((0..16).map(|_| {
        let reg = reg.clone();
        tokio::spawn(async move { reg.add("Same Name").await })
    }))
    .await;

    let added = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(|outcome| outcome.added)
        .count();
    assert_eq!(added, 1);
    assert_eq!(sheet.append_calls(), 1);
    assert_eq!(reg.list_all().await.unwrap(), vec!["Same Name"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registries_sharing_a_store_share_its_lock() {
    let store = StoreId::new("roster-sheet", "Receivers");
    let sheet = Arc::new(
        MemorySheet::new(["name"])
            .with_store(store.clone())
            .with_latency(Duration::from_millis(2)),
    );
    let locks = WriteLocks::new();
    let registry_for = |sheet: &Arc<MemorySheet>| {
        let id = sheet.store_id().clone();
        Arc::new(PlayersRegistry::new(sheet.clone(), locks.for_store(&id), Duration::from_secs(5)))
    };
    let a = registry_for(&sheet);
    let b = registry_for(&sheet);
    assert_eq!(sheet.store_id(), &store);

    let tasks = (0..8).map(|i| {
        let reg = if i % 2 == 0 { a.clone() } else { b.clone() };
        tokio::spawn(async move { reg.add("Tee Higgins").await })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }
    assert_eq!(sheet.rows(), vec!["name", "Tee Higgins"]);
}

#[tokio::test]
async fn interleaved_add_and_delete_stay_consistent() {
    let sheet = Arc::new(MemorySheet::new(["name", "Cole"]).with_latency(Duration::from_millis(1)));
    let reg = Arc::new(registry_over(&sheet));

    let add = {
        let reg = reg.clone();
        tokio::spawn(async move { reg.add("Amari").await })
    };
    let delete = {
        let reg = reg.clone();
        tokio::spawn(async move { reg.delete_all_matching("Cole").await })
    };
    add.await.unwrap().unwrap();
    assert_eq!(delete.await.unwrap().unwrap().deleted_count, 1);
    assert_eq!(reg.list_all().await.unwrap(), vec!["Amari"]);
}
