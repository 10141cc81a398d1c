//! Collection membership and reference-count properties.

mod common;

use common::*;

use cardex::collection::Collection;
use cardex::{GraphLayout, MemoryStore};

async fn new_collection(store: &MemoryStore, layout: &GraphLayout, name: &str) -> Collection {
    Collection::create(store, layout, name.to_string(), None, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn adding_records_to_empty_collection_sets_count_to_one() {
    let store = MemoryStore::new();
    let layout = layout();
    let collection = new_collection(&store, &layout, "empty at first").await;

    let records = vec![record_uri("r1"), record_uri("r2"), record_uri("r3")];
    for r in &records {
        save_record(&store, &layout, r).await;
    }
    collection
        .add_records(&store, &layout, &records)
        .await
        .unwrap();

    let members = sorted(collection.records(&store, &layout).await.unwrap());
    assert_eq!(members, sorted(records.clone()));

    for r in &records {
        assert_eq!(count_of(&store, &layout, r).await, 1);
    }
}

#[tokio::test]
async fn add_is_idempotent() {
    let store = MemoryStore::new();
    let layout = layout();
    let collection = new_collection(&store, &layout, "idempotent").await;
    let r = record_uri("r1");

    collection
        .add_records(&store, &layout, &[r.clone()])
        .await
        .unwrap();
    collection
        .add_records(&store, &layout, &[r.clone()])
        .await
        .unwrap();

    assert_eq!(collection.records(&store, &layout).await.unwrap().len(), 1);
    assert_eq!(count_of(&store, &layout, &r).await, 1);
}

#[tokio::test]
async fn remove_is_the_inverse_of_add() {
    let store = MemoryStore::new();
    let layout = layout();
    let collection = new_collection(&store, &layout, "inverse").await;
    let r = record_uri("r1");

    collection
        .add_records(&store, &layout, &[r.clone()])
        .await
        .unwrap();
    assert_eq!(count_of(&store, &layout, &r).await, 1);

    collection
        .remove_records(&store, &layout, &[r.clone()])
        .await
        .unwrap();
    assert!(collection.records(&store, &layout).await.unwrap().is_empty());
    assert_eq!(count_of(&store, &layout, &r).await, 0);

    // Removing a non-member never drives the count below zero.
    collection
        .remove_records(&store, &layout, &[r.clone()])
        .await
        .unwrap();
    assert_eq!(count_of(&store, &layout, &r).await, 0);
}

#[tokio::test]
async fn set_yields_exactly_the_target_membership_with_count_deltas() {
    let store = MemoryStore::new();
    let layout = layout();
    let collection = new_collection(&store, &layout, "replace").await;

    let r1 = record_uri("r1");
    let r2 = record_uri("r2");
    let r3 = record_uri("r3");

    collection
        .add_records(&store, &layout, &[r1.clone(), r2.clone()])
        .await
        .unwrap();

    collection
        .set_records(&store, &layout, &[r2.clone(), r3.clone()])
        .await
        .unwrap();

    let members = sorted(collection.records(&store, &layout).await.unwrap());
    assert_eq!(members, sorted(vec![r2.clone(), r3.clone()]));

    assert_eq!(count_of(&store, &layout, &r1).await, 0);
    assert_eq!(count_of(&store, &layout, &r2).await, 1);
    assert_eq!(count_of(&store, &layout, &r3).await, 1);
}

#[tokio::test]
async fn set_on_empty_target_clears_membership() {
    let store = MemoryStore::new();
    let layout = layout();
    let collection = new_collection(&store, &layout, "to empty").await;
    let r1 = record_uri("r1");

    collection
        .add_records(&store, &layout, &[r1.clone()])
        .await
        .unwrap();
    collection.set_records(&store, &layout, &[]).await.unwrap();

    assert!(collection.records(&store, &layout).await.unwrap().is_empty());
    assert_eq!(count_of(&store, &layout, &r1).await, 0);
}

#[tokio::test]
async fn clear_decrements_each_member_exactly_once() {
    let store = MemoryStore::new();
    let layout = layout();
    let one = new_collection(&store, &layout, "one").await;
    let two = new_collection(&store, &layout, "two").await;

    let r1 = record_uri("r1");
    let r2 = record_uri("r2");
    one.add_records(&store, &layout, &[r1.clone(), r2.clone()])
        .await
        .unwrap();
    two.add_records(&store, &layout, &[r1.clone()])
        .await
        .unwrap();

    one.clear_records(&store, &layout).await.unwrap();

    assert!(one.records(&store, &layout).await.unwrap().is_empty());
    assert_eq!(count_of(&store, &layout, &r1).await, 1);
    assert_eq!(count_of(&store, &layout, &r2).await, 0);
    assert_eq!(two.records(&store, &layout).await.unwrap().len(), 1);
}

#[tokio::test]
async fn counts_track_membership_across_collections() {
    let store = MemoryStore::new();
    let layout = layout();
    let a = new_collection(&store, &layout, "a").await;
    let b = new_collection(&store, &layout, "b").await;
    let r1 = record_uri("r1");
    save_record(&store, &layout, &r1).await;

    a.add_records(&store, &layout, &[r1.clone()]).await.unwrap();
    b.add_records(&store, &layout, &[r1.clone()]).await.unwrap();
    assert_eq!(count_of(&store, &layout, &r1).await, 2);

    a.remove_records(&store, &layout, &[r1.clone()])
        .await
        .unwrap();
    assert_eq!(count_of(&store, &layout, &r1).await, 1);

    b.remove_records(&store, &layout, &[r1.clone()])
        .await
        .unwrap();
    assert_eq!(count_of(&store, &layout, &r1).await, 0);
    assert!(has_count_entry(&store, &layout, &r1).await);
}
