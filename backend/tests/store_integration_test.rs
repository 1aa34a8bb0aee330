//! PostgreSQL credential store tests

mod common;

use chrono::{Duration, Utc};
use common::{unique_email, TestApp};
use employee_portal_backend::repositories::{NewUser, StoreError, UpdateUser, UserStore};
use employee_portal_shared::Role;
use std::sync::Arc;

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Store Test".to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$placeholder".to_string(),
        role: Role::Employee,
        department: "Eng".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_unique_violation_maps_to_duplicate_email() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.store.create(new_user(&email)).await.unwrap();

    let err = app.store.create(new_user(&email)).await.unwrap_err();
    assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::DuplicateEmail));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_partial_update_keeps_other_fields() {
    let app = TestApp::new().await;
    let user = app.store.create(new_user(&unique_email())).await.unwrap();

    let updated = app
        .store
        .update(
            user.id,
            UpdateUser {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.department, "Eng");
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_expired_reset_is_not_consumed() {
    let app = TestApp::new().await;
    let user = app.store.create(new_user(&unique_email())).await.unwrap();
    let now = Utc::now();

    app.store
        .set_reset_token(user.id, "expired-hash", now - Duration::seconds(1))
        .await
        .unwrap();
    assert!(app
        .store
        .find_by_reset_token("expired-hash", now)
        .await
        .unwrap()
        .is_none());
    let result = app
        .store
        .consume_reset_token("expired-hash", now, "$2b$04$other")
        .await
        .unwrap();
    assert!(result.is_none());

    let unchanged = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(unchanged.password_hash, user.password_hash);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_reset_consumption_succeeds_once() {
    let app = TestApp::new().await;
    let user = app.store.create(new_user(&unique_email())).await.unwrap();
    let token_hash = format!("race-{}", user.id);
    let now = Utc::now();
    app.store
        .set_reset_token(user.id, &token_hash, now + Duration::hours(1))
        .await
        .unwrap();

    let store: Arc<dyn UserStore> = app.store.clone();
    let attempts = (0..8).map(|i| {
        let store = store.clone();
        let token_hash = token_hash.clone();
        tokio::spawn(async move {
            store
                .consume_reset_token(&token_hash, now, &format!("$2b$04$winner{}", i))
                .await
                .unwrap()
                .is_some()
        })
    });

    let mut successes = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        if attempt.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_list_search_and_delete() {
    let app = TestApp::new().await;
    let user = app.store.create(new_user(&unique_email())).await.unwrap();

    let found = app.store.list(Some(&user.email.to_uppercase())).await.unwrap();
    assert!(found.iter().any(|u| u.id == user.id));

    assert!(app.store.delete(user.id).await.unwrap());
    assert!(!app.store.delete(user.id).await.unwrap());
    assert!(app.store.find_by_id(user.id).await.unwrap().is_none());
}
