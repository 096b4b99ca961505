//! Behaviour every `RefreshTokenStore` adapter must share. Each adapter's
//! test file hands a fresh store to these.

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Utc};
use countersign::domain_model::*;
use countersign::domain_port::*;
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

// Unique per call so adapters backed by a shared server never collide.
pub fn token(label: &str) -> String {
    format!("{label}.{}", Uuid::new_v4())
}

fn in_a_day() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

async fn status(store: &dyn RefreshTokenStore, token: &str) -> Option<TokenStatus> {
    store
        .find_by_token(token)
        .await
        .unwrap()
        .map(|r| r.status_at(Utc::now()))
}

pub async fn rotate_is_single_use(store: Arc<dyn RefreshTokenStore>) {
    let user = UserId::new();
    let (t0, t1, t2) = (token("t0"), token("t1"), token("t2"));
    store.create(user, &t0, in_a_day()).await.unwrap();

    store.rotate(&t0, user, &t1, in_a_day()).await.unwrap();
    assert_matches!(
        store.rotate(&t0, user, &t2, in_a_day()).await,
        Err(RefreshTokenStoreError::Revoked)
    );

    assert_eq!(status(store.as_ref(), &t0).await, Some(TokenStatus::Revoked));
    assert_eq!(status(store.as_ref(), &t1).await, Some(TokenStatus::Active));
    assert_eq!(status(store.as_ref(), &t2).await, None);
}

pub async fn concurrent_rotate_has_one_winner(store: Arc<dyn RefreshTokenStore>) {
    let user = UserId::new();
    let t0 = token("t0");
    store.create(user, &t0, in_a_day()).await.unwrap();

    let successors: Vec<String> = (0..8).map(|i| token(&format!("next{i}"))).collect();
    let attempts = successors.iter().cloned().map(|next| {
        let store = store.clone();
        let t0 = t0.clone();
        tokio::spawn(async move { store.rotate(&t0, user, &next, in_a_day()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for r in &results {
        if let Err(e) = r {
            assert_matches!(e, RefreshTokenStoreError::Revoked);
        }
    }

    let mut live = 0;
    for (next, result) in successors.iter().zip(&results) {
        match result {
            Ok(()) => {
                assert_eq!(status(store.as_ref(), next).await, Some(TokenStatus::Active));
                live += 1;
            }
            Err(_) => assert_eq!(status(store.as_ref(), next).await, None),
        }
    }
    assert_eq!(live, 1);
}

pub async fn foreign_owner_cannot_rotate(store: Arc<dyn RefreshTokenStore>) {
    let (owner, intruder) = (UserId::new(), UserId::new());
    let (t0, t1) = (token("t0"), token("t1"));
    store.create(owner, &t0, in_a_day()).await.unwrap();

    assert_matches!(
        store.rotate(&t0, intruder, &t1, in_a_day()).await,
        Err(RefreshTokenStoreError::NotFound)
    );
    assert_eq!(status(store.as_ref(), &t0).await, Some(TokenStatus::Active));
    assert_eq!(status(store.as_ref(), &t1).await, None);
}

pub async fn duplicate_successor_leaves_old_record_active(store: Arc<dyn RefreshTokenStore>) {
    let user = UserId::new();
    let (t0, taken) = (token("t0"), token("taken"));
    store.create(user, &t0, in_a_day()).await.unwrap();
    store.create(user, &taken, in_a_day()).await.unwrap();

    assert_matches!(
        store.create(user, &taken, in_a_day()).await,
        Err(RefreshTokenStoreError::Conflict)
    );
    assert_matches!(
        store.rotate(&t0, user, &taken, in_a_day()).await,
        Err(RefreshTokenStoreError::Conflict)
    );
    assert_eq!(status(store.as_ref(), &t0).await, Some(TokenStatus::Active));
}

pub async fn expired_record_cannot_rotate(store: Arc<dyn RefreshTokenStore>) {
    let user = UserId::new();
    let (t0, t1) = (token("t0"), token("t1"));
    store
        .create(user, &t0, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();

    assert_matches!(
        store.validate(&TokenHash::digest(&t0)).await,
        Err(RefreshTokenStoreError::Expired)
    );
    assert_matches!(
        store.rotate(&t0, user, &t1, in_a_day()).await,
        Err(RefreshTokenStoreError::Expired)
    );
    assert_eq!(status(store.as_ref(), &t1).await, None);
}

pub async fn revoke_all_counts_active_records(store: Arc<dyn RefreshTokenStore>) {
    let (user, other) = (UserId::new(), UserId::new());
    let (a, b, c, bystander) = (token("a"), token("b"), token("c"), token("bystander"));
    for t in [&a, &b, &c] {
        store.create(user, t, in_a_day()).await.unwrap();
    }
    store.create(other, &bystander, in_a_day()).await.unwrap();
    store.revoke_by_token(&c).await.unwrap();

    assert_eq!(store.revoke_all_for_user(user).await.unwrap(), 2);
    assert_eq!(store.revoke_all_for_user(user).await.unwrap(), 0);

    for t in [&a, &b, &c] {
        assert_eq!(status(store.as_ref(), t).await, Some(TokenStatus::Revoked));
    }
    assert_eq!(
        status(store.as_ref(), &bystander).await,
        Some(TokenStatus::Active)
    );
}
