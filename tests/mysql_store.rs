//! Runs against a live MySQL server. `sqlx::test` creates a scratch database
//! per test from `DATABASE_URL` and applies `migrations/`.
//!
//! `DATABASE_URL=mysql://root:pw@localhost:3306/countersign cargo test --test mysql_store -- --ignored`

mod common;

use common::store_cases;
use countersign::domain_port::RefreshTokenStore;
use countersign::infra_mysql::MySqlRefreshTokenStore;
use sqlx::MySqlPool;
use std::sync::Arc;

fn store(pool: MySqlPool) -> Arc<dyn RefreshTokenStore> {
    Arc::new(MySqlRefreshTokenStore::new(pool))
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn rotate_is_single_use(pool: MySqlPool) {
    store_cases::rotate_is_single_use(store(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn concurrent_rotate_has_one_winner(pool: MySqlPool) {
    store_cases::concurrent_rotate_has_one_winner(store(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn foreign_owner_cannot_rotate(pool: MySqlPool) {
    store_cases::foreign_owner_cannot_rotate(store(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn duplicate_successor_rolls_back_the_revoke(pool: MySqlPool) {
    store_cases::duplicate_successor_leaves_old_record_active(store(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn expired_record_cannot_rotate(pool: MySqlPool) {
    store_cases::expired_record_cannot_rotate(store(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at MySQL"]
async fn revoke_all_counts_active_records(pool: MySqlPool) {
    store_cases::revoke_all_counts_active_records(store(pool)).await;
}
