#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use tenantpress::db::{PgStore, Store};

use super::TestApp;

/// A dedicated, migrated database for one test.
pub struct TestDb {
    pub pool: PgPool,
    pub store: Store,
    pub db_name: String,
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Create a fresh database and run migrations on it. Returns `None` when
/// `DATABASE_URL` is not set so Postgres tests are skipped on machines
/// without a server.
pub async fn spawn_db() -> Option<TestDb> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let db_name = format!(
        "tenantpress_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let store = Store::from_backend(Arc::new(PgStore::new(pool.clone())));

    Some(TestDb {
        pool,
        store,
        db_name,
    })
}

/// Serve the app over a fresh Postgres database, using the seeded
/// Colombia / Bogotá rows as the test location.
pub async fn spawn_app() -> Option<(TestApp, TestDb)> {
    let db = spawn_db().await?;

    let country = db
        .store
        .locations
        .list_countries()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.key == "CO")
        .expect("seeded country");
    let city = db
        .store
        .locations
        .list_cities(country.id)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.key == "BOG")
        .expect("seeded city");

    let app = super::serve(db.store.clone(), country, city).await;
    Some((app, db))
}

/// Drop the test database.
pub async fn cleanup(db: TestDb) {
    let TestDb { pool, db_name, .. } = db;
    pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
