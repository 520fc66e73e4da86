//! Postgres-backed store tests. Each test gets its own migrated database and
//! is skipped when `DATABASE_URL` is not set.

mod common;

use reqwest::StatusCode;
use serde_json::json;
use tokio::task::JoinSet;
use uuid::Uuid;

use common::pg::{self, TestDb};
use tenantpress::db::{
    COMPANY_REGISTRATION_KEY, Store, USER_COMPANY_KEY, USER_EMAIL_KEY, USER_SUBJECT_KEY,
};
use tenantpress::models::{
    Company, NewCompany, NewPost, NewUser, PostChanges, PreferencesPatch, Role, User,
};

fn profile(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        first_name: "Alice".to_string(),
        last_name: "Doe".to_string(),
        ..Default::default()
    }
}

fn new_company(nit: &str) -> NewCompany {
    NewCompany {
        name: format!("Company {nit}"),
        registration_number: nit.to_string(),
        email: format!("contact-{nit}@example.com"),
        phone: None,
        address: None,
        country_id: None,
        city_id: None,
    }
}

async fn user(store: &Store, email: &str) -> User {
    store
        .users
        .create(&format!("subject-{email}"), &profile(email))
        .await
        .unwrap()
}

async fn companies(store: &Store, count: usize) -> Vec<Company> {
    let mut created = Vec::with_capacity(count);
    for n in 0..count {
        created.push(
            store
                .companies
                .create(&new_company(&format!("90000000{n}-1")))
                .await
                .unwrap(),
        );
    }
    created
}

async fn selected_count(db: &TestDb, user_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT count(*) FROM user_companies WHERE user_id = $1 AND is_selected",
    )
    .bind(user_id)
    .fetch_one(&db.pool)
    .await
    .unwrap()
}

// ── Unique constraints ──────────────────────────────────────────

#[tokio::test]
async fn duplicate_pair_violates_user_company_key() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let acme = companies(&db.store, 1).await.remove(0);

    db.store
        .memberships
        .create(alice.id, acme.id, Role::User)
        .await
        .unwrap();
    let err = db
        .store
        .memberships
        .create(alice.id, acme.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on(USER_COMPANY_KEY), "{err}");
    assert_eq!(db.store.memberships.count_for_user(alice.id).await.unwrap(), 1);

    pg::cleanup(db).await;
}

#[tokio::test]
async fn duplicate_registration_number_violates_company_key() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    db.store
        .companies
        .create(&new_company("900111222-3"))
        .await
        .unwrap();

    let err = db
        .store
        .companies
        .create(&new_company("900111222-3"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on(COMPANY_REGISTRATION_KEY), "{err}");

    pg::cleanup(db).await;
}

#[tokio::test]
async fn duplicate_subject_and_email_violate_user_keys() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    db.store
        .users
        .create("subject-1", &profile("alice@example.com"))
        .await
        .unwrap();

    let err = db
        .store
        .users
        .create("subject-1", &profile("other@example.com"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on(USER_SUBJECT_KEY), "{err}");

    let err = db
        .store
        .users
        .create("subject-2", &profile("alice@example.com"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on(USER_EMAIL_KEY), "{err}");

    pg::cleanup(db).await;
}

// ── Selection ───────────────────────────────────────────────────

#[tokio::test]
async fn first_association_is_selected_later_ones_are_not() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let [first, second] = <[Company; 2]>::try_from(companies(&db.store, 2).await).unwrap();

    let a = db
        .store
        .memberships
        .create(alice.id, first.id, Role::User)
        .await
        .unwrap();
    let b = db
        .store
        .memberships
        .create(alice.id, second.id, Role::Moderator)
        .await
        .unwrap();
    assert!(a.is_selected);
    assert!(!b.is_selected);
    assert_eq!(b.role, Role::Moderator);

    let selected = db.store.memberships.find_selected(alice.id).await.unwrap();
    assert_eq!(selected.map(|m| m.company_id), Some(first.id));

    pg::cleanup(db).await;
}

#[tokio::test]
async fn update_selection_leaves_exactly_one_selected() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let all = companies(&db.store, 3).await;
    for company in &all {
        db.store
            .memberships
            .create(alice.id, company.id, Role::User)
            .await
            .unwrap();
    }

    let switched = db
        .store
        .memberships
        .update_selection(alice.id, all[2].id)
        .await
        .unwrap()
        .expect("association exists");
    assert!(switched.is_selected);
    assert_eq!(switched.company_id, all[2].id);
    assert_eq!(selected_count(&db, alice.id).await, 1);

    let listed = db.store.memberships.list_for_user(alice.id).await.unwrap();
    for membership in listed {
        assert_eq!(membership.is_selected, membership.company_id == all[2].id);
    }

    pg::cleanup(db).await;
}

#[tokio::test]
async fn update_selection_of_missing_association_changes_nothing() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let [mine, other] = <[Company; 2]>::try_from(companies(&db.store, 2).await).unwrap();
    db.store
        .memberships
        .create(alice.id, mine.id, Role::User)
        .await
        .unwrap();

    let result = db
        .store
        .memberships
        .update_selection(alice.id, other.id)
        .await
        .unwrap();
    assert!(result.is_none());

    let selected = db.store.memberships.find_selected(alice.id).await.unwrap();
    assert_eq!(selected.map(|m| m.company_id), Some(mine.id));
    assert_eq!(selected_count(&db, alice.id).await, 1);

    pg::cleanup(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_associations_select_exactly_one() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let all = companies(&db.store, 8).await;

    let mut tasks = JoinSet::new();
    for company in &all {
        let store = db.store.clone();
        let (user_id, company_id) = (alice.id, company.id);
        tasks.spawn(async move {
            store
                .memberships
                .create(user_id, company_id, Role::User)
                .await
        });
    }

    let mut selected = 0;
    while let Some(joined) = tasks.join_next().await {
        let membership = joined.unwrap().expect("no spurious conflict");
        if membership.is_selected {
            selected += 1;
        }
    }
    assert_eq!(selected, 1);
    assert_eq!(selected_count(&db, alice.id).await, 1);
    assert_eq!(db.store.memberships.count_for_user(alice.id).await.unwrap(), 8);

    pg::cleanup(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_selection_switches_never_conflict() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let all = companies(&db.store, 6).await;
    for company in &all {
        db.store
            .memberships
            .create(alice.id, company.id, Role::User)
            .await
            .unwrap();
    }

    let mut tasks = JoinSet::new();
    for round in 0..3 {
        for company in &all {
            let store = db.store.clone();
            let (user_id, company_id) = (alice.id, company.id);
            tasks.spawn(async move {
                let switched = store
                    .memberships
                    .update_selection(user_id, company_id)
                    .await;
                (round, switched)
            });
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (round, switched) = joined.unwrap();
        let switched = switched.unwrap_or_else(|err| panic!("round {round}: {err}"));
        assert!(switched.expect("association exists").is_selected);
    }
    assert_eq!(selected_count(&db, alice.id).await, 1);

    pg::cleanup(db).await;
}

// ── Posts & preferences ─────────────────────────────────────────

#[tokio::test]
async fn post_update_keeps_fields_not_supplied() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let acme = companies(&db.store, 1).await.remove(0);

    let post = db
        .store
        .posts
        .create(&NewPost {
            company_id: acme.id,
            author_id: alice.id,
            title: "Hello".to_string(),
            content: "First post".to_string(),
            excerpt: Some("Intro".to_string()),
            published: true,
        })
        .await
        .unwrap();

    let updated = db
        .store
        .posts
        .update(
            post.id,
            acme.id,
            &PostChanges {
                title: Some("Hello again".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("post exists");
    assert_eq!(updated.title, "Hello again");
    assert_eq!(updated.content, "First post");
    assert_eq!(updated.excerpt.as_deref(), Some("Intro"));
    assert!(updated.published);

    let other = db
        .store
        .companies
        .create(&new_company("800222333-1"))
        .await
        .unwrap();
    let missing = db
        .store
        .posts
        .update(post.id, other.id, &PostChanges::default())
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(!db.store.posts.delete(post.id, other.id).await.unwrap());
    assert!(db.store.posts.delete(post.id, acme.id).await.unwrap());

    pg::cleanup(db).await;
}

#[tokio::test]
async fn preferences_upsert_merges_with_stored_row() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    assert!(
        db.store
            .preferences
            .find_by_user(alice.id)
            .await
            .unwrap()
            .is_none()
    );

    let first = db
        .store
        .preferences
        .upsert(
            alice.id,
            &PreferencesPatch {
                theme: Some("dark".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first.theme, "dark");
    assert_eq!(first.language, "es");
    assert_eq!(first.page_size, 10);

    let second = db
        .store
        .preferences
        .upsert(
            alice.id,
            &PreferencesPatch {
                language: Some("en-US".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.language, "en-US");
    assert_eq!(second.theme, "dark");
    assert_eq!(second.page_size, 10);

    pg::cleanup(db).await;
}

// ── Ids & reference data ────────────────────────────────────────

#[tokio::test]
async fn inserted_rows_get_time_ordered_ids() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let alice = user(&db.store, "alice@example.com").await;
    let acme = companies(&db.store, 1).await.remove(0);
    let membership = db
        .store
        .memberships
        .create(alice.id, acme.id, Role::User)
        .await
        .unwrap();
    let post = db
        .store
        .posts
        .create(&NewPost {
            company_id: acme.id,
            author_id: alice.id,
            title: "Hello".to_string(),
            content: String::new(),
            excerpt: None,
            published: false,
        })
        .await
        .unwrap();

    for id in [alice.id, acme.id, membership.id, post.id] {
        assert_eq!(id.get_version_num(), 7, "{id}");
    }

    pg::cleanup(db).await;
}

#[tokio::test]
async fn migrations_seed_countries_and_cities() {
    let Some(db) = pg::spawn_db().await else {
        return;
    };
    let countries = db.store.locations.list_countries().await.unwrap();
    let colombia = countries
        .iter()
        .find(|c| c.key == "CO")
        .expect("Colombia seeded");

    let cities = db.store.locations.list_cities(colombia.id).await.unwrap();
    assert!(cities.iter().any(|c| c.key == "BOG"));
    assert!(cities.iter().all(|c| c.country_id == Some(colombia.id)));

    pg::cleanup(db).await;
}

// ── End to end ──────────────────────────────────────────────────

#[tokio::test]
async fn registration_workflow_over_postgres() {
    let Some((app, db)) = pg::spawn_app().await else {
        return;
    };

    let alice = app
        .register_with_company("alice@example.com", "900111222-3")
        .await;
    assert_eq!(alice["scenario"], "NEW_USER_NEW_COMPANY");
    let company_id = alice["company"]["id"].as_str().unwrap().to_string();

    let bob = app.register_into("bob@example.com", &company_id, "MODERATOR").await;
    assert_eq!(bob["scenario"], "NEW_USER_EXISTING_COMPANY");
    assert_eq!(bob["userCompany"]["isSelected"], true);

    let (body, status) = app
        .register(&common::registration(
            "alice@example.com",
            json!({ "companyId": company_id }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let second = app
        .register_with_company("alice@example.com", "800222333-1")
        .await;
    assert_eq!(second["scenario"], "EXISTING_USER_NEW_COMPANY");
    assert_eq!(second["userCompany"]["isSelected"], false);

    pg::cleanup(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_select_requests_all_succeed() {
    let Some((app, db)) = pg::spawn_app().await else {
        return;
    };
    let mut ids = Vec::new();
    for nit in ["900111222-3", "800222333-1", "700333444-2"] {
        let body = app.register_with_company("alice@example.com", nit).await;
        ids.push(body["company"]["id"].as_str().unwrap().to_string());
    }
    let token = app.token("alice@example.com").await;

    let mut tasks = JoinSet::new();
    for id in ids.iter().chain(ids.iter()) {
        let client = app.client.clone();
        let url = app.url(&format!("/api/v1/me/companies/{id}/select"));
        let token = token.clone();
        tasks.spawn(async move {
            client
                .put(url)
                .bearer_auth(token)
                .json(&json!({}))
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let (companies, _) = app.get_auth("/api/v1/me/companies", &token).await;
    let selected = companies
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["isSelected"] == true)
        .count();
    assert_eq!(selected, 1);

    pg::cleanup(db).await;
}
