//! Repository traits and their Postgres / in-memory implementations.
//!
//! Services depend on the traits only. `Store::postgres` is wired up by the
//! binary; `Store::memory` backs the test suites.

pub mod companies;
pub mod locations;
pub mod memberships;
pub mod memory;
pub mod posts;
pub mod preferences;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    City, Company, Country, NewCompany, NewPost, NewUser, Post, PostChanges, PreferencesPatch,
    Role, User, UserCompany, UserPreferences,
};

/// Unique constraint names shared by the schema and the in-memory store.
pub const USER_SUBJECT_KEY: &str = "users_auth_subject_id_key";
pub const USER_EMAIL_KEY: &str = "users_email_key";
pub const COMPANY_REGISTRATION_KEY: &str = "companies_registration_number_key";
pub const USER_COMPANY_KEY: &str = "user_companies_user_company_key";
pub const USER_COMPANY_SELECTED_KEY: &str = "user_companies_one_selected";

#[derive(Debug)]
pub enum DbError {
    /// Carries the name of the violated constraint.
    UniqueViolation(String),
    Sqlx(sqlx::Error),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::UniqueViolation(constraint) => write!(f, "unique violation on {constraint}"),
            DbError::Sqlx(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                return DbError::UniqueViolation(constraint);
            }
        }
        DbError::Sqlx(err)
    }
}

impl DbError {
    pub fn is_unique_violation_on(&self, constraint: &str) -> bool {
        matches!(self, DbError::UniqueViolation(c) if c == constraint)
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_subject_id(&self, subject_id: &str) -> DbResult<Option<User>>;
    async fn create(&self, subject_id: &str, profile: &NewUser) -> DbResult<User>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Company>>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Company>>;
    async fn find_by_registration_number(&self, number: &str) -> DbResult<Option<Company>>;
    async fn create(&self, company: &NewCompany) -> DbResult<Company>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>>;

    /// Inserts the association, selecting it when the user has no selected
    /// association yet. A duplicate pair fails with `USER_COMPANY_KEY`.
    async fn create(&self, user_id: Uuid, company_id: Uuid, role: Role) -> DbResult<UserCompany>;

    /// Makes `company_id` the user's only selected association. Returns
    /// `None`, with nothing changed, when the association does not exist.
    async fn update_selection(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>>;

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<UserCompany>>;
    async fn find_selected(&self, user_id: Uuid) -> DbResult<Option<UserCompany>>;
    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn list_countries(&self) -> DbResult<Vec<Country>>;
    async fn find_country(&self, id: Uuid) -> DbResult<Option<Country>>;
    async fn list_cities(&self, country_id: Uuid) -> DbResult<Vec<City>>;
    async fn find_city(&self, id: Uuid) -> DbResult<Option<City>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn list(
        &self,
        company_id: Uuid,
        published: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Post>>;
    async fn find_by_id(&self, id: Uuid, company_id: Uuid) -> DbResult<Option<Post>>;
    async fn create(&self, post: &NewPost) -> DbResult<Post>;
    async fn update(
        &self,
        id: Uuid,
        company_id: Uuid,
        changes: &PostChanges,
    ) -> DbResult<Option<Post>>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid, company_id: Uuid) -> DbResult<bool>;
}

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<UserPreferences>>;
    async fn upsert(&self, user_id: Uuid, patch: &PreferencesPatch) -> DbResult<UserPreferences>;
}

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The set of repositories handed to services and handlers.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }

    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository
            + CompanyRepository
            + MembershipRepository
            + LocationRepository
            + PostRepository
            + PreferencesRepository
            + 'static,
    {
        Self {
            users: backend.clone(),
            companies: backend.clone(),
            memberships: backend.clone(),
            locations: backend.clone(),
            posts: backend.clone(),
            preferences: backend,
        }
    }
}
