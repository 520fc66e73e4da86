//! In-memory store used by the test suites.
//!
//! Enforces the same unique constraints as the Postgres schema and reports
//! violations with the same constraint names.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    COMPANY_REGISTRATION_KEY, CompanyRepository, DbError, DbResult, LocationRepository,
    MembershipRepository, PostRepository, PreferencesRepository, USER_COMPANY_KEY, USER_EMAIL_KEY,
    USER_SUBJECT_KEY, UserRepository,
};
use crate::models::{
    City, Company, Country, NewCompany, NewPost, NewUser, Post, PostChanges, PreferencesPatch,
    Role, User, UserCompany, UserPreferences,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    companies: Vec<Company>,
    memberships: Vec<UserCompany>,
    countries: Vec<Country>,
    cities: Vec<City>,
    posts: Vec<Post>,
    preferences: HashMap<Uuid, UserPreferences>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_country(&self, key: &str, value: &str) -> Country {
        let country = Country {
            id: Uuid::now_v7(),
            key: key.to_string(),
            value: value.to_string(),
        };
        self.tables.lock().await.countries.push(country.clone());
        country
    }

    pub async fn insert_city(&self, key: &str, value: &str, country_id: Option<Uuid>) -> City {
        let city = City {
            id: Uuid::now_v7(),
            key: key.to_string(),
            value: value.to_string(),
            country_id,
        };
        self.tables.lock().await.cities.push(city.clone());
        city
    }
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation(constraint.to_string())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> DbResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.auth_subject_id == subject_id)
            .cloned())
    }

    async fn create(&self, subject_id: &str, profile: &NewUser) -> DbResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.auth_subject_id == subject_id) {
            return Err(unique_violation(USER_SUBJECT_KEY));
        }
        if tables.users.iter().any(|u| u.email == profile.email) {
            return Err(unique_violation(USER_EMAIL_KEY));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            auth_subject_id: subject_id.to_string(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
            document_type: profile.document_type.clone(),
            document_number: profile.document_number.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Company>> {
        let tables = self.tables.lock().await;
        Ok(tables.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Company>> {
        let tables = self.tables.lock().await;
        let mut companies: Vec<Company> = tables
            .companies
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn find_by_registration_number(&self, number: &str) -> DbResult<Option<Company>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .companies
            .iter()
            .find(|c| c.registration_number == number)
            .cloned())
    }

    async fn create(&self, company: &NewCompany) -> DbResult<Company> {
        let mut tables = self.tables.lock().await;
        if tables
            .companies
            .iter()
            .any(|c| c.registration_number == company.registration_number)
        {
            return Err(unique_violation(COMPANY_REGISTRATION_KEY));
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::now_v7(),
            name: company.name.clone(),
            registration_number: company.registration_number.clone(),
            email: company.email.clone(),
            phone: company.phone.clone(),
            address: company.address.clone(),
            country_id: company.country_id,
            city_id: company.city_id,
            created_at: now,
            updated_at: now,
        };
        tables.companies.push(company.clone());
        Ok(company)
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn find_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.company_id == company_id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, company_id: Uuid, role: Role) -> DbResult<UserCompany> {
        let mut tables = self.tables.lock().await;
        let mut has_selected = false;
        for m in tables.memberships.iter().filter(|m| m.user_id == user_id) {
            if m.company_id == company_id {
                return Err(unique_violation(USER_COMPANY_KEY));
            }
            has_selected |= m.is_selected;
        }

        let now = Utc::now();
        let membership = UserCompany {
            id: Uuid::now_v7(),
            user_id,
            company_id,
            role,
            is_selected: !has_selected,
            created_at: now,
            updated_at: now,
        };
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn update_selection(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>> {
        let mut tables = self.tables.lock().await;
        if !tables
            .memberships
            .iter()
            .any(|m| m.user_id == user_id && m.company_id == company_id)
        {
            return Ok(None);
        }

        let now = Utc::now();
        let mut selected = None;
        for m in tables.memberships.iter_mut().filter(|m| m.user_id == user_id) {
            let target = m.company_id == company_id;
            if m.is_selected != target {
                m.is_selected = target;
                m.updated_at = now;
            }
            if target {
                selected = Some(m.clone());
            }
        }
        Ok(selected)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<UserCompany>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_selected(&self, user_id: Uuid) -> DbResult<Option<UserCompany>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.is_selected)
            .cloned())
    }

    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.memberships.iter().filter(|m| m.user_id == user_id).count() as i64)
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn list_countries(&self) -> DbResult<Vec<Country>> {
        let tables = self.tables.lock().await;
        let mut countries = tables.countries.clone();
        countries.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(countries)
    }

    async fn find_country(&self, id: Uuid) -> DbResult<Option<Country>> {
        let tables = self.tables.lock().await;
        Ok(tables.countries.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cities(&self, country_id: Uuid) -> DbResult<Vec<City>> {
        let tables = self.tables.lock().await;
        let mut cities: Vec<City> = tables
            .cities
            .iter()
            .filter(|c| c.country_id == Some(country_id))
            .cloned()
            .collect();
        cities.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(cities)
    }

    async fn find_city(&self, id: Uuid) -> DbResult<Option<City>> {
        let tables = self.tables.lock().await;
        Ok(tables.cities.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list(
        &self,
        company_id: Uuid,
        published: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Post>> {
        let tables = self.tables.lock().await;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.company_id == company_id)
            .filter(|p| published.is_none_or(|flag| p.published == flag))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid, company_id: Uuid) -> DbResult<Option<Post>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id && p.company_id == company_id)
            .cloned())
    }

    async fn create(&self, post: &NewPost) -> DbResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            company_id: post.company_id,
            author_id: post.author_id,
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            published: post.published,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.posts.push(post.clone());
        Ok(post)
    }

    async fn update(
        &self,
        id: Uuid,
        company_id: Uuid,
        changes: &PostChanges,
    ) -> DbResult<Option<Post>> {
        let mut tables = self.tables.lock().await;
        let Some(post) = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.company_id == company_id)
        else {
            return Ok(None);
        };

        if let Some(ref title) = changes.title {
            post.title = title.clone();
        }
        if let Some(ref content) = changes.content {
            post.content = content.clone();
        }
        if let Some(ref excerpt) = changes.excerpt {
            post.excerpt = Some(excerpt.clone());
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid, company_id: Uuid) -> DbResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.posts.len();
        tables
            .posts
            .retain(|p| !(p.id == id && p.company_id == company_id));
        Ok(tables.posts.len() < before)
    }
}

#[async_trait]
impl PreferencesRepository for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<UserPreferences>> {
        let tables = self.tables.lock().await;
        Ok(tables.preferences.get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, patch: &PreferencesPatch) -> DbResult<UserPreferences> {
        let mut tables = self.tables.lock().await;
        let prefs = tables
            .preferences
            .entry(user_id)
            .or_insert_with(|| UserPreferences::defaults(user_id));
        prefs.apply(patch);
        Ok(prefs.clone())
    }
}
