use async_trait::async_trait;
use uuid::Uuid;

use super::{DbResult, PgStore, UserRepository};
use crate::models::{NewUser, User};

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE auth_subject_id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, subject_id: &str, profile: &NewUser) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, auth_subject_id, email, first_name, last_name, phone, document_type, document_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(subject_id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.document_type)
        .bind(&profile.document_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
