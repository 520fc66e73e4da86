use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{DbResult, MembershipRepository, PgStore};
use crate::models::{Role, UserCompany};

/// Serializes association writes for one user. Every statement that can
/// flip `is_selected` runs after this lock, so the single-selection index
/// is never raced.
async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> DbResult<()> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl MembershipRepository for PgStore {
    async fn find_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>> {
        let membership = sqlx::query_as::<_, UserCompany>(
            "SELECT * FROM user_companies WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn create(&self, user_id: Uuid, company_id: Uuid, role: Role) -> DbResult<UserCompany> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let membership = sqlx::query_as::<_, UserCompany>(
            "INSERT INTO user_companies (id, user_id, company_id, role, is_selected)
             VALUES ($1, $2, $3, $4, NOT EXISTS (
                 SELECT 1 FROM user_companies WHERE user_id = $2 AND is_selected
             ))
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(company_id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(membership)
    }

    async fn update_selection(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> DbResult<Option<UserCompany>> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let target: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM user_companies WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?;

        if target.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        // Clear first so the partial unique index never sees two selected rows.
        sqlx::query(
            "UPDATE user_companies SET is_selected = false, updated_at = now()
             WHERE user_id = $1 AND is_selected AND company_id <> $2",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, UserCompany>(
            "UPDATE user_companies SET is_selected = true, updated_at = now()
             WHERE user_id = $1 AND company_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(membership))
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<UserCompany>> {
        let memberships = sqlx::query_as::<_, UserCompany>(
            "SELECT * FROM user_companies WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    async fn find_selected(&self, user_id: Uuid) -> DbResult<Option<UserCompany>> {
        let membership = sqlx::query_as::<_, UserCompany>(
            "SELECT * FROM user_companies WHERE user_id = $1 AND is_selected",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_companies WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
