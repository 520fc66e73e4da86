use async_trait::async_trait;
use uuid::Uuid;

use super::{DbResult, PgStore, PostRepository};
use crate::models::{NewPost, Post, PostChanges};

#[async_trait]
impl PostRepository for PgStore {
    async fn list(
        &self,
        company_id: Uuid,
        published: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts
             WHERE company_id = $1 AND ($2::BOOLEAN IS NULL OR published = $2)
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(company_id)
        .bind(published)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn find_by_id(&self, id: Uuid, company_id: Uuid) -> DbResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn create(&self, post: &NewPost) -> DbResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, company_id, author_id, title, content, excerpt, published)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(post.company_id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(post.published)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update(
        &self,
        id: Uuid,
        company_id: Uuid,
        changes: &PostChanges,
    ) -> DbResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "UPDATE posts SET
                 title = COALESCE($3, title),
                 content = COALESCE($4, content),
                 excerpt = COALESCE($5, excerpt),
                 published = COALESCE($6, published),
                 updated_at = now()
             WHERE id = $1 AND company_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(company_id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.excerpt)
        .bind(changes.published)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete(&self, id: Uuid, company_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
