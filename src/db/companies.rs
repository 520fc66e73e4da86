use async_trait::async_trait;
use uuid::Uuid;

use super::{CompanyRepository, DbResult, PgStore};
use crate::models::{Company, NewCompany};

#[async_trait]
impl CompanyRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    async fn find_by_registration_number(&self, number: &str) -> DbResult<Option<Company>> {
        let company =
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE registration_number = $1")
                .bind(number)
                .fetch_optional(&self.pool)
                .await?;
        Ok(company)
    }

    async fn create(&self, company: &NewCompany) -> DbResult<Company> {
        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (id, name, registration_number, email, phone, address, country_id, city_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&company.name)
        .bind(&company.registration_number)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.address)
        .bind(company.country_id)
        .bind(company.city_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(company)
    }
}
