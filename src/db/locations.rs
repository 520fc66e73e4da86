use async_trait::async_trait;
use uuid::Uuid;

use super::{DbResult, LocationRepository, PgStore};
use crate::models::{City, Country};

#[async_trait]
impl LocationRepository for PgStore {
    async fn list_countries(&self) -> DbResult<Vec<Country>> {
        let countries = sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY value")
            .fetch_all(&self.pool)
            .await?;
        Ok(countries)
    }

    async fn find_country(&self, id: Uuid) -> DbResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(country)
    }

    async fn list_cities(&self, country_id: Uuid) -> DbResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT * FROM cities WHERE country_id = $1 ORDER BY value",
        )
        .bind(country_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cities)
    }

    async fn find_city(&self, id: Uuid) -> DbResult<Option<City>> {
        let city = sqlx::query_as::<_, City>("SELECT * FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(city)
    }
}
