use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{City, Country};
use crate::state::SharedState;

pub async fn list_countries(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Country>>, AppError> {
    Ok(Json(state.store.locations.list_countries().await?))
}

pub async fn get_country(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Country>, AppError> {
    let country = state
        .store
        .locations
        .find_country(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))?;
    Ok(Json(country))
}

pub async fn list_cities(
    State(state): State<SharedState>,
    Path(country_id): Path<Uuid>,
) -> Result<Json<Vec<City>>, AppError> {
    state
        .store
        .locations
        .find_country(country_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))?;
    Ok(Json(state.store.locations.list_cities(country_id).await?))
}

pub async fn get_city(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<City>, AppError> {
    let city = state
        .store
        .locations
        .find_city(id)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;
    Ok(Json(city))
}
