pub mod auth;
pub mod companies;
pub mod locations;
pub mod navigation;
pub mod posts;
pub mod preferences;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Current user
        .route("/api/v1/me/companies", get(companies::list))
        .route(
            "/api/v1/me/companies/{company_id}/select",
            put(companies::select),
        )
        .route(
            "/api/v1/me/preferences",
            get(preferences::get).put(preferences::update),
        )
        .route("/api/v1/navigation", get(navigation::menu))
        // Posts
        .route("/api/v1/posts", get(posts::list).post(posts::create))
        .route(
            "/api/v1/posts/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        // Locations
        .route("/api/v1/countries", get(locations::list_countries))
        .route("/api/v1/countries/{id}", get(locations::get_country))
        .route("/api/v1/countries/{id}/cities", get(locations::list_cities))
        .route("/api/v1/cities/{id}", get(locations::get_city))
}
