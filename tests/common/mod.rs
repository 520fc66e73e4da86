pub mod pg;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use tenantpress::config::{Config, IdentityBackend, IdentityConfig, SignupMode};
use tenantpress::db::Store;
use tenantpress::db::memory::MemoryStore;
use tenantpress::identity::local::LocalIdentityProvider;
use tenantpress::models::{City, Country};
use tenantpress::state::AppState;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const AUDIENCE: &str = "authenticated";
pub const PASSWORD: &str = "password123";

/// A running test server backed by the in-memory store and the in-process
/// identity provider.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub identity: Arc<LocalIdentityProvider>,
    pub country: Country,
    pub city: City,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a registration payload, return (body, status).
    pub async fn register(&self, payload: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(payload)
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register `email` into a new company with registration number `nit`.
    pub async fn register_with_company(&self, email: &str, nit: &str) -> Value {
        let (body, status) = self
            .register(&registration(email, json!({ "company": company(nit) })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        body
    }

    /// Register `email` into the existing company `company_id`.
    pub async fn register_into(&self, email: &str, company_id: &str, role: &str) -> Value {
        let (body, status) = self
            .register(&registration(
                email,
                json!({ "companyId": company_id, "role": role }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        body
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login and return the access token.
    pub async fn token(&self, email: &str) -> String {
        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["session"]["accessToken"].as_str().unwrap().to_string()
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Registration payload for `email` merged with `extra` (company fields,
/// role).
pub fn registration(email: &str, extra: Value) -> Value {
    let mut payload = json!({
        "email": email,
        "password": PASSWORD,
        "firstName": "Alice",
        "lastName": "Doe",
    });
    if let (Some(target), Some(fields)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    payload
}

pub fn company(nit: &str) -> Value {
    json!({
        "name": format!("Company {nit}"),
        "registrationNumber": nit,
        "email": format!("contact-{nit}@example.com"),
    })
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        identity: IdentityConfig {
            provider: IdentityBackend::Local {
                signups: SignupMode::Open,
            },
            jwt_secret: JWT_SECRET.to_string(),
            jwt_audience: AUDIENCE.to_string(),
        },
    }
}

/// Spawn a test app on a random port with fresh in-memory state.
pub async fn spawn_app() -> TestApp {
    let memory = Arc::new(MemoryStore::new());
    let country = memory.insert_country("CO", "Colombia").await;
    let city = memory.insert_city("BOG", "Bogotá", Some(country.id)).await;

    serve(Store::from_backend(memory), country, city).await
}

/// Serve `store` on a random port. `country` and `city` are rows the store
/// already holds.
pub async fn serve(store: Store, country: Country, city: City) -> TestApp {
    let identity = Arc::new(LocalIdentityProvider::new(JWT_SECRET, AUDIENCE, true));
    let state = Arc::new(AppState::new(store, identity.clone(), test_config()));

    let app = tenantpress::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        identity,
        country,
        city,
    }
}
