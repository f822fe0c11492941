//! Shared harness: a router over a fresh temp-file database, plus
//! helpers to sign in and send JSON requests with the session cookie.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use visitrack::api::AppState;
use visitrack::config::{Config, SecurityConfig};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "change-me-now";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("visitrack-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    config.bootstrap.admin_username = ADMIN_USERNAME.to_string();
    config.bootstrap.admin_password = ADMIN_PASSWORD.to_string();
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };

    let state = visitrack::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = visitrack::api::router(state.clone()).await;

    TestApp { state, router }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: axum::body::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is not UTF-8")
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send("GET", uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: serde_json::Value) -> TestResponse {
        self.send("POST", uri, Some(cookie), Some(body)).await
    }

    /// Signs in and returns the `name=value` pair of the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(
                "POST",
                "/",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text());

        let set_cookie = response
            .headers
            .get(header::SET_COOKIE)
            .expect("login did not set a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn login_admin(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Creates an account through the API and returns its id.
    pub async fn create_user(&self, admin_cookie: &str, username: &str, role: &str) -> i64 {
        let response = self
            .post(
                "/usuarios/crear/",
                admin_cookie,
                serde_json::json!({
                    "username": username,
                    "password": "front-desk-pass",
                    "password_confirmation": "front-desk-pass",
                    "first_name": "Test",
                    "last_name": username,
                    "role": role,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["data"]["id"].as_i64().unwrap()
    }

    /// Registers a visitor through the API and returns its id.
    pub async fn create_visitor(&self, cookie: &str, name: &str, document: &str) -> i64 {
        let response = self.post("/visitantes/registrar/", cookie, visitor_form(name, document)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["data"]["id"].as_i64().unwrap()
    }
}

pub fn visitor_form(name: &str, document: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "document_type": "CC",
        "document": document,
        "visit_purpose": "Reunión",
        "unit_visited": "302",
        "host_name": "Luis Gómez",
    })
}

pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
