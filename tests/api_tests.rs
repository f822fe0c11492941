//! Integration tests for sign-in, account management and the audit trail.

mod common;

use axum::http::StatusCode;
use common::{ADMIN_USERNAME, spawn_app};
use serde_json::json;
use visitrack::domain::{ActorId, EntityKind};

async fn user_audit_actions(app: &common::TestApp, id: i64) -> Vec<String> {
    app.state
        .store()
        .audit()
        .for_entity(EntityKind::User, i32::try_from(id).unwrap())
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for uri in [
        "/dashboard/",
        "/usuarios/listar/",
        "/visitantes/listar/",
        "/registros/entrada/",
        "/registros/reporte/",
        "/auditoria/",
        "/metrics",
        "/logout/",
    ] {
        let response = app.send("GET", uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json()["success"], false);
    }
}

#[tokio::test]
async fn test_login_and_session_status() {
    let app = spawn_app().await;

    let response = app.send("GET", "/", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["authenticated"], false);

    let cookie = app.login_admin().await;

    let body = app.get("/", &cookie).await.json();
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["user"]["username"], ADMIN_USERNAME);
    assert_eq!(body["data"]["user"]["role"], "administrator");
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = spawn_app().await;

    let wrong_password = app
        .send(
            "POST",
            "/",
            None,
            Some(json!({ "username": ADMIN_USERNAME, "password": "not-the-password" })),
        )
        .await;
    let unknown_user = app
        .send(
            "POST",
            "/",
            None,
            Some(json!({ "username": "nobody", "password": "not-the-password" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json()["error"], unknown_user.json()["error"]);
    assert!(wrong_password.headers.get("set-cookie").is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app.get("/logout/", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get("/dashboard/", &cookie).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_each_account_action_is_audited_once() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let id = app.create_user(&admin, "recepcion1", "receptionist").await;
    assert_eq!(user_audit_actions(&app, id).await, ["CREATE"]);

    let response = app
        .post(
            &format!("/usuarios/{id}/editar/"),
            &admin,
            json!({
                "first_name": "Marta",
                "last_name": "Ruiz",
                "email": "marta@example.com",
                "role": "receptionist",
                "is_active": true,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["data"]["first_name"], "Marta");
    assert_eq!(user_audit_actions(&app, id).await, ["CREATE", "UPDATE"]);

    app.login("recepcion1", "front-desk-pass").await;
    assert_eq!(
        user_audit_actions(&app, id).await,
        ["CREATE", "UPDATE", "LOGIN"]
    );

    let before_delete = app.state.store().audit().count().await.unwrap();
    let response = app
        .post(&format!("/usuarios/{id}/eliminar/"), &admin, json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(
        user_audit_actions(&app, id).await,
        ["CREATE", "UPDATE", "LOGIN", "DELETE"]
    );
    assert_eq!(
        app.state.store().audit().count().await.unwrap(),
        before_delete + 1
    );

    // The trail outlives the account; the actor reference is cleared.
    let entries = app
        .state
        .store()
        .audit()
        .for_entity(EntityKind::User, i32::try_from(id).unwrap())
        .await
        .unwrap();
    let login = entries.iter().find(|e| e.action == "LOGIN").unwrap();
    assert_eq!(login.actor_id, None);

    let response = app.get(&format!("/usuarios/{id}/editar/"), &admin).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_receptionist_cannot_manage_accounts() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    app.create_user(&admin, "recepcion1", "receptionist").await;
    let receptionist = app.login("recepcion1", "front-desk-pass").await;

    let users_before = app.state.store().users().count().await.unwrap();
    let audit_before = app.state.store().audit().count().await.unwrap();

    let response = app
        .post(
            "/usuarios/crear/",
            &receptionist,
            json!({
                "username": "intruso",
                "password": "front-desk-pass",
                "password_confirmation": "front-desk-pass",
                "role": "administrator",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/usuarios/listar/", &receptionist).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/auditoria/", &receptionist).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/metrics", &receptionist).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert_eq!(app.state.store().users().count().await.unwrap(), users_before);
    assert_eq!(app.state.store().audit().count().await.unwrap(), audit_before);
    assert!(
        app.state
            .store()
            .users()
            .get_by_username("intruso")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_user_validation_and_conflicts() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let mismatched = app
        .post(
            "/usuarios/crear/",
            &admin,
            json!({
                "username": "nuevo",
                "password": "front-desk-pass",
                "password_confirmation": "something-else",
                "role": "receptionist",
            }),
        )
        .await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST);

    let short = app
        .post(
            "/usuarios/crear/",
            &admin,
            json!({
                "username": "nuevo",
                "password": "short",
                "password_confirmation": "short",
                "role": "receptionist",
            }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    app.create_user(&admin, "nuevo", "receptionist").await;
    let duplicate = app
        .post(
            "/usuarios/crear/",
            &admin,
            json!({
                "username": "nuevo",
                "password": "front-desk-pass",
                "password_confirmation": "front-desk-pass",
                "role": "receptionist",
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let me = app.get("/", &admin).await.json()["data"]["user"]["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post(&format!("/usuarios/{me}/eliminar/"), &admin, json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let still_there = app
        .state
        .store()
        .users()
        .get_by_id(ActorId::new(i32::try_from(me).unwrap()))
        .await
        .unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_deactivated_account_loses_its_session() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    let id = app.create_user(&admin, "recepcion1", "receptionist").await;
    let receptionist = app.login("recepcion1", "front-desk-pass").await;

    assert_eq!(
        app.get("/visitantes/listar/", &receptionist).await.status,
        StatusCode::OK
    );

    let response = app
        .post(
            &format!("/usuarios/{id}/editar/"),
            &admin,
            json!({ "role": "receptionist", "is_active": false }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    assert_eq!(
        app.get("/visitantes/listar/", &receptionist).await.status,
        StatusCode::UNAUTHORIZED
    );

    let response = app
        .send(
            "POST",
            "/",
            None,
            Some(json!({ "username": "recepcion1", "password": "front-desk-pass" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_audit_log_filters_by_action() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    app.create_user(&admin, "recepcion1", "receptionist").await;

    let response = app.get("/auditoria/?accion=LOGIN", &admin).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let body = response.json();
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "LOGIN");
    assert_eq!(body["data"]["page"], 1);

    let response = app.get("/auditoria/?accion=", &admin).await;
    let all = response.json()["data"]["entries"].as_array().unwrap().len();
    assert_eq!(all, 3, "bootstrap CREATE, LOGIN and CREATE");
}

#[tokio::test]
async fn test_deleted_account_keeps_its_recorded_visits() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    let id = app.create_user(&admin, "recepcion1", "receptionist").await;
    let receptionist = app.login("recepcion1", "front-desk-pass").await;

    let ana = app.create_visitor(&receptionist, "Ana", "CC-123").await;
    let response = app
        .post("/registros/entrada/", &receptionist, json!({ "visitor_id": ana }))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["data"]["recorded_by"], id);

    let response = app
        .post(&format!("/usuarios/{id}/eliminar/"), &admin, json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let body = app
        .get(
            &format!("/registros/consultar/?fecha_inicio={}", common::today()),
            &admin,
        )
        .await
        .json();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["visitor"]["id"], ana);
    assert!(rows[0]["recorded_by"].is_null());
    assert!(rows[0]["exited_at"].is_null());
}
