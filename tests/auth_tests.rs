// tests/auth_tests.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;
use yamdb::{
    policy::Role,
    store::Store,
    utils::{jwt::verify_jwt, pagination::PageParams},
};

use common::{TEST_SECRET, spawn_app};

#[tokio::test]
async fn signup_twice_is_idempotent() {
    let app = spawn_app();
    let payload = json!({"username": "bob", "email": "b@x.com"});

    let (status, body) = app.post("/api/v1/auth/signup", None, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, payload);

    let (status, body) = app.post("/api/v1/auth/signup", None, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, payload);

    let users = app.store.list_users(None, PageParams::default()).await.unwrap();
    assert_eq!(users.count, 1);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.to == "b@x.com"));
    assert_eq!(sent[0].from, app.config.mail_from);
}

#[tokio::test]
async fn malformed_auth_bodies_are_validation_errors() {
    let app = spawn_app();

    let (status, body) = app
        .post("/api/v1/auth/signup", None, json!({"username": "bob"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
    assert!(body["error"].as_str().unwrap().contains("email"));
    assert!(app.mailer.sent().is_empty());

    let (status, body) = app
        .post("/api/v1/auth/token", None, json!({"username": "bob"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn signup_rejects_invalid_and_taken_identities() {
    let app = spawn_app();

    let (status, body) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({"username": "me", "email": "me@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");

    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({"username": "bad name", "email": "n@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({"username": "bob", "email": "b@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Same username, different email
    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({"username": "bob", "email": "other@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same email, different username
    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({"username": "robert", "email": "b@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.mailer.last_to("other@x.com").is_none());
}

#[tokio::test]
async fn confirmation_code_exchanges_for_token_once() {
    let app = spawn_app();
    app.post(
        "/api/v1/auth/signup",
        None,
        json!({"username": "bob", "email": "b@x.com"}),
    )
    .await;
    let code = app.confirmation_code("b@x.com");

    let (status, body) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({"username": "bob", "confirmation_code": code}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert!(verify_jwt(&token, TEST_SECRET).is_ok());

    let (status, body) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["role"], "user");

    let (status, body) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({"username": "bob", "confirmation_code": code}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "auth_error");
}

#[tokio::test]
async fn token_rejects_wrong_code_and_unknown_user() {
    let app = spawn_app();
    app.post(
        "/api/v1/auth/signup",
        None,
        json!({"username": "bob", "email": "b@x.com"}),
    )
    .await;

    let (status, body) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({"username": "bob", "confirmation_code": "0-deadbeef"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "auth_error");

    let (status, body) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({"username": "nobody", "confirmation_code": "0-deadbeef"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn self_service_cannot_change_role() {
    let app = spawn_app();
    let (_, token) = app.user("carol", Role::User).await;

    let (status, body) = app
        .patch(
            "/api/v1/users/me",
            Some(&token),
            json!({"bio": "Critic", "role": "admin"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Critic");
    assert_eq!(body["role"], "user");

    let stored = app.store.get_user_by_username("carol").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);

    let (status, _) = app.get("/api/v1/users/me", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_users_by_username() {
    let app = spawn_app();
    let admin = app.admin().await;
    let (_, plain) = app.user("plain", Role::User).await;

    let (status, _) = app.get("/api/v1/users", Some(&plain)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&admin),
            json!({"username": "dave", "email": "d@x.com", "role": "moderator"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "moderator");
    assert_eq!(body["first_name"], "");

    let (status, _) = app
        .post(
            "/api/v1/users",
            Some(&admin),
            json!({"username": "dave", "email": "d2@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get("/api/v1/users?search=dav", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = app
        .patch("/api/v1/users/dave", Some(&admin), json!({"role": "admin"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = app.delete("/api/v1/users/dave", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/v1/users/dave", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn superuser_without_admin_role_manages_users() {
    let app = spawn_app();
    let root = app
        .store
        .create_user(&yamdb::models::user::NewUser {
            username: "root".to_string(),
            email: "root@x.com".to_string(),
            is_superuser: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let token = yamdb::utils::jwt::sign_jwt(&root, TEST_SECRET, 600).unwrap();

    let (status, _) = app.get("/api/v1/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    // Superuser alone does not grant catalog edits
    let (status, _) = app
        .post(
            "/api/v1/categories",
            Some(&token),
            json!({"name": "Film", "slug": "film"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
