// ABOUTME: HTTP integration tests for registration and login routes
// ABOUTME: Covers duplicate emails, password rules and credential-code upgrades
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

use dojo_server::models::{InstructorCredential, Role};
use dojo_server::routes;

fn register_body(email: &str) -> Value {
    json!({
        "name": "Helio",
        "email": email,
        "password": "password123",
        "confirm_password": "password123",
    })
}

#[tokio::test]
async fn test_register_creates_athlete_session() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources.clone());

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&register_body("helio@dojo.test"))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "ATHLETE");
    let token = body["token"].as_str().unwrap().to_owned();

    // The issued token authenticates against the API
    let me = AxumTestRequest::get("/api/users/me")
        .header("authorization", &format!("Bearer {token}"))
        .send(app)
        .await;
    assert_eq!(me.status(), 200);
    let me: Value = me.json();
    assert_eq!(me["email"], "helio@dojo.test");
    assert_eq!(me["belt"], "WHITE");

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources.clone());

    let first = AxumTestRequest::post("/api/auth/register")
        .json(&register_body("dup@dojo.test"))
        .send(app.clone())
        .await;
    assert_eq!(first.status(), 201);

    let second = AxumTestRequest::post("/api/auth/register")
        .json(&register_body("dup@dojo.test"))
        .send(app)
        .await;
    assert_eq!(second.status(), 409);
    let body: Value = second.json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_password_mismatch() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Helio",
            "email": "mismatch@dojo.test",
            "password": "password123",
            "confirm_password": "password456",
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_short_password() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Helio",
            "email": "short@dojo.test",
            "password": "short",
            "confirm_password": "short",
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_register_with_credential_grants_instructor() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let credential = InstructorCredential::new("123456789".into());
    resources.database.create_credential(&credential).await?;

    let app = routes::router(resources.clone());
    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Carlos",
            "email": "carlos@dojo.test",
            "password": "password123",
            "confirm_password": "password123",
            "credential_code": "123456789",
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "INSTRUCTOR");

    // The credential is consumed and linked
    let stored = resources
        .database
        .get_credential(credential.id)
        .await?
        .unwrap();
    assert!(stored.is_used);
    assert!(stored.used_by.is_some());

    // A second registration with the same code fails
    let reuse = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Rolls",
            "email": "rolls@dojo.test",
            "password": "password123",
            "confirm_password": "password123",
            "credential_code": "123456789",
        }))
        .send(app)
        .await;
    assert_eq!(reuse.status(), 400);

    // The rejected registration must not leave an account behind
    assert!(resources
        .database
        .get_user_by_email("rolls@dojo.test")
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_register_with_unknown_credential_fails() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Carlos",
            "email": "carlos@dojo.test",
            "password": "password123",
            "confirm_password": "password123",
            "credential_code": "000000000",
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_login_round_trip() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    common::create_user(
        &resources.database,
        "Rickson",
        "rickson@dojo.test",
        Role::Athlete,
    )
    .await?;

    let app = routes::router(resources);
    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "rickson@dojo.test", "password": "password123" }))
        .send(app)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["user"]["name"], "Rickson");
    assert!(body["token"].as_str().is_some());
    assert!(body["expires_at"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn test_login_unknown_email_is_not_found() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let app = routes::router(resources);

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "nobody@dojo.test", "password": "password123" }))
        .send(app)
        .await;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    common::create_user(
        &resources.database,
        "Rickson",
        "rickson@dojo.test",
        Role::Athlete,
    )
    .await?;

    let app = routes::router(resources);
    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "rickson@dojo.test", "password": "wrong-password" }))
        .send(app)
        .await;
    assert_eq!(response.status(), 401);

    Ok(())
}
