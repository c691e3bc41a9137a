// ABOUTME: HTTP integration tests for instructor credential routes
// ABOUTME: Covers issuing rules, filtered listing and revocation demotion
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use uuid::Uuid;

use dojo_server::models::{InstructorCredential, Role};
use dojo_server::routes;

#[tokio::test]
async fn test_issue_credential_rules() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let admin = common::create_user(db, "Reila", "reila@dojo.test", Role::Admin).await?;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;

    let app = routes::router(resources.clone());
    let admin_auth = common::bearer_token(&resources, &admin);

    // Admin only
    let response = AxumTestRequest::post("/api/credentials")
        .header(
            "authorization",
            &common::bearer_token(&resources, &instructor),
        )
        .json(&json!({ "code": "123456789" }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 403);

    // Malformed codes
    for code in ["12345678", "1234567890", "12345678a"] {
        let response = AxumTestRequest::post("/api/credentials")
            .header("authorization", &admin_auth)
            .json(&json!({ "code": code }))
            .send(app.clone())
            .await;
        assert_eq!(response.status(), 400);
    }

    let response = AxumTestRequest::post("/api/credentials")
        .header("authorization", &admin_auth)
        .json(&json!({ "code": "123456789" }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);

    // Duplicate code
    let response = AxumTestRequest::post("/api/credentials")
        .header("authorization", &admin_auth)
        .json(&json!({ "code": "123456789" }))
        .send(app)
        .await;
    assert_eq!(response.status(), 409);

    Ok(())
}

#[tokio::test]
async fn test_list_credentials_with_filters() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let admin = common::create_user(db, "Reila", "reila@dojo.test", Role::Admin).await?;

    let unused = InstructorCredential::new("111111111".into());
    db.create_credential(&unused).await?;
    let used = InstructorCredential::new("222222222".into());
    db.create_credential(&used).await?;
    db.mark_credential_used(used.id, admin.id).await?;

    let app = routes::router(resources.clone());
    let auth = common::bearer_token(&resources, &admin);

    let all = AxumTestRequest::get("/api/credentials")
        .header("authorization", &auth)
        .send(app.clone())
        .await;
    let all: Value = all.json();
    assert_eq!(all["total_count"], 2);

    let used_only = AxumTestRequest::get("/api/credentials?is_used=true")
        .header("authorization", &auth)
        .send(app.clone())
        .await;
    let used_only: Value = used_only.json();
    assert_eq!(used_only["total_count"], 1);
    assert_eq!(used_only["items"][0]["code"], "222222222");

    let searched = AxumTestRequest::get("/api/credentials?search=111")
        .header("authorization", &auth)
        .send(app)
        .await;
    let searched: Value = searched.json();
    assert_eq!(searched["total_count"], 1);
    assert_eq!(searched["items"][0]["code"], "111111111");

    Ok(())
}

#[tokio::test]
async fn test_get_credential() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let credential = InstructorCredential::new("333333333".into());
    db.create_credential(&credential).await?;

    let app = routes::router(resources.clone());
    let auth = common::bearer_token(&resources, &instructor);

    let response = AxumTestRequest::get(&format!("/api/credentials/{}", credential.id))
        .header("authorization", &auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["code"], "333333333");

    let response = AxumTestRequest::get(&format!("/api/credentials/{}", Uuid::new_v4()))
        .header("authorization", &auth)
        .send(app)
        .await;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_delete_used_credential_demotes_user() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let admin = common::create_user(db, "Reila", "reila@dojo.test", Role::Admin).await?;

    // Register an instructor through a credential, then revoke it
    let credential = InstructorCredential::new("444444444".into());
    db.create_credential(&credential).await?;

    let app = routes::router(resources.clone());
    let registered = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "name": "Carlson",
            "email": "carlson@dojo.test",
            "password": "password123",
            "confirm_password": "password123",
            "credential_code": "444444444",
        }))
        .send(app.clone())
        .await;
    assert_eq!(registered.status(), 201);
    let registered: Value = registered.json();
    let user_id: Uuid = registered["user"]["id"].as_str().unwrap().parse()?;

    let response = AxumTestRequest::delete(&format!("/api/credentials/{}", credential.id))
        .header("authorization", &common::bearer_token(&resources, &admin))
        .send(app)
        .await;
    assert_eq!(response.status(), 204);

    let user = db.get_user(user_id).await?.unwrap();
    assert_eq!(user.role, Role::Athlete);
    assert!(db.get_credential(credential.id).await?.is_none());

    Ok(())
}
