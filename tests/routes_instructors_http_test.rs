// ABOUTME: HTTP integration tests for instructor directory routes
// ABOUTME: Covers the public listing, join flow and admin removal
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::Value;
use uuid::Uuid;

use dojo_server::models::{Belt, Role};
use dojo_server::routes;

#[tokio::test]
async fn test_public_listing_needs_no_token() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    common::create_user(
        &resources.database,
        "Carlos",
        "carlos@dojo.test",
        Role::Instructor,
    )
    .await?;

    let app = routes::router(resources);
    let response = AxumTestRequest::get("/api/instructors/public").send(app).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body[0]["name"], "Carlos");
    // The public projection carries no contact details
    assert!(body[0].get("email").is_none());

    Ok(())
}

#[tokio::test]
async fn test_authenticated_listing_is_paginated() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    common::create_user(db, "Helio", "helio@dojo.test", Role::Instructor).await?;
    let athlete = common::create_user(db, "Royce", "royce@dojo.test", Role::Athlete).await?;

    let app = routes::router(resources.clone());

    let unauthenticated = AxumTestRequest::get("/api/instructors").send(app.clone()).await;
    assert_eq!(unauthenticated.status(), 401);

    let response = AxumTestRequest::get("/api/instructors?page=1&page_size=1")
        .header("authorization", &common::bearer_token(&resources, &athlete))
        .send(app)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_join_instructor_flow() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let athlete = common::create_athlete(db, "Royce", "royce@dojo.test", Belt::White, None).await?;

    let app = routes::router(resources.clone());
    let athlete_auth = common::bearer_token(&resources, &athlete);

    // Joining a non-instructor target fails
    let response = AxumTestRequest::post(&format!("/api/instructors/{}/join", Uuid::new_v4()))
        .header("authorization", &athlete_auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 404);

    // Instructors cannot join anyone
    let response = AxumTestRequest::post(&format!("/api/instructors/{}/join", instructor.id))
        .header(
            "authorization",
            &common::bearer_token(&resources, &instructor),
        )
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 403);

    let response = AxumTestRequest::post(&format!("/api/instructors/{}/join", instructor.id))
        .header("authorization", &athlete_auth)
        .send(app)
        .await;
    assert_eq!(response.status(), 200);

    let stored = db.get_user(athlete.id).await?.unwrap();
    assert_eq!(stored.instructor_id, Some(instructor.id));

    Ok(())
}

#[tokio::test]
async fn test_delete_instructor_unlinks_athletes() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let admin = common::create_user(db, "Reila", "reila@dojo.test", Role::Admin).await?;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let athlete = common::create_athlete(
        db,
        "Royce",
        "royce@dojo.test",
        Belt::White,
        Some(instructor.id),
    )
    .await?;

    let app = routes::router(resources.clone());
    let admin_auth = common::bearer_token(&resources, &admin);

    // Deleting an athlete through this route is a 404
    let response = AxumTestRequest::delete(&format!("/api/instructors/{}", athlete.id))
        .header("authorization", &admin_auth)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::delete(&format!("/api/instructors/{}", instructor.id))
        .header("authorization", &admin_auth)
        .send(app)
        .await;
    assert_eq!(response.status(), 204);

    assert!(db.get_user(instructor.id).await?.is_none());
    let stored = db.get_user(athlete.id).await?.unwrap();
    assert!(stored.instructor_id.is_none());

    Ok(())
}
