// ABOUTME: Integration tests for the sqlx storage layer
// ABOUTME: Round-trips domain values through a file-backed SQLite database
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use chrono::Utc;
use uuid::Uuid;

use dojo_server::database::Database;
use dojo_server::models::{Belt, Exam, ExamSession, InstructorCredential, Role};

#[tokio::test]
async fn test_file_database_is_created_on_demand() -> anyhow::Result<()> {
    common::init_test_logging();
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}/dojo.db", dir.path().display());

    let database = Database::new(&url).await?;
    let user = common::create_user(&database, "Helio", "helio@dojo.test", Role::Athlete).await?;

    // A second connection to the same file sees the data
    let reopened = Database::new(&url).await?;
    let stored = reopened.get_user(user.id).await?.unwrap();
    assert_eq!(stored.email, "helio@dojo.test");
    assert_eq!(stored.belt, Belt::White);

    Ok(())
}

#[tokio::test]
async fn test_user_round_trip_preserves_fields() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;

    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let athlete = common::create_athlete(
        db,
        "Royce",
        "royce@dojo.test",
        Belt::Purple,
        Some(instructor.id),
    )
    .await?;

    let stored = db.get_user(athlete.id).await?.unwrap();
    assert_eq!(stored.name, "Royce");
    assert_eq!(stored.role, Role::Athlete);
    assert_eq!(stored.belt, Belt::Purple);
    assert_eq!(stored.instructor_id, Some(instructor.id));
    assert!(!stored.suspended);

    let by_email = db.get_user_by_email("royce@dojo.test").await?.unwrap();
    assert_eq!(by_email.id, athlete.id);
    assert!(db.get_user_by_email("missing@dojo.test").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_insert_fails() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;

    common::create_user(db, "Helio", "same@dojo.test", Role::Athlete).await?;
    let duplicate = common::create_user(db, "Carlos", "same@dojo.test", Role::Athlete).await;
    assert!(duplicate.is_err());

    Ok(())
}

#[tokio::test]
async fn test_exam_belt_levels_round_trip() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;

    let now = Utc::now();
    let exam = Exam {
        id: Uuid::new_v4(),
        name: "Summer graduation".into(),
        exam_date: now,
        belt_levels: vec![Belt::Purple, Belt::Brown],
        max_participants: 12,
        created_by: instructor.id,
        created_at: now,
        updated_at: now,
    };
    db.create_exam(&exam).await?;

    let stored = db.get_exam(exam.id).await?.unwrap();
    assert_eq!(stored.belt_levels, vec![Belt::Purple, Belt::Brown]);
    assert_eq!(stored.final_belt(), Some(Belt::Brown));
    assert_eq!(stored.max_participants, 12);

    Ok(())
}

#[tokio::test]
async fn test_exam_delete_removes_children() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let athlete = common::create_user(db, "Royce", "royce@dojo.test", Role::Athlete).await?;

    let now = Utc::now();
    let exam = Exam {
        id: Uuid::new_v4(),
        name: "Summer graduation".into(),
        exam_date: now,
        belt_levels: vec![Belt::White, Belt::Blue],
        max_participants: 10,
        created_by: instructor.id,
        created_at: now,
        updated_at: now,
    };
    db.create_exam(&exam).await?;

    let session = ExamSession {
        id: Uuid::new_v4(),
        exam_id: exam.id,
        date: now,
        time: "19:30".into(),
        location: "Main mat".into(),
        max_participants: 10,
        participants: Vec::new(),
    };
    db.create_session(&session).await?;
    db.register_participant(session.id, athlete.id).await?;

    // Another instructor cannot delete it
    assert!(!db.delete_exam(exam.id, Uuid::new_v4()).await?);

    assert!(db.delete_exam(exam.id, instructor.id).await?);
    assert!(db.get_exam(exam.id).await?.is_none());
    assert!(db.get_session(session.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_session_participants_are_counted() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let instructor = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let a = common::create_user(db, "Royce", "royce@dojo.test", Role::Athlete).await?;
    let b = common::create_user(db, "Rickson", "rickson@dojo.test", Role::Athlete).await?;

    let now = Utc::now();
    let exam = Exam {
        id: Uuid::new_v4(),
        name: "Summer graduation".into(),
        exam_date: now,
        belt_levels: vec![Belt::White, Belt::Blue],
        max_participants: 10,
        created_by: instructor.id,
        created_at: now,
        updated_at: now,
    };
    db.create_exam(&exam).await?;

    let session = ExamSession {
        id: Uuid::new_v4(),
        exam_id: exam.id,
        date: now,
        time: "19:30".into(),
        location: "Main mat".into(),
        max_participants: 2,
        participants: Vec::new(),
    };
    db.create_session(&session).await?;

    db.register_participant(session.id, a.id).await?;
    db.register_participant(session.id, b.id).await?;

    let stored = db.get_session(session.id).await?.unwrap();
    assert_eq!(stored.participants.len(), 2);
    assert!(!stored.has_capacity());
    assert!(stored.is_registered(a.id));

    assert!(db.is_exam_participant(exam.id, a.id).await?);
    assert_eq!(db.list_exam_participants(exam.id).await?.len(), 2);

    assert!(db.unregister_participant(session.id, a.id).await?);
    assert!(!db.unregister_participant(session.id, a.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_credential_is_consumed_exactly_once() -> anyhow::Result<()> {
    let resources = common::create_test_resources().await?;
    let db = &resources.database;
    let first = common::create_user(db, "Carlos", "carlos@dojo.test", Role::Instructor).await?;
    let second = common::create_user(db, "Helio", "helio@dojo.test", Role::Instructor).await?;

    let credential = InstructorCredential::new("123456789".into());
    db.create_credential(&credential).await?;

    assert!(db.mark_credential_used(credential.id, first.id).await?);
    assert!(!db.mark_credential_used(credential.id, second.id).await?);

    let stored = db.get_credential(credential.id).await?.unwrap();
    assert_eq!(stored.used_by, Some(first.id));

    Ok(())
}
