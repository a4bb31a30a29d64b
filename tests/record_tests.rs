use attendance::database::models::*;
use attendance::error::AppError;
use attendance::services::RecordTypeRegistry;
use pretty_assertions::assert_eq;

mod common;

use common::{TestContext, at, date};

fn punch_at(timestamp: chrono::NaiveDateTime) -> RecordInput {
    RecordInput {
        timestamp: Some(timestamp),
        ..Default::default()
    }
}

#[tokio::test]
async fn overnight_punches_attach_to_the_shift_start() {
    // Arrange
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let service = &ctx.state.record_service;
    let d = date(2024, 5, 1);
    let next = date(2024, 5, 2);

    // Act
    service
        .submit_record(user.id, "clockin", punch_at(at(d, 22, 0)))
        .await
        .unwrap();
    let stepout = service
        .submit_record(user.id, "stepout", punch_at(at(next, 2, 0)))
        .await
        .unwrap();
    let clockout = service
        .submit_record(user.id, "clockout", punch_at(at(next, 6, 0)))
        .await
        .unwrap();

    // Assert
    assert_eq!(stepout.date, d);
    assert_eq!(clockout.date, d);
    assert_eq!(clockout.clockin, Some(at(d, 22, 0)));
    assert_eq!(clockout.stepout, Some(at(next, 2, 0)));
    assert_eq!(clockout.clockout, Some(at(next, 6, 0)));
    assert!(service.get_record(user.id, next).await.unwrap().is_none());
}

#[tokio::test]
async fn a_clockin_on_the_next_day_takes_over() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let service = &ctx.state.record_service;
    let d = date(2024, 5, 1);
    let next = date(2024, 5, 2);

    service
        .submit_record(user.id, "clockin", punch_at(at(d, 9, 0)))
        .await
        .unwrap();
    let clockin = service
        .submit_record(user.id, "clockin", punch_at(at(next, 9, 0)))
        .await
        .unwrap();
    let clockout = service
        .submit_record(user.id, "clockout", punch_at(at(next, 18, 0)))
        .await
        .unwrap();

    assert_eq!(clockin.date, next);
    assert_eq!(clockout.date, next);
    let first_day = service.get_record(user.id, d).await.unwrap().unwrap();
    assert_eq!(first_day.clockout, None);
}

#[tokio::test]
async fn punches_without_an_open_shift_land_on_their_own_day() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let d = date(2024, 5, 3);

    let record = ctx
        .state
        .record_service
        .submit_record(user.id, "clockout", punch_at(at(d, 1, 30)))
        .await
        .unwrap();

    assert_eq!(record.date, d);
    assert_eq!(record.clockin, None);
    assert_eq!(record.clockout, Some(at(d, 1, 30)));
}

#[tokio::test]
async fn upsert_only_touches_the_posted_slot() {
    // Arrange
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let device = ctx.create_device("terminal-1").await;
    let service = &ctx.state.record_service;
    let d = date(2024, 5, 6);

    let mut clockin = punch_at(at(d, 8, 58));
    clockin.device_account = Some("terminal-1".to_string());
    service.submit_record(user.id, "clockin", clockin).await.unwrap();

    // Act
    let record = service
        .submit_record(user.id, "stepout", punch_at(at(d, 12, 0)))
        .await
        .unwrap();
    let record_again = service
        .submit_record(user.id, "stepout", punch_at(at(d, 12, 10)))
        .await
        .unwrap();

    // Assert
    assert_eq!(record.clockin, Some(at(d, 8, 58)));
    assert_eq!(record.clockin_device_id, Some(device.id));
    assert_eq!(record.stepout_device_id, None);
    assert_eq!(record_again.id, record.id);
    assert_eq!(record_again.stepout, Some(at(d, 12, 10)));
    assert_eq!(record_again.clockin, Some(at(d, 8, 58)));
    assert_eq!(ctx.count("records").await, 1);
}

#[tokio::test]
async fn target_account_posts_for_another_user() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let clerk = ctx.create_user(None).await;
    let worker = ctx.create_user(None).await;
    let d = date(2024, 5, 7);

    let mut input = punch_at(at(d, 9, 0));
    input.target_account = Some(worker.account.clone());
    let record = ctx
        .state
        .record_service
        .submit_record(clerk.id, "clockin", input)
        .await
        .unwrap();

    assert_eq!(record.user_id, worker.id);
    assert!(ctx.state.record_service.get_record(clerk.id, d).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_references_fail_hard() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let service = &ctx.state.record_service;
    let d = date(2024, 5, 8);

    let result = service.submit_record(user.id, "lunch", punch_at(at(d, 12, 0))).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let mut unknown_device = punch_at(at(d, 9, 0));
    unknown_device.device_account = Some("terminal-404".to_string());
    let result = service.submit_record(user.id, "clockin", unknown_device).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let mut unknown_user = punch_at(at(d, 9, 0));
    unknown_user.target_account = Some("ghost".to_string());
    let result = service.submit_record(user.id, "clockin", unknown_user).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    assert_eq!(ctx.count("records").await, 0);
}

#[tokio::test]
async fn registry_is_loaded_from_the_database_and_injectable() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;

    let loaded = RecordTypeRegistry::load(&ctx.pool).await.unwrap();
    for record_type in RecordType::ALL {
        assert_eq!(loaded.resolve(record_type.as_str()).unwrap(), *record_type);
    }

    let state = ctx.state_with_registry(RecordTypeRegistry::from_types([RecordType::Clockin]));
    let result = state
        .record_service
        .submit_record(user.id, "clockout", punch_at(at(date(2024, 5, 9), 18, 0)))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_punches_from_different_users_all_land() {
    // Arrange
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let d = date(2024, 5, 20);
    let mut users = Vec::new();
    for _ in 0..16 {
        users.push(ctx.create_user(None).await);
    }

    // Act
    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let service = ctx.state.record_service.clone();
            let user_id = user.id;
            tokio::spawn(async move {
                service
                    .submit_record(user_id, "clockin", punch_at(at(d, 9, 0)))
                    .await?;
                service
                    .submit_record(user_id, "stepout", punch_at(at(d, 12, 0)))
                    .await
            })
        })
        .collect();

    // Assert
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok(), "punch failed: {:?}", result.err());
    }
    assert_eq!(ctx.count("records").await, 16);
    for user in &users {
        let record = ctx.state.record_service.get_record(user.id, d).await.unwrap().unwrap();
        assert_eq!(record.clockin, Some(at(d, 9, 0)));
        assert_eq!(record.stepout, Some(at(d, 12, 0)));
    }
}
