use attendance::database::models::*;
use attendance::error::AppError;
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
async fn report_combines_patterns_holidays_absences_and_punches() {
    // Arrange
    common::setup_test_env();
    let ctx = TestContext::with_rounding(15).await.unwrap();
    let regular = ctx.create_pattern("regular", (9, 0), (18, 0)).await;
    let user = ctx.create_user(Some(regular.id)).await;
    let (worked, holiday, absent) = (date(2024, 7, 1), date(2024, 7, 2), date(2024, 7, 3));

    let records = &ctx.state.record_service;
    records
        .submit_record(user.id, "clockin", punch_at(at(worked, 8, 55)))
        .await
        .unwrap();
    records
        .submit_record(user.id, "clockout", punch_at(at(worked, 18, 10)))
        .await
        .unwrap();
    ctx.add_holiday(holiday, "Founders' day").await;
    ctx.state
        .schedule_service
        .add_schedules(SchedulePlan {
            actor: user.id,
            user_id: user.id,
            apply_id: None,
            work_pattern_id: None,
            date_from: absent,
            date_to: None,
            leave_rate: None,
            is_paid: true,
            break_minutes: None,
        })
        .await
        .unwrap();

    // Act
    let days = ctx
        .state
        .attendance_service
        .get_attendance_by_account(&user.account, worked, absent)
        .await
        .unwrap();

    // Assert
    assert_eq!(days.len(), 3);

    let day = &days[0];
    assert!(day.is_working_day);
    assert_eq!(day.work_pattern_id, Some(regular.id));
    assert_eq!(day.clockin, Some(at(worked, 9, 0)));
    assert_eq!(day.clockout, Some(at(worked, 18, 0)));
    assert_eq!(day.start_delta_minutes, Some(0));
    assert_eq!(day.end_delta_minutes, Some(0));
    assert_eq!(day.worked_minutes, Some(8 * 60));

    assert!(days[1].is_holiday);
    assert!(!days[1].is_working_day);
    assert_eq!(days[1].on_time_start, None);

    assert!(!days[2].is_holiday);
    assert!(!days[2].is_working_day);
    assert_eq!(days[2].work_pattern_id, None);
}

#[tokio::test]
async fn overnight_shift_deltas_use_the_next_day_end() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let night = ctx.create_pattern("night", (22, 0), (6, 0)).await;
    let user = ctx.create_user(Some(night.id)).await;
    let (d, next) = (date(2024, 7, 8), date(2024, 7, 9));

    let records = &ctx.state.record_service;
    records
        .submit_record(user.id, "clockin", punch_at(at(d, 22, 5)))
        .await
        .unwrap();
    records
        .submit_record(user.id, "clockout", punch_at(at(next, 6, 0)))
        .await
        .unwrap();

    let days = ctx
        .state
        .attendance_service
        .get_attendance(user.id, d, d)
        .await
        .unwrap();

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].on_time_end, Some(at(next, 6, 0)));
    assert_eq!(days[0].start_delta_minutes, Some(-5));
    assert_eq!(days[0].end_delta_minutes, Some(0));
    assert_eq!(days[0].worked_minutes, Some(7 * 60 + 55 - 60));
}

#[tokio::test]
async fn bad_queries_are_refused() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(None).await;
    let service = &ctx.state.attendance_service;

    let inverted = service
        .get_attendance(user.id, date(2024, 7, 10), date(2024, 7, 9))
        .await;
    assert!(matches!(inverted, Err(AppError::BadRequest(_))));

    let too_long = service
        .get_attendance(user.id, date(2023, 1, 1), date(2024, 7, 9))
        .await;
    assert!(matches!(too_long, Err(AppError::BadRequest(_))));

    let unknown = service
        .get_attendance_by_account("ghost", date(2024, 7, 1), date(2024, 7, 2))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}
