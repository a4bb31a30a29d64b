use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Holiday, Schedule, SchedulePlan, UserWorkPatternCalendar};

/// Insert or replace the schedule row for one user-day.
pub async fn upsert_schedule(
    conn: &mut SqliteConnection,
    plan: &SchedulePlan,
    date: NaiveDate,
) -> Result<Schedule, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(
        r#"
            INSERT INTO
                schedules (
                    id, user_id, date, apply_id, is_paid, break_minutes, created_by, created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET
                apply_id = excluded.apply_id,
                is_paid = excluded.is_paid,
                break_minutes = excluded.break_minutes,
                created_by = excluded.created_by,
                created_at = excluded.created_at
            RETURNING
                id,
                user_id,
                date,
                apply_id,
                is_paid,
                break_minutes,
                created_by,
                created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(plan.user_id)
    .bind(date)
    .bind(plan.apply_id)
    .bind(plan.is_paid)
    .bind(plan.break_minutes)
    .bind(plan.actor)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

/// Set the day's work pattern outright. `None` marks a full-day absence.
pub async fn set_calendar_pattern(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
    work_pattern_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO
                user_work_pattern_calendars (user_id, date, work_pattern_id, leave_rate, updated_at)
            VALUES
                (?, ?, ?, NULL, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET
                work_pattern_id = excluded.work_pattern_id,
                leave_rate = NULL,
                updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(work_pattern_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

/// Record a partial-day absence, keeping the day's pattern. A day with no
/// calendar row takes the user's default pattern.
pub async fn set_calendar_leave_rate(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
    leave_rate: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO
                user_work_pattern_calendars (user_id, date, work_pattern_id, leave_rate, updated_at)
            VALUES
                (?, ?, (SELECT default_work_pattern_id FROM users WHERE id = ?), ?, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET
                leave_rate = excluded.leave_rate,
                updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(user_id)
    .bind(leave_rate)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn schedules_in_range(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(
        r#"
            SELECT
                id,
                user_id,
                date,
                apply_id,
                is_paid,
                break_minutes,
                created_by,
                created_at
            FROM
                schedules
            WHERE
                user_id = ?
                AND date BETWEEN ? AND ?
            ORDER BY
                date
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

pub async fn calendars_in_range(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<UserWorkPatternCalendar>, sqlx::Error> {
    sqlx::query_as::<_, UserWorkPatternCalendar>(
        r#"
            SELECT
                user_id,
                date,
                work_pattern_id,
                leave_rate,
                updated_at
            FROM
                user_work_pattern_calendars
            WHERE
                user_id = ?
                AND date BETWEEN ? AND ?
            ORDER BY
                date
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

pub async fn add_holiday(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO holidays (date, name) VALUES (?, ?)")
        .bind(date)
        .bind(name)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn holidays_in_range(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Holiday>, sqlx::Error> {
    sqlx::query_as::<_, Holiday>(
        "SELECT date, name FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date",
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}
