use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{WorkPattern, WorkPatternInput};

pub async fn create_work_pattern(
    conn: &mut SqliteConnection,
    input: WorkPatternInput,
) -> Result<WorkPattern, sqlx::Error> {
    sqlx::query_as::<_, WorkPattern>(
        r#"
            INSERT INTO
                work_patterns (id, name, start_time, end_time, break_minutes, created_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                name,
                start_time,
                end_time,
                break_minutes,
                created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.name)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.break_minutes)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<WorkPattern>, sqlx::Error> {
    sqlx::query_as::<_, WorkPattern>(
        r#"
            SELECT
                id,
                name,
                start_time,
                end_time,
                break_minutes,
                created_at
            FROM
                work_patterns
            WHERE
                id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<WorkPattern>, sqlx::Error> {
    sqlx::query_as::<_, WorkPattern>(
        r#"
            SELECT
                id,
                name,
                start_time,
                end_time,
                break_minutes,
                created_at
            FROM
                work_patterns
            WHERE
                name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(conn)
    .await
}
