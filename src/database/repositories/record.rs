use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Punch, Record};

const RECORD_COLUMNS: &str = r#"
    id,
    user_id,
    date,
    clockin,
    clockin_device_id,
    clockin_apply_id,
    stepout,
    stepout_device_id,
    stepout_apply_id,
    reenter,
    reenter_device_id,
    reenter_apply_id,
    clockout,
    clockout_device_id,
    clockout_apply_id,
    created_at,
    updated_at
"#;

/// Whether the user has a clock-in on record for `date`.
pub async fn has_clockin(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let clockin = sqlx::query_scalar::<_, Option<NaiveDateTime>>(
        "SELECT clockin FROM records WHERE user_id = ? AND date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(conn)
    .await?;

    Ok(clockin.flatten().is_some())
}

/// Write one punch slot of the `(user, date)` row, creating the row if needed.
/// Other slots are left as they are.
pub async fn upsert_punch(
    conn: &mut SqliteConnection,
    punch: &Punch,
    date: NaiveDate,
) -> Result<Record, sqlx::Error> {
    let (punch_col, device_col, apply_col) = punch.record_type.columns();
    let query = format!(
        r#"
            INSERT INTO
                records (
                    id, user_id, date, {punch_col}, {device_col}, {apply_col},
                    created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, date) DO UPDATE SET
                {punch_col} = excluded.{punch_col},
                {device_col} = excluded.{device_col},
                {apply_col} = excluded.{apply_col},
                updated_at = excluded.updated_at
            RETURNING {RECORD_COLUMNS}
        "#
    );
    let now = Utc::now();

    sqlx::query_as::<_, Record>(&query)
        .bind(Uuid::new_v4())
        .bind(punch.user_id)
        .bind(date)
        .bind(punch.timestamp)
        .bind(punch.device_id)
        .bind(punch.apply_id)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
}

pub async fn find_record(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<Record>, sqlx::Error> {
    let query = format!("SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ? AND date = ?");

    sqlx::query_as::<_, Record>(&query)
        .bind(user_id)
        .bind(date)
        .fetch_optional(conn)
        .await
}

pub async fn records_in_range(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Record>, sqlx::Error> {
    let query = format!(
        "SELECT {RECORD_COLUMNS} FROM records \
         WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date"
    );

    sqlx::query_as::<_, Record>(&query)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await
}

/// Record type names known to the database, keyed by id.
pub async fn load_record_types(
    conn: &mut SqliteConnection,
) -> Result<Vec<(i64, String)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM record_types ORDER BY id")
        .fetch_all(conn)
        .await
}

