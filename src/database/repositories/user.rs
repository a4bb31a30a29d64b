use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Device, User, UserInput};

pub async fn create_user(
    conn: &mut SqliteConnection,
    input: UserInput,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO
                users (id, account, name, default_work_pattern_id, created_at)
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING
                id,
                account,
                name,
                default_work_pattern_id,
                created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.account)
    .bind(input.name)
    .bind(input.default_work_pattern_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(user)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
            SELECT
                id,
                account,
                name,
                default_work_pattern_id,
                created_at
            FROM
                users
            WHERE
                id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_account(
    conn: &mut SqliteConnection,
    account: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
            SELECT
                id,
                account,
                name,
                default_work_pattern_id,
                created_at
            FROM
                users
            WHERE
                account = ?
        "#,
    )
    .bind(account)
    .fetch_optional(conn)
    .await
}

pub async fn create_device(
    conn: &mut SqliteConnection,
    account: &str,
    name: &str,
) -> Result<Device, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
            INSERT INTO
                devices (id, account, name, created_at)
            VALUES
                (?, ?, ?, ?)
            RETURNING
                id,
                account,
                name,
                created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account)
    .bind(name)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn find_device_by_account(
    conn: &mut SqliteConnection,
    account: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        r#"
            SELECT
                id,
                account,
                name,
                created_at
            FROM
                devices
            WHERE
                account = ?
        "#,
    )
    .bind(account)
    .fetch_optional(conn)
    .await
}
