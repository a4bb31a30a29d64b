use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{ApprovalRoute, ApprovalRouteInput};

const ROUTE_COLUMNS: &str = r#"
    id,
    name,
    level1_main_user_id,
    level1_sub_user_id,
    level2_main_user_id,
    level2_sub_user_id,
    level3_main_user_id,
    level3_sub_user_id,
    decision_user_id,
    created_at
"#;

/// Insert a route. Callers check [`ApprovalRouteInput::has_approver`] first.
pub async fn create_route(
    conn: &mut SqliteConnection,
    input: ApprovalRouteInput,
) -> Result<ApprovalRoute, sqlx::Error> {
    let query = format!(
        r#"
            INSERT INTO
                approval_routes (
                    id,
                    name,
                    level1_main_user_id,
                    level1_sub_user_id,
                    level2_main_user_id,
                    level2_sub_user_id,
                    level3_main_user_id,
                    level3_sub_user_id,
                    decision_user_id,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {ROUTE_COLUMNS}
        "#
    );

    sqlx::query_as::<_, ApprovalRoute>(&query)
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.level1_main_user_id)
        .bind(input.level1_sub_user_id)
        .bind(input.level2_main_user_id)
        .bind(input.level2_sub_user_id)
        .bind(input.level3_main_user_id)
        .bind(input.level3_sub_user_id)
        .bind(input.decision_user_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ApprovalRoute>, sqlx::Error> {
    let query = format!("SELECT {ROUTE_COLUMNS} FROM approval_routes WHERE id = ?");

    sqlx::query_as::<_, ApprovalRoute>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<ApprovalRoute>, sqlx::Error> {
    let query = format!("SELECT {ROUTE_COLUMNS} FROM approval_routes WHERE name = ?");

    sqlx::query_as::<_, ApprovalRoute>(&query)
        .bind(name)
        .fetch_optional(conn)
        .await
}
