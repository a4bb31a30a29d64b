use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{
    Apply, ApplyOption, ApplyOptionInput, ApplyRow, ApprovalLevel, ApprovalState, ApprovalStatus,
};

const APPLY_COLUMNS: &str = r#"
    id,
    apply_type,
    target_user_id,
    applied_by,
    applied_at,
    date,
    date_time_from,
    date_time_to,
    date_related,
    reason,
    contact,
    route_id,
    work_pattern_id,
    status,
    current_level,
    approved_level1_user_id,
    approved_level1_at,
    approved_level2_user_id,
    approved_level2_at,
    approved_level3_user_id,
    approved_level3_at,
    approved_decision_user_id,
    approved_decision_at,
    rejected_by,
    rejected_level,
    rejected_at,
    updated_at
"#;

fn into_apply(row: ApplyRow) -> Result<Apply, sqlx::Error> {
    Apply::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
}

/// Insert a freshly submitted (pending) apply.
pub async fn insert_apply(conn: &mut SqliteConnection, apply: &Apply) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO
                applies (
                    id,
                    apply_type,
                    target_user_id,
                    applied_by,
                    applied_at,
                    date,
                    date_time_from,
                    date_time_to,
                    date_related,
                    reason,
                    contact,
                    route_id,
                    work_pattern_id,
                    status,
                    current_level,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(apply.id)
    .bind(apply.apply_type)
    .bind(apply.target_user_id)
    .bind(apply.applied_by)
    .bind(apply.applied_at)
    .bind(apply.date)
    .bind(apply.date_time_from)
    .bind(apply.date_time_to)
    .bind(apply.date_related)
    .bind(&apply.reason)
    .bind(&apply.contact)
    .bind(apply.route_id)
    .bind(apply.work_pattern_id)
    .bind(apply.state.status())
    .bind(apply.state.pending_level())
    .bind(apply.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn find_apply(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<Apply>, sqlx::Error> {
    let query = format!("SELECT {APPLY_COLUMNS} FROM applies WHERE id = ?");

    let row = sqlx::query_as::<_, ApplyRow>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.map(into_apply).transpose()
}

/// Persist a state transition as a compare-and-set against the level the
/// transition was computed from. Returns `false` if another writer got there first.
pub async fn update_approval_state(
    conn: &mut SqliteConnection,
    apply: &Apply,
    expected_level: ApprovalLevel,
) -> Result<bool, sqlx::Error> {
    let (rejected_by, rejected_level, rejected_at) = match apply.state {
        ApprovalState::Rejected { by, level, at } => (Some(by), Some(level), Some(at)),
        _ => (None, None, None),
    };
    let stamps = &apply.approvals;

    let result = sqlx::query(
        r#"
            UPDATE
                applies
            SET
                status = ?,
                current_level = ?,
                approved_level1_user_id = ?,
                approved_level1_at = ?,
                approved_level2_user_id = ?,
                approved_level2_at = ?,
                approved_level3_user_id = ?,
                approved_level3_at = ?,
                approved_decision_user_id = ?,
                approved_decision_at = ?,
                rejected_by = ?,
                rejected_level = ?,
                rejected_at = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status = ?
                AND current_level = ?
        "#,
    )
    .bind(apply.state.status())
    .bind(apply.state.pending_level())
    .bind(stamps.level1.map(|s| s.user_id))
    .bind(stamps.level1.map(|s| s.at))
    .bind(stamps.level2.map(|s| s.user_id))
    .bind(stamps.level2.map(|s| s.at))
    .bind(stamps.level3.map(|s| s.user_id))
    .bind(stamps.level3.map(|s| s.at))
    .bind(stamps.decision.map(|s| s.user_id))
    .bind(stamps.decision.map(|s| s.at))
    .bind(rejected_by)
    .bind(rejected_level)
    .bind(rejected_at)
    .bind(apply.updated_at)
    .bind(apply.id)
    .bind(ApprovalStatus::Pending)
    .bind(expected_level)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn option_value_exists(
    conn: &mut SqliteConnection,
    option_type: &str,
    option_value: &str,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
            SELECT
                COUNT(*)
            FROM
                apply_option_values
            WHERE
                option_type = ?
                AND option_value = ?
        "#,
    )
    .bind(option_type)
    .bind(option_value)
    .fetch_one(conn)
    .await?;

    Ok(count > 0)
}

pub async fn insert_option(
    conn: &mut SqliteConnection,
    apply_id: Uuid,
    option: &ApplyOptionInput,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO
                apply_options (apply_id, option_type, option_value)
            VALUES
                (?, ?, ?)
        "#,
    )
    .bind(apply_id)
    .bind(&option.option_type)
    .bind(&option.option_value)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_options(
    conn: &mut SqliteConnection,
    apply_id: Uuid,
) -> Result<Vec<ApplyOption>, sqlx::Error> {
    sqlx::query_as::<_, ApplyOption>(
        r#"
            SELECT
                apply_id,
                option_type,
                option_value
            FROM
                apply_options
            WHERE
                apply_id = ?
            ORDER BY
                option_type
        "#,
    )
    .bind(apply_id)
    .fetch_all(conn)
    .await
}

pub async fn get_option_value(
    conn: &mut SqliteConnection,
    apply_id: Uuid,
    option_type: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
            SELECT
                option_value
            FROM
                apply_options
            WHERE
                apply_id = ?
                AND option_type = ?
        "#,
    )
    .bind(apply_id)
    .bind(option_type)
    .fetch_optional(conn)
    .await
}
