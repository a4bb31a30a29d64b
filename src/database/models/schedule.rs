use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub apply_id: Option<Uuid>,
    pub is_paid: bool,
    pub break_minutes: Option<i64>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-day work pattern override. `work_pattern_id = None` is a full-day absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserWorkPatternCalendar {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub work_pattern_id: Option<Uuid>,
    pub leave_rate: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Input to schedule projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePlan {
    pub actor: Uuid,
    pub user_id: Uuid,
    pub apply_id: Option<Uuid>,
    pub work_pattern_id: Option<Uuid>,
    pub date_from: NaiveDate,
    pub date_to: Option<NaiveDate>,
    pub leave_rate: Option<f64>,
    #[serde(default)]
    pub is_paid: bool,
    pub break_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}
