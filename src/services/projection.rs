use sqlx::{SqliteConnection, SqlitePool};

use crate::database::{
    DatabaseTransaction,
    models::{Schedule, SchedulePlan},
    repositories::schedule as schedule_repo,
};
use crate::error::AppError;

/// Materialize a plan into one schedule row and one calendar row per day.
///
/// An explicit work pattern wins. Without one, a leave rate shrinks the
/// day's pattern, and a plan with neither is a full-day absence.
pub async fn add_schedules(
    conn: &mut SqliteConnection,
    plan: &SchedulePlan,
) -> Result<Vec<Schedule>, AppError> {
    let date_to = plan.date_to.unwrap_or(plan.date_from);
    if date_to < plan.date_from {
        return Err(AppError::BadRequest(format!(
            "Schedule range ends ({}) before it starts ({})",
            date_to, plan.date_from
        )));
    }

    let mut schedules = Vec::new();
    for date in plan.date_from.iter_days().take_while(|date| *date <= date_to) {
        let schedule = schedule_repo::upsert_schedule(conn, plan, date).await?;

        match (plan.work_pattern_id, plan.leave_rate) {
            (Some(work_pattern_id), _) => {
                schedule_repo::set_calendar_pattern(
                    conn,
                    plan.user_id,
                    date,
                    Some(work_pattern_id),
                )
                .await?
            }
            (None, Some(leave_rate)) => {
                schedule_repo::set_calendar_leave_rate(conn, plan.user_id, date, leave_rate).await?
            }
            (None, None) => {
                schedule_repo::set_calendar_pattern(conn, plan.user_id, date, None).await?
            }
        }

        schedules.push(schedule);
    }

    log::info!(
        "Projected {} schedule day(s) for user {} from {} (apply {:?})",
        schedules.len(),
        plan.user_id,
        plan.date_from,
        plan.apply_id
    );

    Ok(schedules)
}

#[derive(Clone)]
pub struct ScheduleService {
    pool: SqlitePool,
}

impl ScheduleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Project a plan in its own transaction.
    pub async fn add_schedules(&self, plan: SchedulePlan) -> Result<Vec<Schedule>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { add_schedules(tx, &plan).await })
        })
        .await
    }
}
