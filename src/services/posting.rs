use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::{
    models::{Apply, BREAK_MINUTES_OPTION, PostingAction, Punch, RECORD_TYPE_OPTION, SchedulePlan},
    repositories::apply as apply_repo,
};
use crate::error::AppError;
use crate::services::{projection, records::RecordService};

/// Turns a finally approved apply into its schedule or record side effect.
///
/// Runs on the approval transaction's connection, so a failure here undoes
/// the approval as well.
#[derive(Clone)]
pub struct PostingDispatcher {
    records: RecordService,
}

impl PostingDispatcher {
    pub fn new(records: RecordService) -> Self {
        Self { records }
    }

    pub async fn post(
        &self,
        conn: &mut SqliteConnection,
        apply: &Apply,
        actor: Uuid,
    ) -> Result<(), AppError> {
        match apply.apply_type.posting_action() {
            PostingAction::CorrectRecord => self.correct_record(conn, apply).await,
            PostingAction::Absence { paid, leave_rate } => {
                let (date_from, date_to) = apply.date_range();
                let plan = SchedulePlan {
                    actor,
                    user_id: apply.target_user_id,
                    apply_id: Some(apply.id),
                    work_pattern_id: None,
                    date_from,
                    date_to: Some(date_to),
                    leave_rate,
                    is_paid: paid,
                    break_minutes: None,
                };
                projection::add_schedules(conn, &plan).await?;
                Ok(())
            }
            PostingAction::HolidayWork => {
                let work_pattern_id = apply.work_pattern_id.ok_or_else(|| {
                    AppError::BadRequest(format!("Apply {} has no work pattern", apply.id))
                })?;
                let break_option =
                    apply_repo::get_option_value(conn, apply.id, BREAK_MINUTES_OPTION).await?;
                let break_minutes = match break_option {
                    Some(value) => Some(value.parse::<i64>().map_err(|_| {
                        AppError::BadRequest(format!(
                            "Invalid {} option: {}",
                            BREAK_MINUTES_OPTION, value
                        ))
                    })?),
                    None => None,
                };

                let (date_from, date_to) = apply.date_range();
                let plan = SchedulePlan {
                    actor,
                    user_id: apply.target_user_id,
                    apply_id: Some(apply.id),
                    work_pattern_id: Some(work_pattern_id),
                    date_from,
                    date_to: Some(date_to),
                    leave_rate: None,
                    is_paid: false,
                    break_minutes,
                };
                projection::add_schedules(conn, &plan).await?;
                Ok(())
            }
            PostingAction::Nothing => {
                log::debug!(
                    "Apply {} ({}) has no posting side effect",
                    apply.id,
                    apply.apply_type
                );
                Ok(())
            }
        }
    }

    async fn correct_record(
        &self,
        conn: &mut SqliteConnection,
        apply: &Apply,
    ) -> Result<(), AppError> {
        let name = apply_repo::get_option_value(conn, apply.id, RECORD_TYPE_OPTION)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Apply {} has no {} option",
                    apply.id, RECORD_TYPE_OPTION
                ))
            })?;
        let record_type = self.records.registry().resolve(&name)?;

        let punch = Punch {
            user_id: apply.target_user_id,
            record_type,
            timestamp: apply.date_time_from,
            device_id: None,
            apply_id: Some(apply.id),
        };
        self.records.post_punch(conn, &punch).await?;

        Ok(())
    }
}
