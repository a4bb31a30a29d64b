use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use super::route::{ApprovalLevel, ApprovalRoute, LevelApprovers};
use crate::error::AppError;

pub const RECORD_TYPE_OPTION: &str = "recordType";
pub const BREAK_MINUTES_OPTION: &str = "breakMinutes";

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "kebab-case")]
    pub enum ApplyType {
        Record => "record",
        Leave => "leave",
        MourningLeave => "mourning-leave",
        MeasureLeave => "measure-leave",
        MakeupLeave => "makeup-leave",
        AmLeave => "am-leave",
        PmLeave => "pm-leave",
        HolidayWork => "holiday-work",
        Overtime => "overtime",
        Lateness => "lateness",
        LeaveEarly => "leave-early",
        Break => "break",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// The side effect a final approval has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostingAction {
    /// Write the punch named by the `recordType` option.
    CorrectRecord,
    /// Project an absence over the requested days.
    Absence { paid: bool, leave_rate: Option<f64> },
    /// Project working days under the apply's explicit work pattern.
    HolidayWork,
    /// Approval-only types.
    Nothing,
}

impl ApplyType {
    pub fn posting_action(&self) -> PostingAction {
        match self {
            ApplyType::Record => PostingAction::CorrectRecord,
            ApplyType::Leave => PostingAction::Absence {
                paid: true,
                leave_rate: None,
            },
            ApplyType::MourningLeave | ApplyType::MeasureLeave | ApplyType::MakeupLeave => {
                PostingAction::Absence {
                    paid: false,
                    leave_rate: None,
                }
            }
            ApplyType::AmLeave => PostingAction::Absence {
                paid: true,
                leave_rate: Some(0.5),
            },
            ApplyType::PmLeave => PostingAction::Absence {
                paid: true,
                leave_rate: Some(-0.5),
            },
            ApplyType::HolidayWork => PostingAction::HolidayWork,
            ApplyType::Overtime
            | ApplyType::Lateness
            | ApplyType::LeaveEarly
            | ApplyType::Break => PostingAction::Nothing,
        }
    }

    pub fn requires_work_pattern(&self) -> bool {
        matches!(self, ApplyType::HolidayWork)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ApprovalState {
    #[serde(rename_all = "camelCase")]
    Pending { level: ApprovalLevel },
    Approved,
    #[serde(rename_all = "camelCase")]
    Rejected {
        by: Uuid,
        level: ApprovalLevel,
        at: DateTime<Utc>,
    },
}

impl ApprovalState {
    pub fn status(&self) -> ApprovalStatus {
        match self {
            ApprovalState::Pending { .. } => ApprovalStatus::Pending,
            ApprovalState::Approved => ApprovalStatus::Approved,
            ApprovalState::Rejected { .. } => ApprovalStatus::Rejected,
        }
    }

    pub fn pending_level(&self) -> Option<ApprovalLevel> {
        match self {
            ApprovalState::Pending { level } => Some(*level),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalState::Pending { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStamp {
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStamps {
    pub level1: Option<ApprovalStamp>,
    pub level2: Option<ApprovalStamp>,
    pub level3: Option<ApprovalStamp>,
    pub decision: Option<ApprovalStamp>,
}

impl ApprovalStamps {
    pub fn get(&self, level: ApprovalLevel) -> Option<&ApprovalStamp> {
        match level {
            ApprovalLevel::Level1 => self.level1.as_ref(),
            ApprovalLevel::Level2 => self.level2.as_ref(),
            ApprovalLevel::Level3 => self.level3.as_ref(),
            ApprovalLevel::Decision => self.decision.as_ref(),
        }
    }

    fn set(&mut self, level: ApprovalLevel, stamp: ApprovalStamp) {
        let slot = match level {
            ApprovalLevel::Level1 => &mut self.level1,
            ApprovalLevel::Level2 => &mut self.level2,
            ApprovalLevel::Level3 => &mut self.level3,
            ApprovalLevel::Decision => &mut self.decision,
        };
        *slot = Some(stamp);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apply {
    pub id: Uuid,
    pub apply_type: ApplyType,
    pub target_user_id: Uuid,
    pub applied_by: Uuid,
    pub applied_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub date_time_from: NaiveDateTime,
    pub date_time_to: Option<NaiveDateTime>,
    pub date_related: Option<NaiveDate>,
    pub reason: Option<String>,
    pub contact: Option<String>,
    pub route_id: Uuid,
    pub work_pattern_id: Option<Uuid>,
    pub state: ApprovalState,
    pub approvals: ApprovalStamps,
    pub updated_at: DateTime<Utc>,
}

impl Apply {
    /// Apply one approver's decision to the pending level.
    ///
    /// The actor must occupy the level currently waiting. Returns the level
    /// that was acted on.
    pub fn decide(
        &mut self,
        route: &ApprovalRoute,
        actor: Uuid,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<ApprovalLevel, AppError> {
        let ApprovalState::Pending { level: current } = self.state else {
            return Err(AppError::Conflict(format!(
                "Approval routing for apply {} is already complete",
                self.id
            )));
        };

        let positions = route.levels_of(actor);
        if positions.is_empty() {
            return Err(AppError::PermissionDenied(format!(
                "User {} is not in approval route {}",
                actor, route.name
            )));
        }
        if !positions.contains(&current) {
            if positions.iter().all(|level| *level < current) {
                return Err(AppError::Conflict(format!(
                    "Apply {} has already passed the approver's level",
                    self.id
                )));
            }
            return Err(AppError::PermissionDenied(format!(
                "Apply {} is awaiting {} approval",
                self.id, current
            )));
        }

        self.state = match decision {
            Decision::Approve => {
                self.approvals.set(
                    current,
                    ApprovalStamp {
                        user_id: actor,
                        at: now,
                    },
                );
                match route.next_level_after(current) {
                    Some(next) => ApprovalState::Pending { level: next },
                    None => ApprovalState::Approved,
                }
            }
            Decision::Reject => ApprovalState::Rejected {
                by: actor,
                level: current,
                at: now,
            },
        };
        self.updated_at = now;

        Ok(current)
    }

    /// Calendar days covered by the request, inclusive.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        let from = self.date_time_from.date();
        let to = self.date_time_to.map(|to| to.date()).unwrap_or(from);
        (from, to)
    }
}

/// Raw `applies` row; state columns are folded into [`ApprovalState`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApplyRow {
    pub id: Uuid,
    pub apply_type: ApplyType,
    pub target_user_id: Uuid,
    pub applied_by: Uuid,
    pub applied_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub date_time_from: NaiveDateTime,
    pub date_time_to: Option<NaiveDateTime>,
    pub date_related: Option<NaiveDate>,
    pub reason: Option<String>,
    pub contact: Option<String>,
    pub route_id: Uuid,
    pub work_pattern_id: Option<Uuid>,
    pub status: ApprovalStatus,
    pub current_level: Option<ApprovalLevel>,
    pub approved_level1_user_id: Option<Uuid>,
    pub approved_level1_at: Option<DateTime<Utc>>,
    pub approved_level2_user_id: Option<Uuid>,
    pub approved_level2_at: Option<DateTime<Utc>>,
    pub approved_level3_user_id: Option<Uuid>,
    pub approved_level3_at: Option<DateTime<Utc>>,
    pub approved_decision_user_id: Option<Uuid>,
    pub approved_decision_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_level: Option<ApprovalLevel>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

fn stamp(user_id: Option<Uuid>, at: Option<DateTime<Utc>>) -> Option<ApprovalStamp> {
    match (user_id, at) {
        (Some(user_id), Some(at)) => Some(ApprovalStamp { user_id, at }),
        _ => None,
    }
}

impl TryFrom<ApplyRow> for Apply {
    type Error = String;

    fn try_from(row: ApplyRow) -> Result<Self, Self::Error> {
        let state = match (row.status, row.current_level) {
            (ApprovalStatus::Pending, Some(level)) => ApprovalState::Pending { level },
            (ApprovalStatus::Approved, None) => ApprovalState::Approved,
            (ApprovalStatus::Rejected, None) => {
                match (row.rejected_by, row.rejected_level, row.rejected_at) {
                    (Some(by), Some(level), Some(at)) => ApprovalState::Rejected { by, level, at },
                    _ => return Err(format!("Apply {} is rejected without a rejection", row.id)),
                }
            }
            (status, level) => {
                return Err(format!(
                    "Apply {} has inconsistent state {} / {:?}",
                    row.id, status, level
                ));
            }
        };

        Ok(Apply {
            id: row.id,
            apply_type: row.apply_type,
            target_user_id: row.target_user_id,
            applied_by: row.applied_by,
            applied_at: row.applied_at,
            date: row.date,
            date_time_from: row.date_time_from,
            date_time_to: row.date_time_to,
            date_related: row.date_related,
            reason: row.reason,
            contact: row.contact,
            route_id: row.route_id,
            work_pattern_id: row.work_pattern_id,
            state,
            approvals: ApprovalStamps {
                level1: stamp(row.approved_level1_user_id, row.approved_level1_at),
                level2: stamp(row.approved_level2_user_id, row.approved_level2_at),
                level3: stamp(row.approved_level3_user_id, row.approved_level3_at),
                decision: stamp(row.approved_decision_user_id, row.approved_decision_at),
            },
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOption {
    pub apply_id: Uuid,
    pub option_type: String,
    pub option_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOptionInput {
    pub option_type: String,
    pub option_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInput {
    pub target_account: Option<String>,
    pub date_time_from: NaiveDateTime,
    pub date_time_to: Option<NaiveDateTime>,
    pub date_related: Option<NaiveDate>,
    pub reason: Option<String>,
    pub contact: Option<String>,
    pub route_name: String,
    pub work_pattern_name: Option<String>,
    #[serde(default)]
    pub options: Vec<ApplyOptionInput>,
}

/// Who the apply is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentApprovers {
    pub level: ApprovalLevel,
    #[serde(flatten)]
    pub approvers: LevelApprovers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub apply_id: Uuid,
    pub level: ApprovalLevel,
    pub state: ApprovalState,
}
