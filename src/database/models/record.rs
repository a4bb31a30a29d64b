use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum RecordType {
        Clockin => "clockin",
        Stepout => "stepout",
        Reenter => "reenter",
        Clockout => "clockout",
    }
}

impl RecordType {
    /// Punch, device and apply-link columns of this slot in `records`.
    pub fn columns(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            RecordType::Clockin => ("clockin", "clockin_device_id", "clockin_apply_id"),
            RecordType::Stepout => ("stepout", "stepout_device_id", "stepout_apply_id"),
            RecordType::Reenter => ("reenter", "reenter_device_id", "reenter_apply_id"),
            RecordType::Clockout => ("clockout", "clockout_device_id", "clockout_apply_id"),
        }
    }
}

/// One user's punches for one work day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub clockin: Option<NaiveDateTime>,
    pub clockin_device_id: Option<Uuid>,
    pub clockin_apply_id: Option<Uuid>,
    pub stepout: Option<NaiveDateTime>,
    pub stepout_device_id: Option<Uuid>,
    pub stepout_apply_id: Option<Uuid>,
    pub reenter: Option<NaiveDateTime>,
    pub reenter_device_id: Option<Uuid>,
    pub reenter_apply_id: Option<Uuid>,
    pub clockout: Option<NaiveDateTime>,
    pub clockout_device_id: Option<Uuid>,
    pub clockout_apply_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn punch(&self, record_type: RecordType) -> Option<NaiveDateTime> {
        match record_type {
            RecordType::Clockin => self.clockin,
            RecordType::Stepout => self.stepout,
            RecordType::Reenter => self.reenter,
            RecordType::Clockout => self.clockout,
        }
    }
}

/// Request body for a punch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    pub target_account: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub device_account: Option<String>,
    pub apply_id: Option<Uuid>,
}

/// A resolved punch ready to be bucketed and written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Punch {
    pub user_id: Uuid,
    pub record_type: RecordType,
    pub timestamp: NaiveDateTime,
    pub device_id: Option<Uuid>,
    pub apply_id: Option<Uuid>,
}
