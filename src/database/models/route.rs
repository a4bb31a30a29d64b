use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    /// Ordinal position in an approval route. Ordering follows routing order.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum ApprovalLevel {
        Level1 => "level1",
        Level2 => "level2",
        Level3 => "level3",
        Decision => "decision",
    }
}

/// The users bound to one level. The decision level has no sub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelApprovers {
    pub main: Option<Uuid>,
    pub sub: Option<Uuid>,
}

impl LevelApprovers {
    pub fn is_present(&self) -> bool {
        self.main.is_some() || self.sub.is_some()
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.main == Some(user_id) || self.sub == Some(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRoute {
    pub id: Uuid,
    pub name: String,
    pub level1_main_user_id: Option<Uuid>,
    pub level1_sub_user_id: Option<Uuid>,
    pub level2_main_user_id: Option<Uuid>,
    pub level2_sub_user_id: Option<Uuid>,
    pub level3_main_user_id: Option<Uuid>,
    pub level3_sub_user_id: Option<Uuid>,
    pub decision_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRouteInput {
    pub name: String,
    pub level1_main_user_id: Option<Uuid>,
    pub level1_sub_user_id: Option<Uuid>,
    pub level2_main_user_id: Option<Uuid>,
    pub level2_sub_user_id: Option<Uuid>,
    pub level3_main_user_id: Option<Uuid>,
    pub level3_sub_user_id: Option<Uuid>,
    pub decision_user_id: Option<Uuid>,
}

impl ApprovalRouteInput {
    pub fn has_approver(&self) -> bool {
        [
            self.level1_main_user_id,
            self.level1_sub_user_id,
            self.level2_main_user_id,
            self.level2_sub_user_id,
            self.level3_main_user_id,
            self.level3_sub_user_id,
            self.decision_user_id,
        ]
        .iter()
        .any(Option::is_some)
    }
}

impl ApprovalRoute {
    pub fn approvers(&self, level: ApprovalLevel) -> LevelApprovers {
        match level {
            ApprovalLevel::Level1 => LevelApprovers {
                main: self.level1_main_user_id,
                sub: self.level1_sub_user_id,
            },
            ApprovalLevel::Level2 => LevelApprovers {
                main: self.level2_main_user_id,
                sub: self.level2_sub_user_id,
            },
            ApprovalLevel::Level3 => LevelApprovers {
                main: self.level3_main_user_id,
                sub: self.level3_sub_user_id,
            },
            ApprovalLevel::Decision => LevelApprovers {
                main: self.decision_user_id,
                sub: None,
            },
        }
    }

    pub fn present_levels(&self) -> impl Iterator<Item = ApprovalLevel> + '_ {
        ApprovalLevel::ALL
            .iter()
            .copied()
            .filter(|level| self.approvers(*level).is_present())
    }

    /// First level an apply bound to this route waits on, if any.
    pub fn first_level(&self) -> Option<ApprovalLevel> {
        self.present_levels().next()
    }

    pub fn next_level_after(&self, level: ApprovalLevel) -> Option<ApprovalLevel> {
        self.present_levels().find(|next| *next > level)
    }

    /// Every level the user occupies, in routing order.
    pub fn levels_of(&self, user_id: Uuid) -> Vec<ApprovalLevel> {
        ApprovalLevel::ALL
            .iter()
            .copied()
            .filter(|level| self.approvers(*level).contains(user_id))
            .collect()
    }
}
