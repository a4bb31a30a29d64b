use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{
    DatabaseTransaction,
    models::{
        Apply, ApplyInput, ApplyOption, ApplyType, ApprovalOutcome, ApprovalRoute,
        ApprovalRouteInput, ApprovalStamps, ApprovalState, CurrentApprovers, Decision,
        RECORD_TYPE_OPTION, RecordType,
    },
    repositories::{
        apply as apply_repo, route as route_repo, user as user_repo,
        work_pattern as work_pattern_repo,
    },
};
use crate::error::AppError;
use crate::services::posting::PostingDispatcher;

pub fn parse_apply_type(name: &str) -> Result<ApplyType, AppError> {
    name.parse::<ApplyType>()
        .map_err(|_| AppError::NotFound(format!("Apply type not found: {}", name)))
}

/// Submission, routing and read access for applies.
#[derive(Clone)]
pub struct ApprovalService {
    pool: SqlitePool,
    dispatcher: PostingDispatcher,
}

impl ApprovalService {
    pub fn new(pool: SqlitePool, dispatcher: PostingDispatcher) -> Self {
        Self { pool, dispatcher }
    }

    pub async fn create_route(
        &self,
        input: ApprovalRouteInput,
    ) -> Result<ApprovalRoute, AppError> {
        if !input.has_approver() {
            return Err(AppError::BadRequest(format!(
                "Approval route {} has no approvers",
                input.name
            )));
        }

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                if route_repo::find_by_name(tx, &input.name).await?.is_some() {
                    return Err(AppError::Conflict(format!(
                        "Approval route already exists: {}",
                        input.name
                    )));
                }

                let route = route_repo::create_route(tx, input).await?;
                log::info!("Created approval route {} ({})", route.name, route.id);
                Ok(route)
            })
        })
        .await
    }

    /// Validate and store a new apply. Nothing is written unless every check passes.
    pub async fn submit_apply(
        &self,
        actor: Uuid,
        apply_type: ApplyType,
        input: ApplyInput,
    ) -> Result<Uuid, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let conn: &mut SqliteConnection = tx;
                let apply = build_apply(conn, actor, apply_type, &input).await?;
                validate_options(conn, apply_type, &input).await?;

                apply_repo::insert_apply(conn, &apply).await?;
                for option in &input.options {
                    apply_repo::insert_option(conn, apply.id, option).await?;
                }

                log::info!(
                    "Submitted {} apply {} for user {} (awaiting {:?})",
                    apply.apply_type,
                    apply.id,
                    apply.target_user_id,
                    apply.state.pending_level()
                );

                Ok(apply.id)
            })
        })
        .await
    }

    /// Approve or reject the pending level of an apply on behalf of `actor`.
    ///
    /// A final approval posts the apply's side effect in the same transaction.
    pub async fn approve_apply(
        &self,
        actor: Uuid,
        apply_id: Uuid,
        decision: Decision,
    ) -> Result<ApprovalOutcome, AppError> {
        let dispatcher = self.dispatcher.clone();

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let conn: &mut SqliteConnection = tx;
                let now = Utc::now();

                let mut apply = apply_repo::find_apply(conn, apply_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Apply not found: {}", apply_id)))?;
                let route = route_repo::find_by_id(conn, apply.route_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Approval route not found: {}", apply.route_id))
                    })?;

                let level = apply.decide(&route, actor, decision, now)?;
                if !apply_repo::update_approval_state(conn, &apply, level).await? {
                    return Err(AppError::Conflict(format!(
                        "Apply {} was decided concurrently",
                        apply.id
                    )));
                }

                log::info!(
                    "User {} {:?} apply {} at {}, now {}",
                    actor,
                    decision,
                    apply.id,
                    level,
                    apply.state.status()
                );

                if apply.state == ApprovalState::Approved {
                    dispatcher.post(conn, &apply, actor).await?;
                }

                Ok(ApprovalOutcome {
                    apply_id: apply.id,
                    level,
                    state: apply.state,
                })
            })
        })
        .await
    }

    pub async fn get_apply(&self, apply_id: Uuid) -> Result<Apply, AppError> {
        let mut conn = self.pool.acquire().await?;
        apply_repo::find_apply(&mut conn, apply_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Apply not found: {}", apply_id)))
    }

    pub async fn get_apply_options(&self, apply_id: Uuid) -> Result<Vec<ApplyOption>, AppError> {
        let mut conn = self.pool.acquire().await?;
        if apply_repo::find_apply(&mut conn, apply_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Apply not found: {}", apply_id)));
        }

        Ok(apply_repo::get_options(&mut conn, apply_id).await?)
    }

    /// Users the apply is waiting on. `None` once routing is complete.
    pub async fn get_current_approvers(
        &self,
        apply_id: Uuid,
    ) -> Result<Option<CurrentApprovers>, AppError> {
        let apply = self.get_apply(apply_id).await?;
        let Some(level) = apply.state.pending_level() else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let route = route_repo::find_by_id(&mut conn, apply.route_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Approval route not found: {}", apply.route_id))
            })?;

        Ok(Some(CurrentApprovers {
            level,
            approvers: route.approvers(level),
        }))
    }
}

async fn build_apply(
    conn: &mut SqliteConnection,
    actor: Uuid,
    apply_type: ApplyType,
    input: &ApplyInput,
) -> Result<Apply, AppError> {
    let target_user_id = match input.target_account.as_deref() {
        Some(account) => {
            user_repo::find_by_account(conn, account)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User not found: {}", account)))?
                .id
        }
        None => actor,
    };

    let route = route_repo::find_by_name(conn, &input.route_name)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Approval route not found: {}", input.route_name))
        })?;
    let first_level = route.first_level().ok_or_else(|| {
        AppError::BadRequest(format!("Approval route {} has no approvers", route.name))
    })?;

    let work_pattern_id = match input.work_pattern_name.as_deref() {
        Some(name) => Some(
            work_pattern_repo::find_by_name(conn, name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Work pattern not found: {}", name)))?
                .id,
        ),
        None if apply_type.requires_work_pattern() => {
            return Err(AppError::BadRequest(format!(
                "A {} apply requires a work pattern",
                apply_type
            )));
        }
        None => None,
    };

    if let Some(to) = input.date_time_to {
        if to < input.date_time_from {
            return Err(AppError::BadRequest(format!(
                "Apply ends ({}) before it starts ({})",
                to, input.date_time_from
            )));
        }
    }

    let now = Utc::now();
    Ok(Apply {
        id: Uuid::new_v4(),
        apply_type,
        target_user_id,
        applied_by: actor,
        applied_at: now,
        date: input.date_time_from.date(),
        date_time_from: input.date_time_from,
        date_time_to: input.date_time_to,
        date_related: input.date_related,
        reason: input.reason.clone(),
        contact: input.contact.clone(),
        route_id: route.id,
        work_pattern_id,
        state: ApprovalState::Pending { level: first_level },
        approvals: ApprovalStamps::default(),
        updated_at: now,
    })
}

async fn validate_options(
    conn: &mut SqliteConnection,
    apply_type: ApplyType,
    input: &ApplyInput,
) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for option in &input.options {
        if !seen.insert(option.option_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Option {} given more than once",
                option.option_type
            )));
        }
        let known =
            apply_repo::option_value_exists(conn, &option.option_type, &option.option_value)
                .await?;
        if !known {
            return Err(AppError::BadRequest(format!(
                "Unknown option {}={}",
                option.option_type, option.option_value
            )));
        }
    }

    if apply_type == ApplyType::Record {
        let record_type = input
            .options
            .iter()
            .find(|option| option.option_type == RECORD_TYPE_OPTION)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "A record apply requires a {} option",
                    RECORD_TYPE_OPTION
                ))
            })?;
        record_type
            .option_value
            .parse::<RecordType>()
            .map_err(|_| {
                AppError::BadRequest(format!("Unknown record type: {}", record_type.option_value))
            })?;
    }

    Ok(())
}
