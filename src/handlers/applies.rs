use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{ApplyInput, ApprovalRouteInput, Decision};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestIdExt;
use crate::services::{Claims, approval::parse_apply_type};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApply {
    pub id: Uuid,
}

pub async fn create_route(
    _claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<ApprovalRouteInput>,
) -> Result<HttpResponse, AppError> {
    let route = state
        .approval_service
        .create_route(input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(route)))
}

/// Submit an apply of the type named in the path
pub async fn submit_apply(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<String>,
    input: web::Json<ApplyInput>,
) -> Result<HttpResponse, AppError> {
    let apply_type = parse_apply_type(&path.into_inner())?;

    let id = state
        .approval_service
        .submit_apply(claims.user_id(), apply_type, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(SubmittedApply { id })))
}

pub async fn get_apply(
    _claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let apply = state.approval_service.get_apply(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(apply)))
}

pub async fn get_apply_options(
    _claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let options = state
        .approval_service
        .get_apply_options(path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(options)))
}

/// Users the apply currently waits on; `data` is null once routing is complete
pub async fn get_current_approvers(
    _claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let approvers = state
        .approval_service
        .get_current_approvers(path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(approvers)))
}

pub async fn approve_apply(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    decide(claims, state, path.into_inner(), Decision::Approve, &req).await
}

pub async fn reject_apply(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    decide(claims, state, path.into_inner(), Decision::Reject, &req).await
}

async fn decide(
    claims: Claims,
    state: web::Data<AppState>,
    apply_id: Uuid,
    decision: Decision,
    req: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .approval_service
        .approve_apply(claims.user_id(), apply_id, decision)
        .await?;

    log::info!(
        "[{}] {} decided apply {} at {}: {}",
        req.correlation_id().unwrap_or_default(),
        claims.account,
        apply_id,
        outcome.level,
        outcome.state.status()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}
