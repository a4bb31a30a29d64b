use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::database::models::RecordInput;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

/// Post a live punch
pub async fn submit_record(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<String>,
    input: web::Json<RecordInput>,
) -> Result<HttpResponse, AppError> {
    let record = state
        .record_service
        .submit_record(claims.user_id(), &path.into_inner(), input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}
