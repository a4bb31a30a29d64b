use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    /// Defaults to the caller.
    pub account: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn get_attendance(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let days = match query.account.as_deref() {
        Some(account) => {
            state
                .attendance_service
                .get_attendance_by_account(account, query.from, query.to)
                .await?
        }
        None => {
            state
                .attendance_service
                .get_attendance(claims.user_id(), query.from, query.to)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(days)))
}
