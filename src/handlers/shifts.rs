use actix_web::{HttpResponse, Result, web};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{ShiftInput, ShiftRangeQuery, ShiftUpdate};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn get_week(
    state: web::Data<AppState>,
    claims: Claims,
    query: web::Query<ShiftRangeQuery>,
) -> Result<HttpResponse> {
    let (start, end) = query.bounds()?;

    let shifts = state
        .registry
        .shifts(claims.location)?
        .find_by_date_range(start, end)
        .await
        .map_err(|e| {
            log::error!(
                "Failed to fetch shifts {} to {} at {}: {}",
                start,
                end,
                claims.location,
                e
            );
            e
        })?;

    Ok(ApiResponse::success(shifts))
}

pub async fn get_by_date(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = path
        .parse::<NaiveDate>()
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", path.as_str())))?;

    let shifts = state
        .registry
        .shifts(claims.location)?
        .find_by_date(date)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch shifts for {} at {}: {}", date, claims.location, e);
            e
        })?;

    Ok(ApiResponse::success(shifts))
}

pub async fn get_shift(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let shift_id = path.into_inner();

    let shift = state
        .registry
        .shifts(claims.location)?
        .find_by_id(shift_id)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch shift {}: {}", shift_id, e);
            e
        })?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    Ok(ApiResponse::success(shift))
}

pub async fn create_shift(
    state: web::Data<AppState>,
    claims: Claims,
    input: web::Json<ShiftInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate()?;

    let shift = state
        .registry
        .shifts(claims.location)?
        .create_shift(input, claims.sub)
        .await
        .map_err(|e| {
            log::error!("Failed to create shift at {}: {}", claims.location, e);
            e
        })?;

    log::info!("Shift {} created by {} at {}", shift.id, claims.sub, claims.location);

    Ok(ApiResponse::created(shift, "Shift created successfully"))
}

pub async fn update_shift(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<Uuid>,
    input: web::Json<ShiftUpdate>,
) -> Result<HttpResponse> {
    let shift_id = path.into_inner();

    let shift = state
        .registry
        .shifts(claims.location)?
        .update_shift(shift_id, input.into_inner())
        .await
        .map_err(|e| {
            log::warn!("Failed to update shift {}: {}", shift_id, e);
            e
        })?;

    Ok(ApiResponse::success_with_message(
        shift,
        "Shift updated successfully",
    ))
}

pub async fn delete_shift(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let shift_id = path.into_inner();

    state
        .registry
        .shifts(claims.location)?
        .delete_shift(shift_id)
        .await
        .map_err(|e| {
            log::warn!("Failed to delete shift {}: {}", shift_id, e);
            e
        })?;

    log::info!("Shift {} deleted by {} at {}", shift_id, claims.sub, claims.location);

    Ok(ApiResponse::success_message("Shift deleted successfully"))
}
