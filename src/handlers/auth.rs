use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::{CreateUserInput, LoginInput, UserInfo};
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<CreateUserInput>,
) -> Result<HttpResponse> {
    let response = state
        .auth_service
        .register(request.into_inner())
        .await
        .map_err(|e| {
            log::warn!("Failed to register user: {}", e);
            e
        })?;

    Ok(ApiResponse::created(response, "User registered successfully"))
}

pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let response = state
        .auth_service
        .login(request.into_inner())
        .await
        .map_err(|e| {
            log::warn!("Failed to login user: {}", e);
            e
        })?;

    Ok(ApiResponse::success(response))
}

pub async fn me(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    let user = state.auth_service.get_user(&claims).await.map_err(|e| {
        log::error!("Failed to load user {}: {}", claims.sub, e);
        e
    })?;

    Ok(ApiResponse::success(serde_json::json!({
        "user": UserInfo::from(user),
        "location": claims.location,
    })))
}
