use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::database::location::Location;
use crate::database::models::{AuthResponse, CreateUserInput, LoginInput, User};
use crate::database::registry::TenantRegistry;
use crate::error::AppError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub location: Location,
    pub is_owner: bool,
    pub exp: usize, // expiration time
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return ready(Err(AppError::Unauthorized(
                "Access token required".to_string(),
            )));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data, cannot verify token");
            return ready(Err(AppError::internal_server_error()));
        };

        ready(decode_token(token, &config.jwt_secret))
    }
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|token_data| token_data.claims)
    .map_err(|e| {
        log::debug!("Rejected token: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })
}

#[derive(Clone)]
pub struct AuthService {
    registry: Arc<TenantRegistry>,
    config: Config,
}

impl AuthService {
    pub fn new(registry: Arc<TenantRegistry>, config: Config) -> Self {
        Self { registry, config }
    }

    pub async fn register(&self, request: CreateUserInput) -> Result<AuthResponse, AppError> {
        let location = TenantRegistry::parse_location(&request.location)?;

        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }

        let users = self.registry.users(location)?;

        // Check if email already exists in this location
        if users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::internal_server_error()
        })?;

        let user = users
            .create_user(&User::new(&request.email, password_hash, request.name))
            .await?;

        log::info!("Registered user {} at {}", user.id, location);

        let token = self.generate_token(&user, location)?;

        Ok(AuthResponse {
            token,
            user: user.into(),
            location,
        })
    }

    pub async fn login(&self, request: LoginInput) -> Result<AuthResponse, AppError> {
        let location = TenantRegistry::parse_location(&request.location)?;
        let users = self.registry.users(location)?;

        let user = users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let matches = verify(&request.password, &user.password_hash).map_err(|e| {
            log::error!("Failed to verify password for user {}: {}", user.id, e);
            AppError::internal_server_error()
        })?;

        if !matches {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.generate_token(&user, location)?;

        Ok(AuthResponse {
            token,
            user: user.into(),
            location,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode_token(token, &self.config.jwt_secret)
    }

    /// The token's user, looked up in the token's own location.
    pub async fn get_user(&self, claims: &Claims) -> Result<User, AppError> {
        self.registry
            .users(claims.location)?
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub fn generate_token(&self, user: &User, location: Location) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| {
                AppError::internal_server_error_message("Token expiration out of range")
            })?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            location,
            is_owner: user.is_owner,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
        .map_err(|e| {
            log::error!("Failed to sign token: {}", e);
            AppError::internal_server_error()
        })
    }
}
