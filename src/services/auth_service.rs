use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{message, AppState};
use crate::error::{conflict_on_duplicate, AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::AuthenticatedUser;
use crate::models::{LoginReq, LoginRes, LoginUser, Role, UserCredential, UserReq};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Signs an HS256 token for `user`, valid for `ttl_hours`.
pub fn issue_token(
    user: &AuthenticatedUser,
    jwt_secret: &str,
    ttl_hours: i64,
) -> AppResult<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let exp = now + chrono::Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user.user_id,
        username: user.username.clone(),
        role: user.role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("JWT error: {}", e)))?;
    Ok((token, exp))
}

/// Claims of a valid, unexpired token; `None` otherwise.
pub fn decode_token(token: &str, jwt_secret: &str) -> Option<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            tracing::warn!("Stored password hash is not in PHC format");
            false
        }
    }
}

async fn signup(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<UserReq>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if !state.config.signup_enabled {
        return Err(AppError::Forbidden("Signup is disabled".into()));
    }
    let (password, role) = req.validate_create()?;
    let username = req.username.trim();
    let password_hash = hash_password(password)?;

    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
        .bind(username)
        .bind(&password_hash)
        .bind(role.as_str())
        .execute(&state.pool)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Username already exists."))?;

    tracing::info!(username, %role, "User signed up");
    Ok((StatusCode::CREATED, message("User created successfully!")))
}

async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginReq>,
) -> AppResult<Json<LoginRes>> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide both username and password.".into(),
        ));
    }

    let credential = sqlx::query_as::<_, UserCredential>(
        "SELECT user_id, username, password, role FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(&state.pool)
    .await?;

    let credential = match credential {
        Some(c) if verify_password(&req.password, &c.password_hash) => c,
        _ => {
            tracing::info!(username, "Failed login attempt");
            return Err(AppError::Unauthorized("Invalid credentials.".into()));
        }
    };

    let user = AuthenticatedUser {
        user_id: credential.user_id,
        username: credential.username,
        role: credential.role,
    };
    let (token, exp) = issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;

    tracing::info!(user_id = user.user_id, "User logged in");
    Ok(Json(LoginRes {
        token,
        expires_at: exp.to_rfc3339(),
        user: LoginUser {
            id: user.user_id,
            username: user.username,
            role: user.role,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 3,
            username: "admin".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let (token, exp) = issue_token(&user(), "secret", 24).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, exp.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret_or_expired() {
        let (token, _) = issue_token(&user(), "secret", 24).unwrap();
        assert!(decode_token(&token, "other").is_none());

        let (expired, _) = issue_token(&user(), "secret", -2).unwrap();
        assert!(decode_token(&expired, "secret").is_none());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        // legacy bcrypt hashes do not verify
        assert!(!verify_password(
            "hunter22",
            "$2b$10$abcdefghijklmnopqrstuuJ9pW6Yb2nL1K3m5o7q9s1u3w5y7a9c"
        ));
    }
}
