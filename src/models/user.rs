use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_text;
use super::role::Role;
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserModel {
    pub user_id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Row used by login; the hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredential {
    pub user_id: i64,
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserReq {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserReq {
    /// Validates a create request, returning the password and role.
    pub fn validate_create(&self) -> AppResult<(&str, Role)> {
        require_text(&self.username, "username")?;
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("password is required".into()))?;
        check_password(password)?;
        let role = self.role.ok_or_else(|| AppError::InvalidInput("role is required".into()))?;
        Ok((password, role))
    }

    /// Validates an update request. An empty password keeps the current one.
    pub fn validate_update(&self) -> AppResult<(Option<&str>, Role)> {
        require_text(&self.username, "username")?;
        let password = self.password.as_deref().filter(|p| !p.trim().is_empty());
        if let Some(p) = password {
            check_password(p)?;
        }
        let role = self.role.ok_or_else(|| AppError::InvalidInput("role is required".into()))?;
        Ok((password, role))
    }
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReq {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRes {
    pub token: String,
    pub expires_at: String,
    pub user: LoginUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_long_password() {
        let req: UserReq =
            serde_json::from_str(r#"{"username":"op","password":"abc","role":"Operator"}"#).unwrap();
        assert!(req.validate_create().is_err());
    }

    #[test]
    fn test_unknown_role_rejected_at_parse() {
        let res: Result<UserReq, _> =
            serde_json::from_str(r#"{"username":"op","password":"abcdef","role":"Guest"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_update_keeps_password_when_blank() {
        let req: UserReq =
            serde_json::from_str(r#"{"username":"op","password":"  ","role":"Management"}"#).unwrap();
        let (password, role) = req.validate_update().unwrap();
        assert!(password.is_none());
        assert_eq!(role, Role::Management);
    }
}
