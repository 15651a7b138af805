use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, Request};
use tower::{Layer, Service};

use crate::error::{AppError, AppResult};
use crate::models::{Permission, Role};
use crate::services::auth_service::decode_token;

/// Authenticated user info injected by the auth middleware into request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fails with 403 unless the user's role grants `permission`.
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                role = %self.role,
                ?permission,
                "Permission denied"
            );
            Err(AppError::Forbidden("Access denied".into()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Access token is missing or invalid".into()))
    }
}

/// Decodes `Authorization: Bearer <jwt>` and stores the user in request extensions.
///
/// Requests without a valid token pass through untouched; handlers that need a
/// user reject them through the [`AuthenticatedUser`] extractor.
#[derive(Clone)]
pub struct AuthLayer {
    jwt_secret: Arc<str>,
}

impl AuthLayer {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt_secret: Arc<str>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<Request<ReqBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        if let Some(token) = token {
            match decode_token(token, &self.jwt_secret) {
                Some(claims) => {
                    req.extensions_mut().insert(AuthenticatedUser {
                        user_id: claims.sub,
                        username: claims.username,
                        role: claims.role,
                    });
                }
                None => tracing::debug!("Rejected bearer token for {}", req.uri().path()),
            }
        }

        Box::pin(async move { inner.call(req).await })
    }
}
