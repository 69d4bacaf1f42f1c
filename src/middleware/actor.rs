use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::UserRole;
use crate::error::AppError;
use crate::workflow::Actor;

/// Header carrying the authenticated user id, set by the auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)?
            .parse::<i64>()
            .map_err(|_| AppError::Authentication(format!("{} must be an integer", USER_ID_HEADER)))?;
        let role = header(parts, USER_ROLE_HEADER)?
            .parse::<UserRole>()
            .map_err(AppError::Authentication)?;

        let actor = Actor::new(user_id, role);
        tracing::Span::current().record("user_id", actor.user_id);
        Ok(actor)
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::Authentication(format!("missing {} header", name)))?
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::Authentication(format!("{} header is not valid text", name)))
}
