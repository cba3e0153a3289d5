//! Identity extractors.
//!
//! Sessions are authenticated upstream; the gateway forwards the caller's
//! identity in trusted headers:
//! - `x-user-id` user UUID (required)
//! - `x-user-name` display name
//! - `x-user-verified` `true` once the email address is verified
//! - `x-user-role` `admin` for administrators

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use checkout::Customer;
use domain::UserId;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_VERIFIED_HEADER: &str = "x-user-verified";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role carried by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub verified: bool,
    pub role: Role,
}

impl Principal {
    /// Reads the caller's identity from gateway headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let raw_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;
        let id = UserId::parse(raw_id.trim()).map_err(|_| {
            tracing::warn!(user_id = raw_id, "malformed identity header");
            ApiError::Unauthorized("Not authorized".to_string())
        })?;

        let verified = header(USER_VERIFIED_HEADER)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let role = match header(USER_ROLE_HEADER) {
            Some(r) if r.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Customer,
        };

        Ok(Self {
            id,
            name: header(USER_NAME_HEADER).unwrap_or_default().to_string(),
            verified,
            role,
        })
    }

    /// The caller as seen by checkout.
    pub fn customer(&self) -> Customer {
        Customer {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let principal = Principal::from_headers(&parts.headers)?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

/// A caller whose email address has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if !principal.verified {
            tracing::info!(user_id = %principal.id, "unverified user refused");
            return Err(ApiError::Forbidden(
                "Please verify your email to access this feature.".to_string(),
            ));
        }
        Ok(VerifiedUser(principal))
    }
}

/// A caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if principal.role != Role::Admin {
            tracing::warn!(user_id = %principal.id, "non-admin refused");
            return Err(ApiError::Forbidden("Not authorized as admin.".to_string()));
        }
        Ok(AdminUser(principal))
    }
}
