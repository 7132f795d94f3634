//! Caller identity.
//!
//! Sessions are owned by the identity provider in front of this service. It
//! forwards the authenticated caller as `x-identity-id` / `x-identity-role`
//! headers, which are turned into an [`Identity`] per request.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const IDENTITY_ID_HEADER: &str = "x-identity-id";
pub const IDENTITY_ROLE_HEADER: &str = "x-identity-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Independent contractor using the agent portal.
    Agent,
    /// Recruiter using the admin/ATS portal.
    Admin,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" => Some(Role::Agent),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Admins may act on anyone's behalf; agents only on their own.
    pub fn require_self_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)
    }
}

fn identity_from_parts(parts: &Parts) -> Result<Identity, AppError> {
    let id = parts
        .headers
        .get(IDENTITY_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(AppError::Unauthorized)?;

    let role = match parts.headers.get(IDENTITY_ROLE_HEADER) {
        None => Role::Agent,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(Role::parse)
            .ok_or(AppError::Unauthorized)?,
    };

    Ok(Identity { id, role })
}
