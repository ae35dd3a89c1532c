//! Authorization gates
//!
//! Gates only add fields to the context (`user`, then `user_role`). The
//! authentication check always runs first, so a call without a session gets
//! `UNAUTHORIZED` from every gate, never `FORBIDDEN`.
//!
//! Role gates look the caller's role up in the profile table on every call.

use tracing::debug;

use super::context::Context;
use crate::backend::AuthUser;
use crate::schema::UserRole;
use crate::types::{EnaaError, Result};

/// Context after at least one gate ran
#[derive(Debug, Clone)]
pub struct GatedContext {
    pub ctx: Context,
    pub user: AuthUser,
    /// Set by role gates
    pub user_role: Option<UserRole>,
}

/// Fail with `UNAUTHORIZED` unless the call carries a session
pub fn require_authenticated(ctx: Context) -> Result<GatedContext> {
    let user = ctx
        .session
        .as_ref()
        .map(|s| s.user.clone())
        .ok_or_else(|| EnaaError::Unauthorized("Authentication required".into()))?;

    Ok(GatedContext {
        ctx,
        user,
        user_role: None,
    })
}

/// Resolve the caller's role from their profile and require `role`
pub async fn require_role(mut gated: GatedContext, role: UserRole) -> Result<GatedContext> {
    let actual = match gated.user_role {
        Some(known) => known,
        None => lookup_role(&gated).await?,
    };
    gated.user_role = Some(actual);

    if actual != role {
        debug!(user_id = %gated.user.id, required = %role, actual = %actual, "Role gate refused");
        return Err(EnaaError::Forbidden(format!("{} role required", role)));
    }

    Ok(gated)
}

async fn lookup_role(gated: &GatedContext) -> Result<UserRole> {
    let row = gated
        .ctx
        .backend
        .fetch_profile(&gated.user.id)
        .await
        .map_err(|e| EnaaError::Backend(format!("role lookup failed: {}", e)))?;

    row.map(|r| r.role)
        .ok_or_else(|| EnaaError::Forbidden("No profile for this account".into()))
}

pub async fn require_teacher(ctx: Context) -> Result<GatedContext> {
    require_role(require_authenticated(ctx)?, UserRole::Teacher).await
}

pub async fn require_student(ctx: Context) -> Result<GatedContext> {
    require_role(require_authenticated(ctx)?, UserRole::Student).await
}
