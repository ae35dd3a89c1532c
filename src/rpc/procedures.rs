//! Built-in procedures

use serde_json::{json, Value as Json};

use super::router::{Access, CallContext, Router};
use crate::config::{grade_config, APP_SETTINGS};
use crate::schema::Profile;
use crate::types::{EnaaError, Result};

/// Router with every built-in procedure registered
pub fn router() -> Router {
    Router::new()
        .procedure("session.get", Access::Public, session_get)
        .procedure("config.app", Access::Public, app_settings)
        .procedure("profile.me", Access::Protected, profile_me)
        .procedure("config.grade", Access::Student, grade_for_caller)
        .procedure("modules.mvp", Access::Teacher, mvp_modules)
}

async fn session_get(ctx: CallContext, _input: Json) -> Result<Json> {
    Ok(match ctx.ctx.session {
        Some(session) => json!({
            "user": session.user,
            "expiresAt": session.expires_at,
        }),
        None => json!({ "user": null }),
    })
}

async fn app_settings(_ctx: CallContext, _input: Json) -> Result<Json> {
    Ok(serde_json::to_value(&APP_SETTINGS)?)
}

async fn mvp_modules(_ctx: CallContext, _input: Json) -> Result<Json> {
    Ok(serde_json::to_value(APP_SETTINGS.mvp_modules)?)
}

async fn caller_profile(ctx: &CallContext) -> Result<Profile> {
    let user = ctx.user()?;
    let row = ctx
        .ctx
        .backend
        .fetch_profile(&user.id)
        .await?
        .ok_or_else(|| EnaaError::ProfileLookup(format!("no profile for user {}", user.id)))?;
    Profile::from_row(row)
}

async fn profile_me(ctx: CallContext, _input: Json) -> Result<Json> {
    let profile = caller_profile(&ctx).await?;
    Ok(serde_json::to_value(profile)?)
}

/// Per-grade tuning for the calling student
async fn grade_for_caller(ctx: CallContext, _input: Json) -> Result<Json> {
    let profile = caller_profile(&ctx).await?;
    let grade = profile
        .grade_level
        .ok_or_else(|| EnaaError::BadRequest("student has no grade level".into()))?;

    Ok(json!({
        "gradeLevel": grade,
        "config": grade_config(grade),
    }))
}
