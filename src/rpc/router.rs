//! Procedure registry
//!
//! Procedures are registered by name with an [`Access`] level. The level
//! decides which gate chain runs before the handler; handlers receive a
//! [`CallContext`] carrying whatever the gates added.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::context::Context;
use super::gates::{self, GatedContext};
use crate::backend::AuthUser;
use crate::schema::UserRole;
use crate::types::{EnaaError, Result};

/// Which gates guard a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No gate
    Public,
    /// `require_authenticated`
    Protected,
    /// `require_authenticated` then the teacher role gate
    Teacher,
    /// `require_authenticated` then the student role gate
    Student,
}

/// Context handed to a procedure handler
#[derive(Debug, Clone)]
pub struct CallContext {
    pub ctx: Context,
    pub user: Option<AuthUser>,
    pub user_role: Option<UserRole>,
}

impl CallContext {
    /// The authenticated user; always present behind any gate
    pub fn user(&self) -> Result<&AuthUser> {
        self.user
            .as_ref()
            .ok_or_else(|| EnaaError::Unauthorized("Authentication required".into()))
    }
}

impl From<GatedContext> for CallContext {
    fn from(gated: GatedContext) -> Self {
        Self {
            ctx: gated.ctx,
            user: Some(gated.user),
            user_role: gated.user_role,
        }
    }
}

type Handler = Arc<dyn Fn(CallContext, Json) -> BoxFuture<'static, Result<Json>> + Send + Sync>;

struct Procedure {
    access: Access,
    handler: Handler,
}

#[derive(Default, Clone)]
pub struct Router {
    procedures: HashMap<String, Arc<Procedure>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure. A later registration under the same name replaces
    /// the earlier one.
    pub fn procedure<F, Fut>(mut self, name: &str, access: Access, handler: F) -> Self
    where
        F: Fn(CallContext, Json) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Json>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx: CallContext, input: Json| handler(ctx, input).boxed());
        self.procedures
            .insert(name.to_string(), Arc::new(Procedure { access, handler }));
        self
    }

    pub fn access(&self, name: &str) -> Option<Access> {
        self.procedures.get(name).map(|p| p.access)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    /// Run the gates for `name`, then its handler
    pub async fn call(&self, name: &str, ctx: Context, input: Json) -> Result<Json> {
        let procedure = self
            .procedures
            .get(name)
            .cloned()
            .ok_or_else(|| EnaaError::NotFound(format!("procedure '{}'", name)))?;

        let call_ctx = apply_gates(procedure.access, ctx).await?;
        debug!(procedure = %name, user = ?call_ctx.user.as_ref().map(|u| &u.id), "Calling procedure");

        (procedure.handler)(call_ctx, input).await
    }
}

async fn apply_gates(access: Access, ctx: Context) -> Result<CallContext> {
    let call_ctx = match access {
        Access::Public => CallContext {
            user: ctx.session.as_ref().map(|s| s.user.clone()),
            ctx,
            user_role: None,
        },
        Access::Protected => gates::require_authenticated(ctx)?.into(),
        Access::Teacher => gates::require_teacher(ctx).await?.into(),
        Access::Student => gates::require_student(ctx).await?.into(),
    };
    Ok(call_ctx)
}
