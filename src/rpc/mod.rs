//! RPC Context Layer
//!
//! Every call gets a fresh [`Context`] and passes through the gate chain of
//! its procedure before the handler runs.

pub mod context;
pub mod gates;
pub mod procedures;
pub mod router;
pub mod server;

pub use context::{create_context, Context, RequestMeta, ResponseMeta};
pub use gates::{require_authenticated, require_role, require_student, require_teacher, GatedContext};
pub use router::{Access, CallContext, Router};
pub use server::{HealthResponse, ServerState, RPC_PREFIX};
