//! ENAA - adaptive learning environment core
//!
//! ## Components
//!
//! - **Auth**: session bridge over the identity provider and profile resolution
//! - **Backend**: hosted (REST) and in-memory implementations of the identity
//!   and profile traits
//! - **Store**: application state container with a closed action catalogue,
//!   change notifications and snapshot persistence
//! - **Schema**: data shapes for every persisted entity
//! - **RPC**: per-call context, authorization gates and the HTTP surface

pub mod auth;
pub mod backend;
pub mod config;
pub mod rpc;
pub mod schema;
pub mod store;
pub mod types;

pub use config::Args;
pub use rpc::server::{run, serve};
pub use store::AppStore;
pub use types::{EnaaError, Result};
