//! Configuration for ENAA
//!
//! CLI arguments and environment variable handling using clap, plus the
//! static pedagogical settings in [`app`].

pub mod app;

pub use app::{
    grade_config, mvp_module, AppSettings, GradeConfig, MvpModule, APP_SETTINGS,
};

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::types::{EnaaError, Result};

/// Secret used to sign in-memory access tokens when AUTH_SECRET is unset in dev mode
const DEV_AUTH_SECRET: &str = "dev-only-insecure-secret-do-not-deploy";

/// ENAA - adaptive learning environment core
#[derive(Parser, Debug, Clone)]
#[command(name = "enaa")]
#[command(about = "RPC server for the ENAA adaptive learning environment")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory holding the persisted store snapshot
    #[arg(long, env = "STORAGE_DIR", default_value = "./data")]
    pub storage_dir: PathBuf,

    /// Enable development mode (in-memory backend, required variables not enforced)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Hosted backend base URL (e.g. "https://xyz.supabase.co")
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Public (anonymous) API key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// Service role key, server side only
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY")]
    pub supabase_service_role_key: Option<String>,

    /// Gemma inference endpoint
    #[arg(long, env = "GEMMA_API_URL")]
    pub gemma_api_url: Option<String>,

    #[arg(long, env = "GEMMA_API_KEY")]
    pub gemma_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Secret for signing and validating access tokens
    #[arg(long, env = "AUTH_SECRET")]
    pub auth_secret: Option<String>,

    /// Public URL of the application
    #[arg(long, env = "AUTH_URL")]
    pub auth_url: Option<String>,
}

impl Args {
    /// Every required variable paired with its current value
    fn required(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("SUPABASE_URL", self.supabase_url.as_deref()),
            ("SUPABASE_ANON_KEY", self.supabase_anon_key.as_deref()),
            ("SUPABASE_SERVICE_ROLE_KEY", self.supabase_service_role_key.as_deref()),
            ("GEMMA_API_URL", self.gemma_api_url.as_deref()),
            ("GEMMA_API_KEY", self.gemma_api_key.as_deref()),
            ("OPENAI_API_KEY", self.openai_api_key.as_deref()),
            ("AUTH_SECRET", self.auth_secret.as_deref()),
            ("AUTH_URL", self.auth_url.as_deref()),
        ]
    }

    /// Names of required variables that are unset or empty, in declaration order
    pub fn missing_env(&self) -> Vec<String> {
        missing_vars(&self.required())
    }

    /// Validate configuration
    ///
    /// Outside dev mode every required variable must be present; the error
    /// lists all of the missing ones at once.
    pub fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(EnaaError::Config("LOG_LEVEL must not be empty".to_string()));
        }

        if self.dev_mode {
            return Ok(());
        }

        let missing = self.missing_env();
        if !missing.is_empty() {
            return Err(EnaaError::MissingEnv(missing));
        }

        Ok(())
    }

    /// Get effective auth secret (uses default in dev mode)
    pub fn auth_secret(&self) -> Result<String> {
        match (&self.auth_secret, self.dev_mode) {
            (Some(secret), _) if !secret.is_empty() => Ok(secret.clone()),
            (_, true) => Ok(DEV_AUTH_SECRET.to_string()),
            _ => Err(EnaaError::MissingEnv(vec!["AUTH_SECRET".to_string()])),
        }
    }

    /// Backend URL and anon key, required to talk to the hosted backend
    pub fn backend_endpoint(&self) -> Result<(String, String)> {
        let missing = missing_vars(&self.required()[..2]);
        if !missing.is_empty() {
            return Err(EnaaError::MissingEnv(missing));
        }
        Ok((
            self.supabase_url.clone().unwrap_or_default(),
            self.supabase_anon_key.clone().unwrap_or_default(),
        ))
    }

    /// Full path of the persisted store snapshot
    pub fn storage_path(&self) -> PathBuf {
        self.storage_dir
            .join(format!("{}.json", crate::store::STORAGE_KEY))
    }
}

/// Filter `vars` down to the names whose value is absent or empty
pub fn missing_vars(vars: &[(&'static str, Option<&str>)]) -> Vec<String> {
    vars.iter()
        .filter(|(_, value)| value.map(str::is_empty).unwrap_or(true))
        .map(|(name, _)| name.to_string())
        .collect()
}
