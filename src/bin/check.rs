//! enaa-check: verify the hosted backend is reachable and its tables readable
//!
//! Reads the same environment as the server (`SUPABASE_URL`,
//! `SUPABASE_ANON_KEY`, optionally `SUPABASE_SERVICE_ROLE_KEY`).

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enaa::{
    backend::HttpBackend,
    config::Args,
    schema::{
        LearningModuleRow, CLASS_TABLE, LEARNING_ANALYTICS_TABLE, LEARNING_MODULE_TABLE,
        PROFILE_TABLE, SEQUENCE_TABLE, STUDENT_PROGRESS_TABLE, ACTIVITY_TABLE,
    },
};

const TABLES: [&str; 7] = [
    PROFILE_TABLE,
    CLASS_TABLE,
    LEARNING_MODULE_TABLE,
    SEQUENCE_TABLE,
    ACTIVITY_TABLE,
    STUDENT_PROGRESS_TABLE,
    LEARNING_ANALYTICS_TABLE,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("enaa={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (url, anon_key) = args.backend_endpoint()?;
    let mut backend = HttpBackend::new(url, anon_key);
    match args.supabase_service_role_key.clone() {
        Some(key) if !key.is_empty() => backend = backend.with_service_key(key),
        _ => warn!("SUPABASE_SERVICE_ROLE_KEY not set, row-level security applies"),
    }

    info!("Checking {}", backend.base_url());

    let mut failures = 0;
    for table in TABLES {
        match backend.probe(table).await {
            Ok(rows) => info!("  {:<20} ok ({} row sampled)", table, rows),
            Err(e) => {
                error!("  {:<20} FAILED: {}", table, e);
                failures += 1;
            }
        }
    }

    match backend
        .select::<LearningModuleRow>("is_active=eq.true&order=order_index.asc")
        .await
    {
        Ok(modules) => {
            info!("{} active module(s)", modules.len());
            for module in modules {
                info!("  [{}] {} ({})", module.grade_level, module.name, module.id);
            }
        }
        Err(e) => {
            error!("Listing modules failed: {}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} check(s) failed", failures);
    }
    info!("Backend looks healthy");
    Ok(())
}
