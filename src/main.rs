//! ENAA - adaptive learning environment core

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enaa::{
    auth::{AuthBridge, LogNavigator, TokenIssuer, ACCESS_TOKEN_LIFETIME},
    backend::{HttpBackend, MemoryBackend, SharedBackend},
    config::Args,
    rpc::{procedures, ServerState},
    schema::{GradeLevel, UserRole},
    store::{AppStore, FileStorage},
};

/// Password for the accounts seeded in development mode
const DEMO_PASSWORD: &str = "enaa-demo-2024";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("enaa={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  ENAA - adaptive learning core");
    info!("======================================");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Store snapshot: {}", args.storage_path().display());
    info!("======================================");

    let backend: SharedBackend = if args.dev_mode {
        Arc::new(dev_backend(&args)?)
    } else {
        let (url, anon_key) = args.backend_endpoint()?;
        info!("Backend: {}", url);
        let mut backend = HttpBackend::new(url, anon_key);
        if let Some(key) = args.supabase_service_role_key.clone() {
            backend = backend.with_service_key(key);
        }
        Arc::new(backend)
    };

    // Local session mirror: store + bridge kept in sync with the backend session
    let store = AppStore::open(Arc::new(FileStorage::new(args.storage_path())));
    let bridge = AuthBridge::new(backend.clone(), store.clone(), Arc::new(LogNavigator));
    let _subscription = bridge.subscribe();
    if let Some(outcome) = bridge.reconcile().await {
        info!(?outcome, "Existing session reconciled");
    }

    store.spawn_change_logger();

    let state = Arc::new(ServerState::new(backend, procedures::router(), args.dev_mode));
    enaa::run(args.listen, state).await?;

    Ok(())
}

fn dev_backend(args: &Args) -> anyhow::Result<MemoryBackend> {
    let tokens = TokenIssuer::new(&args.auth_secret()?, ACCESS_TOKEN_LIFETIME)?;
    let backend = MemoryBackend::new(tokens);

    let demo = [
        ("enseignant@enaa.dev", UserRole::Teacher, "Mme Martin", None),
        ("eleve.cp@enaa.dev", UserRole::Student, "Léo", Some(GradeLevel::Cp)),
        ("eleve.ce1@enaa.dev", UserRole::Student, "Inès", Some(GradeLevel::Ce1)),
    ];
    for (email, role, name, grade) in demo {
        backend.seed_account(email, DEMO_PASSWORD, role, name, grade)?;
        info!("Demo account: {} ({})", email, role);
    }
    warn!("Demo accounts share the password '{}'", DEMO_PASSWORD);

    Ok(backend)
}
