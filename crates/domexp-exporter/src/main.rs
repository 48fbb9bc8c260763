//! Domain expiration exporter
//!
//! - Lists every zone of each Cloudflare token in `CF_API_KEYS`
//! - Looks up registration expiry over WHOIS, hourly, with manual overrides
//! - Serves `domain_expiration_checker_result` on `/metrics`

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use domexp_core::error::{ExpiryError, Result};
use domexp_exporter::account::{AccountClient, CloudflareAccount};
use domexp_exporter::checker::Checker;
use domexp_exporter::expiration::ExpirationService;
use domexp_exporter::oracle::WhoisOracle;
use domexp_exporter::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::from_env()?;
    let listen = cfg.listen_addr()?;

    let mut accounts: Vec<Arc<dyn AccountClient>> = Vec::with_capacity(cfg.api_keys.len());
    for key in &cfg.api_keys {
        accounts.push(Arc::new(CloudflareAccount::connect(key).await?));
    }

    let manual = config::load_manual_expirations(&cfg.manual_expiration_file)?;
    tracing::info!(domains = manual.len(), file = %cfg.manual_expiration_file, "manual expirations loaded");

    let lookup = ExpirationService::new(Arc::new(WhoisOracle::new()), manual);
    let checker = Arc::new(
        Checker::new(accounts, Arc::new(lookup))
            .with_interval(cfg.check_interval())
            .with_exhausted_policy(cfg.on_lookup_exhausted),
    );
    tokio::spawn(Arc::clone(&checker).start());

    let app = router::build_router(AppState::new(checker));

    tracing::info!(%listen, "starting http server");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ExpiryError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ExpiryError::Internal(format!("http server failed: {e}")))
}
