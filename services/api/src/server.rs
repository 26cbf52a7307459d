use crate::cli::ServeArgs;
use crate::infra::{seed_demo_catalog, AppState};
use crate::routes::{api_router, with_operational_routes};
use axum_prometheus::PrometheusMetricLayer;
use learnhub::auth::TokenVerifier;
use learnhub::config::AppConfig;
use learnhub::error::AppError;
use learnhub::store::{MemoryStore, PgStore};
use learnhub::telemetry;
use learnhub::workflows::certifications::CertificateGenerator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let verifier = TokenVerifier::from_config(&config.auth);
    let generator = CertificateGenerator::new(config.certification.expiry_years);

    let api = if config.database.url.is_some() {
        let store = PgStore::connect(&config.database).await?;
        store.migrate().await?;
        info!(
            max_connections = config.database.max_connections,
            "postgres store connected and migrated"
        );
        api_router(Arc::new(store), verifier, generator)
    } else {
        warn!("DATABASE_URL is not set; serving a seeded in-memory catalog");
        let store = MemoryStore::new();
        let catalog = seed_demo_catalog(&store)?;
        info!(
            learner_user_id = %catalog.learner_user,
            employee_id = %catalog.learner.id,
            assessment_id = %catalog.assessment.id,
            "demo catalog seeded"
        );
        api_router(Arc::new(store), verifier, generator)
    };

    let app = with_operational_routes(api, app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "learning platform api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
