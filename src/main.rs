use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use branch_locator::config::{LogFormat, LoggingSettings, Settings};
use branch_locator::core::{BranchCatalog, BranchSelector, QueueManager};
use branch_locator::models::{BranchType, ScoringWeights};
use branch_locator::routes::{self, AppState};
use branch_locator::services::{GeoStore, LogNotifier, MapCache, Notifier, PostgresGeoStore, WebhookNotifier};
use branch_locator::tasks::run_daily_notifier;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Install the global subscriber; RUST_LOG wins over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration, then logging as configured
    let settings = match Settings::load() {
        Ok(settings) => {
            init_tracing(&settings.logging);
            settings
        }
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            return Err(startup_error("Configuration error", e));
        }
    };

    info!("Starting branch locator service...");

    let booking = settings
        .booking
        .policy()
        .map_err(|e| startup_error("Configuration error", e))?;
    let trigger_at = settings
        .notifier
        .trigger_at()
        .map_err(|e| startup_error("Configuration error", e))?;

    info!("Configuration loaded successfully");

    // Initialize PostgreSQL store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = PostgresGeoStore::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| startup_error("PostgreSQL connection error", e))?;
    let store: Arc<dyn GeoStore> = Arc::new(postgres);

    info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);

    // Load both catalogs once; they are read-only for the process lifetime
    let catalog = Arc::new(
        BranchCatalog::load(store.as_ref(), BranchType::Office)
            .await
            .map_err(|e| startup_error("Failed to load branch catalog", e))?,
    );
    let atm_catalog = Arc::new(
        BranchCatalog::load(store.as_ref(), BranchType::Atm)
            .await
            .map_err(|e| startup_error("Failed to load ATM catalog", e))?,
    );

    info!("Catalogs loaded ({} offices, {} ATMs)", catalog.len(), atm_catalog.len());

    let weights: ScoringWeights = (&settings.scoring.weights).into();
    let limits = settings.selection.limits();
    let selector = BranchSelector::new(catalog.clone(), store.clone(), weights, limits);
    let atm_selector = BranchSelector::new(atm_catalog, store.clone(), weights, limits);
    let queue = QueueManager::with_policy(catalog, store.clone(), booking);

    info!("Selector initialized with weights: {:?}", weights);

    let map_cache = Arc::new(MapCache::new(settings.cache.map_cache_size, settings.cache.map_ttl_secs));

    let notifier: Arc<dyn Notifier> = match &settings.notifier.webhook_url {
        Some(url) => Arc::new(
            WebhookNotifier::new(store.clone(), url.clone(), settings.notifier.timeout_secs)
                .map_err(|e| startup_error("Failed to build webhook notifier", e))?,
        ),
        None => {
            info!("No notifier webhook configured, daily reminders will be logged");
            Arc::new(LogNotifier::new(store.clone()))
        }
    };

    let cancel_token = CancellationToken::new();
    let notifier_task = tokio::spawn(run_daily_notifier(notifier, trigger_at, cancel_token.clone()));

    // Build application state
    let app_state = AppState::new(selector, atm_selector, queue, store, map_cache);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    info!("HTTP server stopped, shutting down background tasks");
    cancel_token.cancel();
    if let Err(e) = notifier_task.await {
        error!("Daily notifier task failed: {}", e);
    }

    result
}
