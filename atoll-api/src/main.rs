use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use atoll_api::{
    app,
    state::{AppState, AuthConfig, Backends, Settings},
    worker,
};
use atoll_core::events::EventPublisher;
use atoll_core::notification::ConfirmationMailer;
use atoll_core::otp::OtpService;
use atoll_core::payment::PaymentGateway;
use atoll_order::mock::{MockOtpService, MockPaymentGateway, RecordingMailer};
use atoll_store::app_config::{BookingRules, Config, FunctionsMode, StorageMode};
use atoll_store::memory::{
    sample_routes, InMemoryBookingRepository, InMemoryDraftStore, InMemoryRouteRepository,
    InMemorySavedBookingStore,
};
use atoll_store::{
    DbClient, EventProducer, HostedFunctions, RedisClient, StoreBookingRepository,
    StoreRouteRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atoll_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Atoll API on port {}", config.server.port);

    let (mut backends, rules) = storage_backends(&config).await?;

    match config.functions.mode {
        FunctionsMode::Remote => {
            let functions = Arc::new(
                HostedFunctions::new(&config.functions)
                    .context("Failed to build hosted functions client")?,
            );
            backends.gateway = functions.clone();
            backends.mailer = functions.clone();
            backends.otp = functions;
        }
        FunctionsMode::Mock => tracing::warn!("Hosted functions mocked: payments are simulated"),
    }

    if config.kafka.enabled {
        let producer = EventProducer::new(&config.kafka.brokers)
            .context("Failed to create Kafka producer")?;
        backends.events = Some(Arc::new(producer) as Arc<dyn EventPublisher>);
    }

    let settings = Settings {
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rules,
        sign_method: config.functions.sign_method.clone(),
        origin: config.functions.origin.clone(),
        rate_limit_per_minute: config.server.rate_limit_per_minute,
    };
    let state = AppState::new(backends, settings).context("Failed to register metrics")?;

    let snapshot = state.directory.refresh().await;
    tracing::info!("Route directory loaded with {} routes", snapshot.routes.len());

    // Route change feed: Kafka worker -> broadcast -> directory refetch
    let (routes_tx, routes_rx) = tokio::sync::broadcast::channel(100);
    tokio::spawn(state.directory.clone().watch(routes_rx));
    if config.kafka.enabled {
        tokio::spawn(worker::start_routes_worker(
            config.kafka.brokers.clone(),
            config.kafka.group_id.clone(),
            routes_tx,
        ));
    }

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Repositories and stores for the configured storage mode, with mocked hosted functions.
async fn storage_backends(config: &Config) -> anyhow::Result<(Backends, BookingRules)> {
    let gateway: Arc<dyn PaymentGateway> = Arc::new(MockPaymentGateway::new());
    let mailer: Arc<dyn ConfirmationMailer> = Arc::new(RecordingMailer::new());
    let otp: Arc<dyn OtpService> = Arc::new(MockOtpService::default());

    match config.storage.mode {
        StorageMode::Memory => {
            tracing::warn!("Memory storage: drafts and bookings are lost on restart");
            let backends = Backends {
                routes: Arc::new(InMemoryRouteRepository::new(sample_routes())),
                bookings: Arc::new(InMemoryBookingRepository::new()),
                drafts: Arc::new(InMemoryDraftStore::new()),
                saved: Arc::new(InMemorySavedBookingStore::new()),
                gateway,
                mailer,
                otp,
                events: None,
                rate_limiter: None,
            };
            Ok((backends, config.booking.clone()))
        }
        StorageMode::Postgres => {
            let db = DbClient::new(&config.database.url)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let rules = match db.fetch_booking_rules(config.booking.clone()).await {
                Ok(rules) => rules,
                Err(e) => {
                    tracing::warn!("Using configured booking rules, table unreadable: {}", e);
                    config.booking.clone()
                }
            };

            let redis = Arc::new(
                RedisClient::new(&config.redis.url, rules.draft_ttl_seconds)
                    .await
                    .context("Failed to connect to Redis")?,
            );

            let backends = Backends {
                routes: Arc::new(StoreRouteRepository::new(db.pool.clone())),
                bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
                drafts: redis.clone(),
                saved: redis.clone(),
                gateway,
                mailer,
                otp,
                events: None,
                rate_limiter: Some(redis),
            };
            Ok((backends, rules))
        }
    }
}
