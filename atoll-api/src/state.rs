use std::sync::Arc;

use atoll_catalog::directory::RouteDirectory;
use atoll_catalog::pricing::{FareCalculator, FareConfig};
use atoll_core::events::EventPublisher;
use atoll_core::notification::ConfirmationMailer;
use atoll_core::otp::OtpService;
use atoll_core::payment::PaymentGateway;
use atoll_core::repository::{BookingRepository, DraftStore, RouteRepository, SavedBookingStore};
use atoll_order::{
    BookingLookup, BookingPersister, Checkout, CheckoutSettings, DraftManager, Notifier,
    PaymentOrchestrator, SavedBookings,
};
use atoll_store::app_config::BookingRules;
use atoll_store::RedisClient;

use crate::metrics::Metrics;
use crate::middleware::resiliency::ResiliencyState;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Concrete collaborators, chosen by `main` from configuration (or by tests).
pub struct Backends {
    pub routes: Arc<dyn RouteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub drafts: Arc<dyn DraftStore>,
    pub saved: Arc<dyn SavedBookingStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn ConfirmationMailer>,
    pub otp: Arc<dyn OtpService>,
    pub events: Option<Arc<dyn EventPublisher>>,
    pub rate_limiter: Option<Arc<RedisClient>>,
}

pub struct Settings {
    pub auth: AuthConfig,
    pub rules: BookingRules,
    pub sign_method: String,
    pub origin: String,
    pub rate_limit_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RouteDirectory>,
    pub drafts: Arc<DraftManager>,
    pub checkout: Arc<Checkout>,
    pub saved: Arc<SavedBookings>,
    pub lookup: Arc<BookingLookup>,
    pub fares: FareCalculator,
    pub rate_limiter: Option<Arc<RedisClient>>,
    pub rate_limit_per_minute: i64,
    pub resiliency: Arc<ResiliencyState>,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(backends: Backends, settings: Settings) -> Result<Self, prometheus::Error> {
        let fares = FareCalculator::new(FareConfig {
            per_passenger_cents: settings.rules.fare_per_passenger_cents,
            currency: settings.rules.currency.clone(),
        });
        let drafts = Arc::new(DraftManager::new(backends.drafts));

        let mut checkout = Checkout::new(
            drafts.clone(),
            fares.clone(),
            PaymentOrchestrator::new(backends.gateway, settings.sign_method),
            BookingPersister::new(backends.bookings.clone()),
            Notifier::new(backends.mailer, settings.origin),
            CheckoutSettings {
                persist_before_payment: settings.rules.persist_before_payment,
            },
        );
        if let Some(events) = backends.events {
            checkout = checkout.with_events(events);
        }

        Ok(Self {
            directory: Arc::new(RouteDirectory::new(backends.routes)),
            drafts,
            checkout: Arc::new(checkout),
            saved: Arc::new(SavedBookings::new(backends.saved, settings.rules.saved_bookings_cap)),
            lookup: Arc::new(BookingLookup::new(backends.otp, backends.bookings)),
            fares,
            rate_limiter: backends.rate_limiter,
            rate_limit_per_minute: settings.rate_limit_per_minute,
            resiliency: Arc::new(ResiliencyState::default()),
            metrics: Arc::new(Metrics::new()?),
            auth: settings.auth,
        })
    }
}
