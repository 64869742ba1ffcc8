pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod functions;
pub mod memory;
pub mod redis_repo;
pub mod route_repo;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use functions::HostedFunctions;
pub use redis_repo::RedisClient;
pub use route_repo::StoreRouteRepository;
