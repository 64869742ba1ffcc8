use async_trait::async_trait;
use atoll_core::repository::RouteRepository;
use atoll_core::route::RouteRecord;
use atoll_core::BoxError;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreRouteRepository {
    pool: PgPool,
}

impl StoreRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    from_location: String,
    to_location: String,
    price: f64,
    duration: i32,
    timings: Option<Vec<String>>,
    display_order: i32,
}

impl From<RouteRow> for RouteRecord {
    fn from(row: RouteRow) -> Self {
        Self {
            id: row.id,
            from_location: row.from_location,
            to_location: row.to_location,
            price: row.price,
            duration_minutes: row.duration,
            timings: row.timings,
            display_order: row.display_order,
        }
    }
}

#[async_trait]
impl RouteRepository for StoreRouteRepository {
    async fn list_routes(&self) -> Result<Vec<RouteRecord>, BoxError> {
        let rows: Vec<RouteRow> = sqlx::query_as(
            r#"
            SELECT id, from_location, to_location, price, duration, timings, display_order
            FROM routes
            ORDER BY display_order, from_location, to_location
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RouteRecord::from).collect())
    }
}
