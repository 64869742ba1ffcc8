use async_trait::async_trait;
use atoll_core::booking::{BookingRecord, NewBooking, Passenger, PaymentReference};
use atoll_core::repository::BookingRepository;
use atoll_core::BoxError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, user_email, from_location, to_location, departure_time, \
    departure_date, return_trip, return_from_location, return_to_location, return_time, \
    return_date, passenger_count, payment_complete, payment_reference, passenger_info, \
    activity, is_activity_booking, created_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_email: String,
    from_location: Option<String>,
    to_location: Option<String>,
    departure_time: Option<String>,
    departure_date: NaiveDate,
    return_trip: bool,
    return_from_location: Option<String>,
    return_to_location: Option<String>,
    return_time: Option<String>,
    return_date: Option<NaiveDate>,
    passenger_count: i32,
    payment_complete: bool,
    payment_reference: Option<String>,
    passenger_info: Json<Vec<Passenger>>,
    activity: Option<String>,
    is_activity_booking: bool,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for BookingRecord {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            booking: NewBooking {
                user_email: row.user_email,
                from_location: row.from_location,
                to_location: row.to_location,
                departure_time: row.departure_time,
                departure_date: row.departure_date,
                return_trip: row.return_trip,
                return_from_location: row.return_from_location,
                return_to_location: row.return_to_location,
                return_time: row.return_time,
                return_date: row.return_date,
                passenger_count: row.passenger_count,
                payment_complete: row.payment_complete,
                payment_reference: row.payment_reference,
                passenger_info: row.passenger_info.0,
                activity: row.activity,
                is_activity_booking: row.is_activity_booking,
            },
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingRecord, BoxError> {
        let sql = format!(
            r#"
            INSERT INTO bookings (
                user_email, from_location, to_location, departure_time, departure_date,
                return_trip, return_from_location, return_to_location, return_time, return_date,
                passenger_count, payment_complete, payment_reference, passenger_info,
                activity, is_activity_booking
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {BOOKING_COLUMNS}
            "#
        );

        let row: BookingRow = sqlx::query_as(&sql)
            .bind(&booking.user_email)
            .bind(&booking.from_location)
            .bind(&booking.to_location)
            .bind(&booking.departure_time)
            .bind(booking.departure_date)
            .bind(booking.return_trip)
            .bind(&booking.return_from_location)
            .bind(&booking.return_to_location)
            .bind(&booking.return_time)
            .bind(booking.return_date)
            .bind(booking.passenger_count)
            .bind(booking.payment_complete)
            .bind(&booking.payment_reference)
            .bind(Json(&booking.passenger_info))
            .bind(&booking.activity)
            .bind(booking.is_activity_booking)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn mark_paid(&self, id: Uuid, reference: &PaymentReference) -> Result<bool, BoxError> {
        let result = sqlx::query(
            "UPDATE bookings SET payment_complete = TRUE WHERE id = $1 AND payment_reference = $2",
        )
        .bind(id)
        .bind(reference.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<BookingRecord>, BoxError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE lower(user_email) = lower($1) ORDER BY created_at DESC"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }

    async fn find_by_reference_and_email(
        &self,
        reference: &PaymentReference,
        email: &str,
    ) -> Result<Vec<BookingRecord>, BoxError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE payment_reference = $1 AND lower(user_email) = lower($2) \
             ORDER BY created_at DESC"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(reference.as_str())
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }
}
