//! Postgres store backend.
//!
//! Ledger mutations are single-row conditional UPDATEs. `WHERE status = $from`
//! with `rows_affected` as the check-and-set signal. No statement in the
//! ledger path touches more than one row, so the backend stays within the
//! keyed-store contract even though Postgres could do more.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use crate::models::{BookingRecord, BookingStatus, EventInfo, SeatEntry, SeatStatus};

use super::{BookingStore, EventStore, SeatStore, StoreError, TransitionOutcome};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn parse_status(s: &str) -> Result<SeatStatus, StoreError> {
    s.parse().map_err(StoreError::Corrupt)
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    event_id: String,
    seat_id: String,
    status: String,
    price: f64,
    version: i64,
    held_until: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl SeatRow {
    fn into_entry(self) -> Result<SeatEntry, StoreError> {
        Ok(SeatEntry {
            status: parse_status(&self.status)?,
            event_id: self.event_id,
            seat_id: self.seat_id,
            price: self.price,
            version: self.version,
            held_until: self.held_until,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: String,
    user_id: String,
    event_id: String,
    seats: Vec<String>,
    total_amount: f64,
    status: String,
    movie_title: String,
    theatre_name: String,
    show_date: String,
    show_time: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_record(self) -> Result<BookingRecord, StoreError> {
        Ok(BookingRecord {
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            booking_id: self.booking_id,
            user_id: self.user_id,
            event_id: self.event_id,
            seats: self.seats,
            total_amount: self.total_amount,
            movie_title: self.movie_title,
            theatre_name: self.theatre_name,
            show_date: self.show_date,
            show_time: self.show_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl SeatStore for PgStore {
    async fn create_seats_if_absent(&self, entries: &[SeatEntry]) -> Result<u64, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO seats (event_id, seat_id, status, price, version, held_until, updated_at) ",
        );
        qb.push_values(entries, |mut b, e| {
            b.push_bind(&e.event_id)
                .push_bind(&e.seat_id)
                .push_bind(e.status.as_str())
                .push_bind(e.price)
                .push_bind(e.version)
                .push_bind(e.held_until)
                .push_bind(e.updated_at);
        });
        qb.push(" ON CONFLICT (event_id, seat_id) DO NOTHING");

        let res = qb.build().execute(&self.pool).await.map_err(store_err)?;
        Ok(res.rows_affected())
    }

    async fn get_seat(
        &self,
        event_id: &str,
        seat_id: &str,
    ) -> Result<Option<SeatEntry>, StoreError> {
        let row = sqlx::query_as::<_, SeatRow>(
            "SELECT event_id, seat_id, status, price, version, held_until, updated_at
             FROM seats WHERE event_id = $1 AND seat_id = $2",
        )
        .bind(event_id)
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(SeatRow::into_entry).transpose()
    }

    async fn list_seats(&self, event_id: &str) -> Result<Vec<SeatEntry>, StoreError> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT event_id, seat_id, status, price, version, held_until, updated_at
             FROM seats WHERE event_id = $1 ORDER BY seat_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(SeatRow::into_entry).collect()
    }

    async fn update_seat_status(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
        held_until: Option<DateTime<Utc>>,
    ) -> Result<TransitionOutcome, StoreError> {
        // The atomic decision point: one row, precondition in the WHERE clause.
        let version = sqlx::query_scalar::<_, i64>(
            "UPDATE seats
             SET status = $4, held_until = $5, version = version + 1, updated_at = NOW()
             WHERE event_id = $1 AND seat_id = $2 AND status = $3
             RETURNING version",
        )
        .bind(event_id)
        .bind(seat_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(held_until)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        if let Some(version) = version {
            return Ok(TransitionOutcome::Applied { version });
        }

        // Zero rows: either the entry is absent or the precondition failed.
        // The follow-up read is only for diagnosis; the UPDATE above already
        // decided the race.
        let current = sqlx::query_scalar::<_, String>(
            "SELECT status FROM seats WHERE event_id = $1 AND seat_id = $2",
        )
        .bind(event_id)
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match current {
            None => Ok(TransitionOutcome::Missing),
            Some(s) => Ok(TransitionOutcome::Conflict {
                actual: parse_status(&s)?,
            }),
        }
    }

    async fn delete_seats(&self, event_id: &str, seat_ids: &[String]) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM seats WHERE event_id = $1 AND seat_id = ANY($2)")
            .bind(event_id)
            .bind(seat_ids.to_vec())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn put_booking(&self, record: &BookingRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings
               (booking_id, user_id, event_id, seats, total_amount, status,
                movie_title, theatre_name, show_date, show_time, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&record.booking_id)
        .bind(&record.user_id)
        .bind(&record.event_id)
        .bind(record.seats.clone())
        .bind(record.total_amount)
        .bind(record.status.as_str())
        .bind(&record.movie_title)
        .bind(&record.theatre_name)
        .bind(&record.show_date)
        .bind(&record.show_time)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_booking(&self, booking_id: &str) -> Result<Option<BookingRecord>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(BookingRow::into_record).transpose()
    }

    async fn list_bookings_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(BookingRow::into_record).collect()
    }

    async fn list_bookings_by_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE event_id = $1 ORDER BY created_at DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(BookingRow::into_record).collect()
    }

    async fn list_bookings_by_theatre(
        &self,
        theatre_name: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE theatre_name = $1 ORDER BY created_at DESC",
        )
        .bind(theatre_name)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(BookingRow::into_record).collect()
    }

    async fn list_bookings_by_movie(
        &self,
        movie_title: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE movie_title = $1 ORDER BY created_at DESC",
        )
        .bind(movie_title)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(BookingRow::into_record).collect()
    }

    async fn update_booking_seats(
        &self,
        booking_id: &str,
        seats: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE bookings SET seats = $2, updated_at = $3 WHERE booking_id = $1")
            .bind(booking_id)
            .bind(seats.to_vec())
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE booking_id = $1")
            .bind(booking_id)
            .bind(status.as_str())
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: String,
    movie_title: String,
    theatre_name: String,
    show_date: String,
    show_time: String,
    price: f64,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for EventInfo {
    fn from(r: EventRow) -> Self {
        EventInfo {
            event_id: r.event_id,
            movie_title: r.movie_title,
            theatre_name: r.theatre_name,
            show_date: r.show_date,
            show_time: r.show_time,
            price: r.price,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn put_event(&self, event: &EventInfo) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO events
               (event_id, movie_title, theatre_name, show_date, show_time, price, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (event_id) DO UPDATE SET
               movie_title = EXCLUDED.movie_title,
               theatre_name = EXCLUDED.theatre_name,
               show_date = EXCLUDED.show_date,
               show_time = EXCLUDED.show_time,
               price = EXCLUDED.price",
        )
        .bind(&event.event_id)
        .bind(&event.movie_title)
        .bind(&event.theatre_name)
        .bind(&event.show_date)
        .bind(&event.show_time)
        .bind(event.price)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.map(EventInfo::from))
    }

    async fn list_events(&self) -> Result<Vec<EventInfo>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>("SELECT * FROM events ORDER BY event_id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(EventInfo::from).collect())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
