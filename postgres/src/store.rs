//! `PostgresStore`: every persistence trait over one connection pool.

use crate::rows::{
    BookingRow, MovieRow, ShowRow, TheatreRow, UserRow, seats_to_column, storage_error, to_i32,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use showtime_core::providers::{BookingStore, CatalogStore, ShowStore};
use showtime_core::{
    Booking, BookingError, CommittedBooking, Movie, MovieId, NewBooking, Result, Show, ShowId,
    Theatre, TheatreId, User, UserId,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

const SHOW_COLUMNS: &str = "id, movie_id, theatre_id, language, start_at, end_at, \
     ticket_price, total_seats, booked_seats, version";

const UNIQUE_VIOLATION: &str = "23505";

/// Pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL store for shows, bookings and catalog.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the database is unreachable.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await
            .map_err(storage_error("connect"))?;
        Ok(Self::from_pool(pool))
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::Storage(format!("Migration failed: {e}")))
    }

    /// Insert or replace a user.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the write fails.
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email, role = EXCLUDED.role
            ",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error("upsert user"))?;
        Ok(())
    }

    /// Insert or replace a movie.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the write fails.
    pub async fn upsert_movie(&self, movie: &Movie) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO movies
                (id, title, description, duration_minutes, genres, languages, release_date, certificate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                duration_minutes = EXCLUDED.duration_minutes,
                genres = EXCLUDED.genres,
                languages = EXCLUDED.languages,
                release_date = EXCLUDED.release_date,
                certificate = EXCLUDED.certificate
            ",
        )
        .bind(movie.id.as_uuid())
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(to_i32(movie.duration_minutes, "duration_minutes")?)
        .bind(&movie.genres)
        .bind(&movie.languages)
        .bind(movie.release_date)
        .bind(&movie.certificate)
        .execute(&self.pool)
        .await
        .map_err(storage_error("upsert movie"))?;
        Ok(())
    }

    /// Insert or replace a theatre.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if the write fails.
    pub async fn upsert_theatre(&self, theatre: &Theatre) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO theatres (id, name, address, owner_id, phone, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                address = EXCLUDED.address,
                owner_id = EXCLUDED.owner_id,
                phone = EXCLUDED.phone,
                is_approved = EXCLUDED.is_approved
            ",
        )
        .bind(theatre.id.as_uuid())
        .bind(&theatre.name)
        .bind(&theatre.address)
        .bind(theatre.owner_id.as_uuid())
        .bind(&theatre.phone)
        .bind(theatre.is_approved)
        .execute(&self.pool)
        .await
        .map_err(storage_error("upsert theatre"))?;
        Ok(())
    }

    async fn fetch_shows(&self, filter: &str, id: uuid::Uuid) -> Result<Vec<Show>> {
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE {filter} = $1");
        let rows: Vec<ShowRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("list shows"))?;
        rows.into_iter().map(Show::try_from).collect()
    }

    /// Delete a catalog row (its shows cascade) unless a show referencing it
    /// starts after `now`.
    ///
    /// The row is locked first. Inserting a show takes a key-share lock on
    /// the referenced row, so concurrent schedulers wait for this
    /// transaction and the upcoming-show check sees every committed show.
    async fn delete_unless_upcoming(
        &self,
        table: &'static str,
        show_column: &'static str,
        id: uuid::Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("start transaction"))?;

        let locked = sqlx::query(&format!("SELECT 1 FROM {table} WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error("lock catalog row"))?;
        if locked.is_none() {
            return Ok(true);
        }

        let (upcoming,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS (SELECT 1 FROM shows WHERE {show_column} = $1 AND start_at > $2)"
        ))
        .bind(id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error("check upcoming shows"))?;
        if upcoming {
            return Ok(false);
        }

        sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("delete catalog row"))?;
        tx.commit().await.map_err(storage_error("commit delete"))?;
        Ok(true)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

#[async_trait]
impl ShowStore for PostgresStore {
    async fn get_show(&self, id: ShowId) -> Result<Option<Show>> {
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1");
        sqlx::query_as::<_, ShowRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("load show"))?
            .map(Show::try_from)
            .transpose()
    }

    async fn shows_in_theatre(&self, theatre_id: TheatreId) -> Result<Vec<Show>> {
        self.fetch_shows("theatre_id", *theatre_id.as_uuid()).await
    }

    async fn shows_for_movie(&self, movie_id: MovieId) -> Result<Vec<Show>> {
        self.fetch_shows("movie_id", *movie_id.as_uuid()).await
    }

    async fn shows_for_movie_between(
        &self,
        movie_id: MovieId,
        language: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>> {
        let sql = format!(
            "SELECT {SHOW_COLUMNS} FROM shows \
             WHERE movie_id = $1 AND language = $2 AND start_at >= $3 AND start_at < $4 \
             ORDER BY start_at ASC, id ASC"
        );
        let rows: Vec<ShowRow> = sqlx::query_as(&sql)
            .bind(movie_id.as_uuid())
            .bind(language)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("list movie shows"))?;
        rows.into_iter().map(Show::try_from).collect()
    }

    async fn page_theatre_shows(
        &self,
        theatre_id: TheatreId,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Show>, u64)> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shows WHERE theatre_id = $1")
            .bind(theatre_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("count shows"))?;

        let sql = format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE theatre_id = $1 \
             ORDER BY start_at ASC, id ASC OFFSET $2 LIMIT $3"
        );
        let rows: Vec<ShowRow> = sqlx::query_as(&sql)
            .bind(theatre_id.as_uuid())
            .bind(i64::try_from(skip).unwrap_or(i64::MAX))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("page shows"))?;

        let shows = rows.into_iter().map(Show::try_from).collect::<Result<_>>()?;
        Ok((shows, u64::try_from(total).unwrap_or_default()))
    }

    async fn insert_show(&self, show: &Show) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO shows
                (id, movie_id, theatre_id, language, start_at, end_at,
                 ticket_price, total_seats, booked_seats, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(show.id.as_uuid())
        .bind(show.movie_id.as_uuid())
        .bind(show.theatre_id.as_uuid())
        .bind(&show.language)
        .bind(show.start)
        .bind(show.end)
        .bind(to_i32(show.ticket_price, "ticket_price")?)
        .bind(to_i32(show.total_seats, "total_seats")?)
        .bind(seats_to_column(&show.booked_seats)?)
        .bind(show.version)
        .execute(&self.pool)
        .await
        .map_err(storage_error("insert show"))?;
        Ok(())
    }

    async fn replace_unbooked_show(&self, show: &Show, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE shows
            SET movie_id = $2,
                theatre_id = $3,
                language = $4,
                start_at = $5,
                end_at = $6,
                ticket_price = $7,
                total_seats = $8,
                version = version + 1
            WHERE id = $1 AND version = $9 AND cardinality(booked_seats) = 0
            ",
        )
        .bind(show.id.as_uuid())
        .bind(show.movie_id.as_uuid())
        .bind(show.theatre_id.as_uuid())
        .bind(&show.language)
        .bind(show.start)
        .bind(show.end)
        .bind(to_i32(show.ticket_price, "ticket_price")?)
        .bind(to_i32(show.total_seats, "total_seats")?)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(storage_error("update show"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_show(&self, id: ShowId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shows WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_error("delete show"))?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn commit_booking(
        &self,
        booking: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<CommittedBooking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("start transaction"))?;

        // Row lock: concurrent commits on this show queue here.
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1 FOR UPDATE");
        let mut show: Show = sqlx::query_as::<_, ShowRow>(&sql)
            .bind(booking.show_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error("lock show"))?
            .ok_or_else(|| BookingError::not_found("Show", booking.show_id))?
            .try_into()?;

        let (already_used,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM bookings WHERE transaction_id = $1)")
                .bind(&booking.transaction_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage_error("check payment"))?;
        if already_used {
            return Err(BookingError::DuplicatePayment {
                payment_id: booking.transaction_id,
            });
        }

        show.apply_booking(&booking.seats)?;
        let seats = seats_to_column(&booking.seats)?;

        sqlx::query(
            r"
            UPDATE shows
            SET booked_seats = booked_seats || $2, version = version + 1
            WHERE id = $1
            ",
        )
        .bind(booking.show_id.as_uuid())
        .bind(&seats)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("append seats"))?;

        let amount = i64::try_from(booking.amount)
            .map_err(|_| BookingError::invalid("amount is too large"))?;
        let booking: Booking = booking.into_booking(now);

        sqlx::query(
            r"
            INSERT INTO bookings (id, show_id, user_id, seats, amount, transaction_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.show_id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(&seats)
        .bind(amount)
        .bind(&booking.transaction_id)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookingError::DuplicatePayment {
                    payment_id: booking.transaction_id.clone(),
                }
            } else {
                BookingError::Storage(format!("insert booking: {e}"))
            }
        })?;

        tx.commit().await.map_err(storage_error("commit booking"))?;

        tracing::debug!(
            show_id = %show.id,
            version = show.version,
            booked = show.booked_seats.len(),
            "Seats committed"
        );
        metrics::counter!("showtime.postgres.commits").increment(1);

        Ok(CommittedBooking { booking, show })
    }

    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r"
            SELECT id, show_id, user_id, seats, amount, transaction_id, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("list bookings"))?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        sqlx::query_as::<_, MovieRow>(
            r"
            SELECT id, title, description, duration_minutes, genres, languages,
                   release_date, certificate
            FROM movies
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("load movie"))?
        .map(Movie::try_from)
        .transpose()
    }

    async fn get_theatre(&self, id: TheatreId) -> Result<Option<Theatre>> {
        let row = sqlx::query_as::<_, TheatreRow>(
            "SELECT id, name, address, owner_id, phone, is_approved FROM theatres WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("load theatre"))?;
        Ok(row.map(Theatre::from))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("load user"))?
            .map(User::try_from)
            .transpose()
    }

    async fn update_movie(&self, movie: &Movie) -> Result<()> {
        self.upsert_movie(movie).await
    }

    async fn delete_movie(&self, id: MovieId, now: DateTime<Utc>) -> Result<bool> {
        self.delete_unless_upcoming("movies", "movie_id", *id.as_uuid(), now)
            .await
    }

    async fn delete_theatre(&self, id: TheatreId, now: DateTime<Utc>) -> Result<bool> {
        self.delete_unless_upcoming("theatres", "theatre_id", *id.as_uuid(), now)
            .await
    }
}
