//! Row types and conversions between column types and domain types.

use chrono::{DateTime, NaiveDate, Utc};
use showtime_core::{
    Booking, BookingError, BookingId, Movie, MovieId, Result, Role, Show, ShowId, Theatre,
    TheatreId, User, UserId,
};
use uuid::Uuid;

pub(crate) fn storage_error(context: &str) -> impl FnOnce(sqlx::Error) -> BookingError + '_ {
    move |e| BookingError::Storage(format!("{context}: {e}"))
}

pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| BookingError::invalid(format!("{column} value {value} is too large")))
}

pub(crate) fn seats_to_column(seats: &[u32]) -> Result<Vec<i32>> {
    seats.iter().map(|seat| to_i32(*seat, "seat")).collect()
}

fn from_i32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| BookingError::Storage(format!("negative {column} in database: {value}")))
}

fn seats_from_column(seats: Vec<i32>) -> Result<Vec<u32>> {
    seats.into_iter().map(|seat| from_i32(seat, "seat")).collect()
}

#[derive(sqlx::FromRow)]
pub(crate) struct ShowRow {
    id: Uuid,
    movie_id: Uuid,
    theatre_id: Uuid,
    language: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    ticket_price: i32,
    total_seats: i32,
    booked_seats: Vec<i32>,
    version: i64,
}

impl TryFrom<ShowRow> for Show {
    type Error = BookingError;

    fn try_from(row: ShowRow) -> Result<Self> {
        Ok(Self {
            id: ShowId::from_uuid(row.id),
            movie_id: MovieId::from_uuid(row.movie_id),
            theatre_id: TheatreId::from_uuid(row.theatre_id),
            language: row.language,
            start: row.start_at,
            end: row.end_at,
            ticket_price: from_i32(row.ticket_price, "ticket_price")?,
            total_seats: from_i32(row.total_seats, "total_seats")?,
            booked_seats: seats_from_column(row.booked_seats)?,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    show_id: Uuid,
    user_id: Uuid,
    seats: Vec<i32>,
    amount: i64,
    transaction_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            show_id: ShowId::from_uuid(row.show_id),
            user_id: UserId::from_uuid(row.user_id),
            seats: seats_from_column(row.seats)?,
            amount: u64::try_from(row.amount).map_err(|_| {
                BookingError::Storage(format!("negative amount in database: {}", row.amount))
            })?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MovieRow {
    id: Uuid,
    title: String,
    description: String,
    duration_minutes: i32,
    genres: Vec<String>,
    languages: Vec<String>,
    release_date: NaiveDate,
    certificate: String,
}

impl TryFrom<MovieRow> for Movie {
    type Error = BookingError;

    fn try_from(row: MovieRow) -> Result<Self> {
        Ok(Self {
            id: MovieId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            duration_minutes: from_i32(row.duration_minutes, "duration_minutes")?,
            genres: row.genres,
            languages: row.languages,
            release_date: row.release_date,
            certificate: row.certificate,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TheatreRow {
    id: Uuid,
    name: String,
    address: String,
    owner_id: Uuid,
    phone: String,
    is_approved: bool,
}

impl From<TheatreRow> for Theatre {
    fn from(row: TheatreRow) -> Self {
        Self {
            id: TheatreId::from_uuid(row.id),
            name: row.name,
            address: row.address,
            owner_id: UserId::from_uuid(row.owner_id),
            phone: row.phone,
            is_approved: row.is_approved,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = BookingError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| BookingError::Storage(format!("unknown role in database: {}", row.role)))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            role,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_columns() {
        assert_eq!(seats_to_column(&[1, 2, 39]).unwrap(), vec![1, 2, 39]);
        assert!(seats_to_column(&[u32::MAX]).is_err());
        assert_eq!(seats_from_column(vec![0, 5]).unwrap(), vec![0, 5]);
        assert!(matches!(
            seats_from_column(vec![-1]),
            Err(BookingError::Storage(_))
        ));
    }

    #[test]
    fn test_user_row_rejects_unknown_role() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@example.com".into(),
            role: "root".into(),
        };
        assert!(User::try_from(row).is_err());
    }
}
