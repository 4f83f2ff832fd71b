//! Shared fixture for core integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use showtime_core::mocks::{
    FixedClock, InMemoryStore, MockPaymentGateway, RecordingNotifier, test_clock,
};
use showtime_core::providers::{BookingStore, CatalogStore, ShowStore};
use showtime_core::{
    Actor, BookingQueries, CatalogGuard, Clock, Movie, MovieId, OrderConfig, OrderInitiator,
    PaymentVerifier, Role, Show, ShowId, ShowScheduler, TextTicketRenderer, Theatre, TheatreId,
    User, UserId, VerifierConfig,
};
use std::sync::Arc;

pub const SECRET: &str = "s";
pub const TICKET_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

pub struct Fixture {
    pub store: InMemoryStore,
    pub gateway: MockPaymentGateway,
    pub notifier: RecordingNotifier,
    pub clock: FixedClock,
    pub user: Actor,
    pub partner: Actor,
    pub admin: Actor,
    pub movie: Movie,
    pub theatre: Theatre,
}

impl Fixture {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let user = Actor::new(UserId::new(), Role::User);
        let partner = Actor::new(UserId::new(), Role::Partner);
        let admin = Actor::new(UserId::new(), Role::Admin);

        for (actor, name) in [(user, "Asha"), (partner, "Ravi"), (admin, "Root")] {
            store.seed_user(User {
                id: actor.user_id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                role: actor.role,
            });
        }

        let movie = Movie {
            id: MovieId::new(),
            title: "Dune".to_string(),
            description: "Spice".to_string(),
            duration_minutes: 155,
            genres: vec!["Sci-Fi".to_string()],
            languages: vec!["English".to_string(), "Hindi".to_string()],
            release_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            certificate: "UA".to_string(),
        };
        store.seed_movie(movie.clone());

        let theatre = Theatre {
            id: TheatreId::new(),
            name: "PVR Orion".to_string(),
            address: "MG Road".to_string(),
            owner_id: partner.user_id,
            phone: "080-1234".to_string(),
            is_approved: true,
        };
        store.seed_theatre(theatre.clone());

        Self {
            store,
            gateway: MockPaymentGateway::new(),
            notifier: RecordingNotifier::new(),
            clock: test_clock(),
            user,
            partner,
            admin,
            movie,
            theatre,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Seed a show starting `hours_from_now` hours after the fixed clock.
    pub fn seed_show(&self, hours_from_now: i64, total_seats: u32) -> Show {
        let start = self.now() + Duration::hours(hours_from_now);
        let show = Show {
            id: ShowId::new(),
            movie_id: self.movie.id,
            theatre_id: self.theatre.id,
            language: "English".to_string(),
            start,
            end: start + Duration::hours(2),
            ticket_price: 250,
            total_seats,
            booked_seats: Vec::new(),
            version: 0,
        };
        self.store.seed_show(show.clone());
        show
    }

    /// Seed a show of the fixture movie in `theatre`.
    pub fn seed_show_in(&self, theatre: TheatreId, hours_from_now: i64, language: &str) -> Show {
        let start = self.now() + Duration::hours(hours_from_now);
        let show = Show {
            id: ShowId::new(),
            movie_id: self.movie.id,
            theatre_id: theatre,
            language: language.to_string(),
            start,
            end: start + Duration::hours(2),
            ticket_price: 250,
            total_seats: 40,
            booked_seats: Vec::new(),
            version: 0,
        };
        self.store.seed_show(show.clone());
        show
    }

    /// Seed a second theatre owned by the partner.
    pub fn seed_theatre(&self, name: &str) -> Theatre {
        let theatre = Theatre {
            id: TheatreId::new(),
            name: name.to_string(),
            address: "Brigade Road".to_string(),
            ..self.theatre.clone()
        };
        self.store.seed_theatre(theatre.clone());
        theatre
    }

    fn shows(&self) -> Arc<dyn ShowStore> {
        Arc::new(self.store.clone())
    }

    fn bookings(&self) -> Arc<dyn BookingStore> {
        Arc::new(self.store.clone())
    }

    fn catalog(&self) -> Arc<dyn CatalogStore> {
        Arc::new(self.store.clone())
    }

    fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(self.clock.clone())
    }

    pub fn initiator(&self) -> OrderInitiator {
        OrderInitiator::new(
            self.shows(),
            Arc::new(self.gateway.clone()),
            self.clock(),
            OrderConfig::default(),
        )
    }

    pub fn verifier(&self) -> PaymentVerifier {
        PaymentVerifier::new(
            self.bookings(),
            self.catalog(),
            Arc::new(TextTicketRenderer::default()),
            Arc::new(self.notifier.clone()),
            self.clock(),
            VerifierConfig {
                secret: SECRET.to_string(),
                ticket_offset: FixedOffset::east_opt(0).unwrap(),
                ticket_timeout: TICKET_TIMEOUT,
            },
        )
    }

    pub fn scheduler(&self) -> ShowScheduler {
        ShowScheduler::new(self.shows(), self.catalog(), self.clock())
    }

    pub fn guard(&self) -> CatalogGuard {
        CatalogGuard::new(self.shows(), self.catalog(), self.clock())
    }

    pub fn queries(&self) -> BookingQueries {
        BookingQueries::new(self.bookings(), self.shows(), self.catalog(), self.clock())
    }
}
