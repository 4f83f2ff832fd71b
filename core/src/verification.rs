//! Payment verification and booking commit.

use crate::authorization::{Action, Actor, Resource, authorize};
use crate::booking::{Booking, CommittedBooking, NewBooking};
use crate::catalog::User;
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::providers::{BookingStore, CatalogStore, TicketEmail, TicketNotifier, TicketRenderer};
use crate::seat::seat_labels;
use crate::signature::verify_payment_signature;
use crate::ticket::{TicketDetails, build_ticket_email};
use crate::types::{BookingId, ShowId};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Settings for payment verification.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Secret shared with the gateway for callback signatures
    pub secret: String,
    /// Offset used to print show times on tickets
    pub ticket_offset: FixedOffset,
    /// How long the response waits for the ticket email. Delivery keeps
    /// running in the background past this.
    pub ticket_timeout: Duration,
}

/// Gateway callback relayed by the client after checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    /// Show the seats belong to
    pub show_id: Option<ShowId>,
    /// Seats paid for
    pub selected_seats: Option<Vec<u32>>,
    /// Amount paid in major currency units
    pub amount: Option<u64>,
    /// Gateway order identifier
    pub order_id: Option<String>,
    /// Gateway payment identifier
    pub payment_id: Option<String>,
    /// Gateway signature over `order_id|payment_id`
    pub signature: Option<String>,
}

struct VerifiedPayment {
    show_id: ShowId,
    seats: Vec<u32>,
    amount: u64,
    order_id: String,
    payment_id: String,
    signature: String,
}

impl VerifyPaymentRequest {
    fn into_verified_fields(self) -> Result<VerifiedPayment> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        match (
            self.show_id,
            self.selected_seats.filter(|seats| !seats.is_empty()),
            self.amount.filter(|amount| *amount > 0),
            non_empty(self.order_id),
            non_empty(self.payment_id),
            non_empty(self.signature),
        ) {
            (
                Some(show_id),
                Some(seats),
                Some(amount),
                Some(order_id),
                Some(payment_id),
                Some(signature),
            ) => Ok(VerifiedPayment {
                show_id,
                seats,
                amount,
                order_id,
                payment_id,
                signature,
            }),
            _ => Err(BookingError::invalid(
                "showId, selectedSeats, amount, orderId, paymentId and signature are required",
            )),
        }
    }
}

/// Outcome of a successful verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    /// Identifier of the new booking
    pub booking_id: BookingId,
    /// The stored booking
    pub booking: Booking,
    /// Labelled seats, e.g. `B1, B2`
    pub seats: String,
    /// Whether the ticket email was delivered before the response
    pub ticket_sent: bool,
}

/// Verifies gateway callbacks and commits bookings.
pub struct PaymentVerifier {
    bookings: Arc<dyn BookingStore>,
    catalog: Arc<dyn CatalogStore>,
    renderer: Arc<dyn TicketRenderer>,
    notifier: Arc<dyn TicketNotifier>,
    clock: Arc<dyn Clock>,
    config: VerifierConfig,
}

impl PaymentVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        catalog: Arc<dyn CatalogStore>,
        renderer: Arc<dyn TicketRenderer>,
        notifier: Arc<dyn TicketNotifier>,
        clock: Arc<dyn Clock>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            bookings,
            catalog,
            renderer,
            notifier,
            clock,
            config,
        }
    }

    /// Verify the callback signature, commit the booking and send the
    /// ticket.
    ///
    /// Nothing is written unless the signature matches. The booking and the
    /// seat update are committed together by [`BookingStore::commit_booking`].
    /// Ticket delivery happens afterwards on a spawned task and never undoes
    /// the booking. The call waits at most `ticket_timeout` for it.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for missing fields or bad seats
    /// - [`BookingError::VerificationFailed`] on signature mismatch
    /// - [`BookingError::NotFound`] if the user or show does not exist
    /// - [`BookingError::SeatConflict`] if a seat was booked concurrently
    /// - [`BookingError::DuplicatePayment`] if the payment was already used
    pub async fn verify(
        &self,
        actor: &Actor,
        request: VerifyPaymentRequest,
    ) -> Result<BookingConfirmation> {
        authorize(actor, Action::BookSeats, Resource::Own)?;
        let payment = request.into_verified_fields()?;

        if let Err(err) = verify_payment_signature(
            &self.config.secret,
            &payment.order_id,
            &payment.payment_id,
            &payment.signature,
        ) {
            tracing::warn!(
                order_id = %payment.order_id,
                payment_id = %payment.payment_id,
                user_id = %actor.user_id,
                "Payment signature rejected"
            );
            metrics::counter!("showtime.payments.rejected").increment(1);
            return Err(err);
        }

        let user = self
            .catalog
            .get_user(actor.user_id)
            .await?
            .ok_or_else(|| BookingError::not_found("User", actor.user_id))?;

        let committed = self
            .bookings
            .commit_booking(
                NewBooking {
                    show_id: payment.show_id,
                    user_id: user.id,
                    seats: payment.seats,
                    amount: payment.amount,
                    transaction_id: payment.payment_id,
                },
                self.clock.now(),
            )
            .await
            .inspect_err(|err| {
                if let BookingError::SeatConflict { seats } = err {
                    tracing::warn!(
                        show_id = %payment.show_id,
                        seats = ?seats,
                        order_id = %payment.order_id,
                        "Seats taken between order and verification"
                    );
                    metrics::counter!("showtime.bookings.conflicts").increment(1);
                }
            })?;

        tracing::info!(
            booking_id = %committed.booking.id,
            show_id = %committed.show.id,
            user_id = %user.id,
            seats = ?committed.booking.seats,
            transaction_id = %committed.booking.transaction_id,
            "Booking committed"
        );
        metrics::counter!("showtime.bookings.committed").increment(1);

        let ticket_sent = match self.prepare_ticket(&committed, &user).await {
            Ok(email) => self.send_ticket(committed.booking.id, email).await,
            Err(err) => {
                tracing::warn!(
                    booking_id = %committed.booking.id,
                    error = %err,
                    "Ticket could not be prepared; booking kept"
                );
                metrics::counter!("showtime.tickets.failed").increment(1);
                false
            },
        };

        let seats = seat_labels(committed.show.total_seats, &committed.booking.seats);
        Ok(BookingConfirmation {
            booking_id: committed.booking.id,
            booking: committed.booking,
            seats,
            ticket_sent,
        })
    }

    async fn prepare_ticket(&self, committed: &CommittedBooking, user: &User) -> Result<TicketEmail> {
        let show = &committed.show;
        let movie = self
            .catalog
            .get_movie(show.movie_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Movie", show.movie_id))?;
        let theatre = self
            .catalog
            .get_theatre(show.theatre_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Theatre", show.theatre_id))?;

        let details = TicketDetails::new(
            &committed.booking,
            show,
            &movie,
            &theatre,
            self.config.ticket_offset,
        );
        let attachment = self.renderer.render(&details)?;
        Ok(build_ticket_email(user, &details, Some(attachment)))
    }

    /// Send on a detached task, waiting at most `ticket_timeout`. The task
    /// outlives the wait.
    async fn send_ticket(&self, booking_id: BookingId, email: TicketEmail) -> bool {
        let notifier = Arc::clone(&self.notifier);
        let to = email.to.clone();
        let delivery = tokio::spawn(async move {
            let outcome = notifier.send(email).await;
            match &outcome {
                Ok(()) => tracing::debug!(booking_id = %booking_id, to = %to, "Ticket sent"),
                Err(err) => {
                    tracing::warn!(
                        booking_id = %booking_id,
                        error = %err,
                        "Ticket delivery failed; booking kept"
                    );
                    metrics::counter!("showtime.tickets.failed").increment(1);
                },
            }
            outcome
        });

        match tokio::time::timeout(self.config.ticket_timeout, delivery).await {
            Ok(Ok(outcome)) => outcome.is_ok(),
            Ok(Err(err)) => {
                tracing::warn!(booking_id = %booking_id, error = %err, "Ticket task aborted");
                metrics::counter!("showtime.tickets.failed").increment(1);
                false
            },
            Err(_) => {
                tracing::warn!(
                    booking_id = %booking_id,
                    timeout = ?self.config.ticket_timeout,
                    "Ticket still sending; responding without it"
                );
                metrics::counter!("showtime.tickets.deferred").increment(1);
                false
            },
        }
    }
}
