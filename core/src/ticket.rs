//! Ticket details, formatting and the email built from them.

use crate::booking::Booking;
use crate::catalog::{Movie, Theatre, User};
use crate::error::Result;
use crate::providers::{Attachment, TicketEmail, TicketRenderer};
use crate::seat::seat_labels;
use crate::show::Show;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Template used for ticket emails.
pub const TICKET_TEMPLATE: &str = "ticket.html";

/// Subject line of ticket emails.
pub const TICKET_SUBJECT: &str = "MOVIE BOOKING DETAILS";

/// Everything printed on a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    /// Movie title
    pub title: String,
    /// Theatre name
    pub theatre: String,
    /// Theatre address
    pub address: String,
    /// Show date, e.g. `1st Jan 2026`
    pub date: String,
    /// Show start time, e.g. `06:30 PM`
    pub time: String,
    /// Sorted, labelled seats, e.g. `B1, B2`
    pub seats: String,
    /// Gateway payment identifier
    pub transaction_id: String,
}

impl TicketDetails {
    /// Assemble ticket details, formatting times in `offset`.
    #[must_use]
    pub fn new(
        booking: &Booking,
        show: &Show,
        movie: &Movie,
        theatre: &Theatre,
        offset: FixedOffset,
    ) -> Self {
        Self {
            title: movie.title.clone(),
            theatre: theatre.name.clone(),
            address: theatre.address.clone(),
            date: format_show_date(show.start, offset),
            time: format_show_time(show.start, offset),
            seats: seat_labels(show.total_seats, &booking.seats),
            transaction_id: booking.transaction_id.clone(),
        }
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Format a date as `Do MMM YYYY` (`1st Jan 2026`).
#[must_use]
pub fn format_show_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    let day = local.day();
    format!(
        "{day}{} {} {}",
        ordinal_suffix(day),
        local.format("%b"),
        local.year()
    )
}

/// Format a time as `hh:mm AM|PM`.
///
/// Midnight is `12:xx AM` and noon is `12:xx PM`.
#[must_use]
pub fn format_show_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    let hour = local.hour();
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h % 12,
        h => h,
    };
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    format!("{display_hour:02}:{:02} {meridiem}", local.minute())
}

/// Build the ticket email for `user`.
#[must_use]
pub fn build_ticket_email(
    user: &User,
    details: &TicketDetails,
    attachment: Option<Attachment>,
) -> TicketEmail {
    let mut values = BTreeMap::new();
    values.insert("name".to_string(), user.name.clone());
    values.insert("title".to_string(), details.title.clone());
    values.insert("showTime".to_string(), details.date.clone());
    values.insert("time".to_string(), details.time.clone());
    values.insert("theatre".to_string(), details.theatre.clone());
    values.insert("seats".to_string(), details.seats.clone());
    values.insert("transactionId".to_string(), details.transaction_id.clone());

    TicketEmail {
        template: TICKET_TEMPLATE.to_string(),
        to: user.email.clone(),
        subject: TICKET_SUBJECT.to_string(),
        values,
        attachment,
    }
}

/// Renders a plain-text ticket.
#[derive(Debug, Clone)]
pub struct TextTicketRenderer {
    heading: String,
}

impl TextTicketRenderer {
    /// Create a renderer printing `heading` at the top of each ticket.
    #[must_use]
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }
}

impl Default for TextTicketRenderer {
    fn default() -> Self {
        Self::new("Showtime Tickets")
    }
}

impl TicketRenderer for TextTicketRenderer {
    fn render(&self, details: &TicketDetails) -> Result<Attachment> {
        let rule = "-".repeat(48);
        let lines = [
            self.heading.clone(),
            rule.clone(),
            "Booked show details".to_string(),
            String::new(),
            format!("Movie          : {}", details.title),
            format!("Date           : {}", details.date),
            format!("Time           : {}", details.time),
            format!("Theatre        : {}", details.theatre),
            format!("Location       : {}", details.address),
            format!("Seats          : {}", details.seats),
            format!("Transaction Id : {}", details.transaction_id),
            rule,
            "Thank you for booking! Visit again!".to_string(),
        ];
        let body = lines.join("\n") + "\n";

        Ok(Attachment {
            filename: "booking.txt".to_string(),
            content_type: "text/plain; charset=utf-8".to_string(),
            content: body.into_bytes(),
        })
    }
}
