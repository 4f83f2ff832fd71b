//! Ticket rendering and delivery traits.

use crate::error::Result;
use crate::ticket::TicketDetails;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A file attached to an email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// Raw bytes
    pub content: Vec<u8>,
}

/// A templated email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketEmail {
    /// Template file name (`ticket.html`)
    pub template: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Placeholder substitutions
    pub values: BTreeMap<String, String>,
    /// Optional attachment
    pub attachment: Option<Attachment>,
}

/// Renders the ticket document attached to the email.
pub trait TicketRenderer: Send + Sync {
    /// Render `details` into an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Internal`] if rendering fails.
    fn render(&self, details: &TicketDetails) -> Result<Attachment>;
}

/// Delivers templated emails.
#[async_trait]
pub trait TicketNotifier: Send + Sync {
    /// Send one email.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Internal`] if the template cannot be
    /// loaded or the transport rejects the message.
    async fn send(&self, email: TicketEmail) -> Result<()>;
}
