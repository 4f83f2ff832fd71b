//! SMTP ticket notifier using Lettre.
//!
//! Templates are HTML files in the template directory. Every `#{key}` in the
//! file is replaced by the HTML-escaped value of `key`.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use showtime_core::providers::{TicketEmail, TicketNotifier};
use showtime_core::{BookingError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Substitute `#{key}` placeholders. Unknown placeholders are left alone.
#[must_use]
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    values.iter().fold(template.to_string(), |content, (key, value)| {
        content.replace(&format!("#{{{key}}}"), &escape_html(value))
    })
}

/// Sends ticket emails through an SMTP relay with STARTTLS.
#[derive(Clone)]
pub struct SmtpTicketNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    template_dir: PathBuf,
}

impl SmtpTicketNotifier {
    /// Create a notifier.
    ///
    /// The connection is opened lazily on the first send.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the relay host or the sender
    /// address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| BookingError::Internal(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.login.clone(),
                config.password.clone(),
            ))
            .build();

        let from = format!("{} <{}>", config.sender_name, config.sender)
            .parse()
            .map_err(|e| BookingError::Internal(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport,
            from,
            template_dir: config.template_dir.clone(),
        })
    }

    async fn load_template(&self, name: &str) -> Result<String> {
        let path = self.template_dir.join(name);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            BookingError::Internal(format!("template {} unavailable: {e}", path.display()))
        })
    }
}

#[async_trait]
impl TicketNotifier for SmtpTicketNotifier {
    async fn send(&self, email: TicketEmail) -> Result<()> {
        let template = self.load_template(&email.template).await?;
        let html = render_template(&template, &email.values);

        let html_part = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(html);

        let body = match email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    BookingError::Internal(format!("Invalid attachment type: {e}"))
                })?;
                MultiPart::mixed()
                    .singlepart(html_part)
                    .singlepart(
                        Attachment::new(attachment.filename).body(attachment.content, content_type),
                    )
            },
            None => MultiPart::mixed().singlepart(html_part),
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(email
                .to
                .parse()
                .map_err(|e| BookingError::Internal(format!("Invalid to address: {e}")))?)
            .subject(email.subject)
            .multipart(body)
            .map_err(|e| BookingError::Internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| BookingError::Internal(format!("Failed to send email: {e}")))?;

        tracing::debug!(to = %email.to, template = %email.template, "Ticket email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_placeholders_replaced_everywhere() {
        let rendered = render_template(
            "<p>Hi #{name}</p><p>#{title} on #{showTime}</p><footer>#{name}</footer>",
            &values(&[("name", "Asha"), ("title", "Dune"), ("showTime", "2nd Jan 2026")]),
        );
        assert_eq!(
            rendered,
            "<p>Hi Asha</p><p>Dune on 2nd Jan 2026</p><footer>Asha</footer>"
        );
    }

    #[test]
    fn test_unknown_placeholders_kept() {
        assert_eq!(
            render_template("#{missing}", &values(&[("name", "x")])),
            "#{missing}"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        assert_eq!(
            render_template("#{name}", &values(&[("name", "<b>R&D</b>")])),
            "&lt;b&gt;R&amp;D&lt;/b&gt;"
        );
    }

    #[test]
    fn test_shipped_template_has_ticket_placeholders() {
        let template = include_str!("../templates/ticket.html");
        for key in ["name", "title", "showTime"] {
            assert!(template.contains(&format!("#{{{key}}}")), "missing #{{{key}}}");
        }
    }

    #[tokio::test]
    async fn test_notifier_builds_from_config() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            login: "user".to_string(),
            password: "pass".to_string(),
            sender: "tickets@example.com".to_string(),
            sender_name: "Showtime Tickets".to_string(),
            template_dir: PathBuf::from("templates"),
        };
        assert!(SmtpTicketNotifier::new(&config).is_ok());

        let bad_sender = SmtpConfig {
            sender: "not an address".to_string(),
            ..config
        };
        assert!(SmtpTicketNotifier::new(&bad_sender).is_err());
    }
}
