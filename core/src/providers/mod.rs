//! Collaborator traits.
//!
//! Services depend on these interfaces only. The server wires in the
//! PostgreSQL stores, the HTTP gateway and the SMTP notifier; tests use the
//! in-memory versions from [`crate::mocks`].
//!
//! ```text
//! OrderInitiator ──► ShowStore ──► PaymentGateway
//!
//! PaymentVerifier ─► BookingStore::commit_booking (atomic)
//!                 └► TicketRenderer ─► TicketNotifier (non-fatal)
//! ```

pub mod gateway;
pub mod notifier;
pub mod store;

pub use gateway::{GatewayOrder, OrderRequest, PaymentGateway};
pub use notifier::{Attachment, TicketEmail, TicketNotifier, TicketRenderer};
pub use store::{BookingStore, CatalogStore, ShowStore};
