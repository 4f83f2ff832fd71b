//! Payment callback signatures.
//!
//! The gateway signs `order_id|payment_id` with HMAC-SHA256 under the shared
//! API secret and sends the lowercase hex digest back through the client.

use crate::error::{BookingError, Result};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected signature for an order/payment pair.
///
/// # Errors
///
/// Returns [`BookingError::Internal`] if the secret cannot key the MAC.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BookingError::Internal(format!("invalid payment secret: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a gateway-supplied signature in constant time.
///
/// The comparison is on the exact hex text, so a case change counts as a
/// mismatch.
///
/// # Errors
///
/// Returns [`BookingError::VerificationFailed`] on mismatch.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<()> {
    let expected = payment_signature(secret, order_id, payment_id)?;
    if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        Ok(())
    } else {
        Err(BookingError::VerificationFailed)
    }
}
