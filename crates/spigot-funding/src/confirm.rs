//! Confirmation polling.
//!
//! Confirmation delay is expected on a devnet, and a transient endpoint
//! hiccup must not abort an otherwise-successful funding flow, so a
//! transport error during polling rotates the endpoint (inside the
//! client) and polling continues. A non-null status counts as confirmed;
//! the status object itself is only surfaced in logs.

use tracing::{debug, info, warn};

use spigot_core::Signature;

use crate::retry::RetryPolicy;
use crate::rpc::{ResilientClient, Transport};

/// Poll until the backend reports a status for `reference`.
///
/// Returns `true` on the first poll with a non-null status, `false` once
/// the schedule's attempts are exhausted.
pub async fn await_confirmation<T: Transport>(
    client: &ResilientClient<T>,
    reference: &Signature,
    policy: &RetryPolicy,
) -> bool {
    for attempt in 1..=policy.attempts {
        match client.transaction_status(reference).await {
            Ok(Some(_)) => {
                info!(reference = %reference, attempt, "transaction confirmed");
                return true;
            }
            Ok(None) => {
                debug!(reference = %reference, attempt, max = policy.attempts, "awaiting confirmation");
            }
            Err(e) => {
                warn!(reference = %reference, attempt, error = %e, "status poll failed, endpoint rotated");
            }
        }
        if attempt < policy.attempts {
            policy.pause().await;
        }
    }
    warn!(reference = %reference, attempts = policy.attempts, "confirmation attempts exhausted");
    false
}
