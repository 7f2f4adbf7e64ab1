//! The transfer executor: pick a funder, sign, submit.

use tracing::info;

use spigot_core::{Address, Signature, TransferMessage};

use crate::error::FundingError;
use crate::rpc::{ResilientClient, Transport};
use crate::selector::Selector;

/// Move `motes` from whichever funded account the selector finds to
/// `destination`.
///
/// Rejects a zero amount before any network activity. Returns the
/// submitted transaction's reference without waiting for confirmation;
/// callers that want certainty run [`crate::await_confirmation`] on it.
pub async fn send<T: Transport>(
    selector: &Selector<'_, T>,
    client: &ResilientClient<T>,
    destination: &Address,
    motes: u64,
) -> Result<Signature, FundingError> {
    if motes == 0 {
        return Err(FundingError::InvalidAmount { motes });
    }

    let funder = selector.select(motes).await?;
    let recent_blockhash = client.latest_blockhash().await?;
    let message = TransferMessage::new(funder.address(), *destination, motes, recent_blockhash);
    let transaction = message.sign(&funder.keypair)?;
    let payload = transaction.to_wire_hex()?;
    let reference = client.submit_transaction(&payload).await?;
    info!(
        from = %funder.address(),
        to = %destination,
        motes,
        %reference,
        "transfer submitted"
    );
    Ok(reference)
}
