//! Funding account selection.
//!
//! Order of preference: the designated primary account, then the pool in
//! its stable discovery order, then the primary again after a single
//! top-up cycle. Preferring the primary avoids fragmenting funds across
//! the pool; the single top-up attempt bounds the worst-case latency of
//! one selection call.

use tracing::{debug, info, warn};

use spigot_core::constants::DEFAULT_AIRDROP_MOTES;

use crate::airdrop::Acquirer;
use crate::confirm::await_confirmation;
use crate::error::FundingError;
use crate::retry::RetryPolicy;
use crate::rpc::{ResilientClient, Transport};
use crate::store::{Funder, FunderStore};

pub struct Selector<'a, T: Transport> {
    store: &'a FunderStore,
    client: &'a ResilientClient<T>,
    acquirer: &'a Acquirer<'a, T>,
    confirm_policy: RetryPolicy,
}

impl<'a, T: Transport> Selector<'a, T> {
    pub fn new(
        store: &'a FunderStore,
        client: &'a ResilientClient<T>,
        acquirer: &'a Acquirer<'a, T>,
        confirm_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            client,
            acquirer,
            confirm_policy,
        }
    }

    /// Find an account whose fresh balance covers `required_motes`.
    ///
    /// Balances are queried fresh at every decision point, never cached.
    /// A balance query failure for one candidate only disqualifies that
    /// candidate; the scan continues.
    pub async fn select(&self, required_motes: u64) -> Result<Funder, FundingError> {
        let primary = match self.store.primary() {
            Ok(primary) => primary,
            Err(e) => {
                warn!(error = %e, "failed to load primary account, falling back to pool");
                None
            }
        };

        if let Some(funder) = &primary {
            if let Some(balance) = self.balance_of(funder).await {
                if balance >= required_motes {
                    info!(address = %funder.address(), balance, "using primary account");
                    return Ok(funder.clone());
                }
            }
        }

        for funder in self.store.pool()? {
            if let Some(balance) = self.balance_of(&funder).await {
                debug!(label = %funder.label, balance, required_motes, "checked pool account");
                if balance >= required_motes {
                    info!(label = %funder.label, address = %funder.address(), balance, "using pool account");
                    return Ok(funder);
                }
            }
        }

        // Last resort: one top-up cycle for the primary, never a loop.
        if let Some(funder) = primary {
            info!(address = %funder.address(), "no funded account, topping up primary");
            match self
                .acquirer
                .acquire(&funder.address(), DEFAULT_AIRDROP_MOTES)
                .await
            {
                Ok(reference) => {
                    if await_confirmation(self.client, &reference, &self.confirm_policy).await {
                        if let Some(balance) = self.balance_of(&funder).await {
                            if balance >= required_motes {
                                info!(address = %funder.address(), balance, "primary topped up");
                                return Ok(funder);
                            }
                            warn!(balance, required_motes, "top-up confirmed but balance still short");
                        }
                    } else {
                        warn!(%reference, "top-up airdrop not confirmed");
                    }
                }
                Err(e) => warn!(error = %e, "top-up failed"),
            }
        }

        Err(FundingError::NoFundedAccountAvailable {
            required: required_motes,
        })
    }

    async fn balance_of(&self, funder: &Funder) -> Option<u64> {
        match self.client.get_balance(&funder.address()).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(label = %funder.label, error = %e, "balance query failed, skipping account");
                None
            }
        }
    }
}
