//! Two-tier airdrop acquisition.
//!
//! Tier 1 asks the backend faucet through the resilient client; tier 2
//! falls back to the public web faucet. Both tiers run the same fixed
//! retry schedule, and the amount stays constant across attempts —
//! escalating requests would trip the faucet's per-request cap.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use spigot_core::{Address, Signature};

use crate::error::FundingError;
use crate::retry::RetryPolicy;
use crate::rpc::{ResilientClient, Transport};

/// A tier-2 public funding channel.
#[async_trait]
pub trait Faucet: Send + Sync {
    async fn request(&self, address: &Address, motes: u64) -> Result<Signature, FaucetError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FaucetError(pub String);

/// The public HTTP faucet: `POST <base>/airdrop/<address>/<motes>`,
/// responding with `{"signature": "..."}`.
pub struct WebFaucet {
    client: reqwest::Client,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct AirdropResponse {
    signature: Signature,
}

impl WebFaucet {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("build reqwest client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Faucet for WebFaucet {
    async fn request(&self, address: &Address, motes: u64) -> Result<Signature, FaucetError> {
        let url = format!("{}/airdrop/{address}/{motes}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| FaucetError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FaucetError(format!("web faucet returned {}", response.status())));
        }
        let body: AirdropResponse = response
            .json()
            .await
            .map_err(|e| FaucetError(e.to_string()))?;
        Ok(body.signature)
    }
}

/// The airdrop acquirer: requests funding for one account, falling back
/// from the RPC faucet to the web faucet.
pub struct Acquirer<'a, T: Transport> {
    client: &'a ResilientClient<T>,
    faucet: &'a dyn Faucet,
    policy: RetryPolicy,
}

impl<'a, T: Transport> Acquirer<'a, T> {
    pub fn new(client: &'a ResilientClient<T>, faucet: &'a dyn Faucet, policy: RetryPolicy) -> Self {
        Self {
            client,
            faucet,
            policy,
        }
    }

    /// Request `motes` for `address`, returning the funding transaction's
    /// reference without waiting for confirmation.
    ///
    /// Issues at most `2 × attempts` funding requests before giving up
    /// with [`FundingError::FundingExhausted`]. Each failed RPC attempt
    /// rotates the endpoint (inside the client) and sleeps out the
    /// schedule's delay.
    pub async fn acquire(&self, address: &Address, motes: u64) -> Result<Signature, FundingError> {
        for attempt in 1..=self.policy.attempts {
            match self.client.request_airdrop(address, motes).await {
                Ok(reference) => {
                    info!(address = %address, motes, %reference, "rpc airdrop requested");
                    return Ok(reference);
                }
                Err(e) => {
                    warn!(address = %address, attempt, error = %e, "rpc airdrop failed");
                    self.policy.pause().await;
                }
            }
        }

        for attempt in 1..=self.policy.attempts {
            match self.faucet.request(address, motes).await {
                Ok(reference) => {
                    info!(address = %address, motes, %reference, "web faucet airdrop requested");
                    return Ok(reference);
                }
                Err(e) => {
                    warn!(address = %address, attempt, error = %e, "web faucet airdrop failed");
                    self.policy.pause().await;
                }
            }
        }

        Err(FundingError::FundingExhausted {
            attempts: self.policy.attempts * 2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::endpoints::EndpointPool;
    use crate::rpc::TransportError;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn call(
            &self,
            _endpoint: usize,
            _method: &str,
            _params: Vec<Value>,
        ) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted transport call")
        }
    }

    struct ScriptedFaucet {
        responses: Mutex<VecDeque<Result<Signature, FaucetError>>>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Faucet for ScriptedFaucet {
        async fn request(&self, _address: &Address, _motes: u64) -> Result<Signature, FaucetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FaucetError("unscripted".into())))
        }
    }

    struct Counters {
        rpc: Arc<AtomicU32>,
        web: Arc<AtomicU32>,
    }

    fn fixture(
        rpc: Vec<Result<Value, TransportError>>,
        web: Vec<Result<Signature, FaucetError>>,
    ) -> (ResilientClient<ScriptedTransport>, ScriptedFaucet, Counters) {
        let counters = Counters {
            rpc: Arc::new(AtomicU32::new(0)),
            web: Arc::new(AtomicU32::new(0)),
        };
        let pool = Arc::new(EndpointPool::new(vec!["http://node0.test".into()]).unwrap());
        let transport = ScriptedTransport {
            responses: Mutex::new(rpc.into()),
            calls: counters.rpc.clone(),
        };
        let faucet = ScriptedFaucet {
            responses: Mutex::new(web.into()),
            calls: counters.web.clone(),
        };
        (ResilientClient::new(pool, transport), faucet, counters)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    fn sig(byte: u8) -> Signature {
        Signature::from_bytes([byte; 64])
    }

    fn rpc_err() -> Result<Value, TransportError> {
        Err(TransportError("rate limited".into()))
    }

    fn addr() -> Address {
        Address::from_bytes([3u8; 32])
    }

    #[tokio::test]
    async fn first_rpc_attempt_succeeds() {
        let (client, faucet, counters) = fixture(vec![Ok(json!(sig(1).to_string()))], vec![]);
        let acquirer = Acquirer::new(&client, &faucet, fast_policy());
        assert_eq!(acquirer.acquire(&addr(), 500).await.unwrap(), sig(1));
        assert_eq!(counters.web.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_to_web_faucet() {
        let (client, faucet, counters) =
            fixture(vec![rpc_err(), rpc_err(), rpc_err()], vec![Ok(sig(2))]);
        let acquirer = Acquirer::new(&client, &faucet, fast_policy());
        assert_eq!(acquirer.acquire(&addr(), 500).await.unwrap(), sig(2));
        assert_eq!(counters.rpc.load(Ordering::SeqCst), 3);
        assert_eq!(counters.web.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_caps_total_attempts_at_six() {
        let (client, faucet, counters) = fixture(vec![rpc_err(), rpc_err(), rpc_err()], vec![]);
        let acquirer = Acquirer::new(&client, &faucet, fast_policy());
        let err = acquirer.acquire(&addr(), 500).await.unwrap_err();
        assert!(matches!(err, FundingError::FundingExhausted { attempts: 6 }));
        assert_eq!(counters.rpc.load(Ordering::SeqCst), 3);
        assert_eq!(counters.web.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rpc_retries_use_later_endpoints() {
        let calls = Arc::new(AtomicU32::new(0));
        let pool = Arc::new(
            EndpointPool::new(vec!["http://node0.test".into(), "http://node1.test".into()]).unwrap(),
        );
        let transport = ScriptedTransport {
            responses: Mutex::new(
                vec![rpc_err(), rpc_err(), Ok(json!(sig(4).to_string()))].into(),
            ),
            calls: calls.clone(),
        };
        let client = ResilientClient::new(pool, transport);
        let faucet = ScriptedFaucet {
            responses: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicU32::new(0)),
        };
        let acquirer = Acquirer::new(&client, &faucet, fast_policy());
        assert_eq!(acquirer.acquire(&addr(), 500).await.unwrap(), sig(4));
        // Two failures rotated the two-entry pool back to its start.
        assert_eq!(client.pool().position(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
