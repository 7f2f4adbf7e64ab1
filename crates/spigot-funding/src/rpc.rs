//! The resilient RPC client.
//!
//! [`ResilientClient`] wraps each logical backend call with endpoint
//! rotation. Read operations fail over through the whole pool within one
//! call; single-shot operations (airdrop, status, submission) rotate once
//! on failure and surface the error, leaving retries to the component
//! that owns the retry budget. Submission is never auto-retried.
//!
//! [`Transport`] is the seam between the client and the wire: production
//! uses [`HttpTransport`] (one jsonrpsee HTTP client per endpoint), tests
//! script a fake.

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use spigot_core::{Address, BlockHash, Signature};

use crate::endpoints::EndpointPool;
use crate::error::EndpointError;

/// A raw transport failure, carried up into [`EndpointError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One JSON-RPC request against a specific endpoint of the pool.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        endpoint: usize,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError>;
}

/// Production transport: one jsonrpsee HTTP client per pool endpoint,
/// built once at startup.
pub struct HttpTransport {
    clients: Vec<HttpClient>,
}

impl HttpTransport {
    pub fn new(endpoints: &[String]) -> Result<Self, TransportError> {
        let clients = endpoints
            .iter()
            .map(|url| {
                HttpClientBuilder::default()
                    .build(url)
                    .map_err(|e| TransportError(format!("building client for {url}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clients })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        endpoint: usize,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError> {
        let client = self
            .clients
            .get(endpoint)
            .ok_or_else(|| TransportError(format!("no client for endpoint index {endpoint}")))?;
        let mut array = ArrayParams::new();
        for param in params {
            array
                .insert(param)
                .map_err(|e| TransportError(e.to_string()))?;
        }
        client
            .request::<Value, _>(method, array)
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}

/// RPC client with pool-wide endpoint rotation on failure.
///
/// The pool is shared: a rotation triggered by one call changes which
/// endpoint every subsequent call uses, across all components holding the
/// same client.
pub struct ResilientClient<T: Transport> {
    pool: Arc<EndpointPool>,
    transport: T,
}

impl<T: Transport> ResilientClient<T> {
    pub fn new(pool: Arc<EndpointPool>, transport: T) -> Self {
        Self { pool, transport }
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    /// Failover call: try each endpoint in rotation order, at most one
    /// full pass through the pool, then surface the last failure.
    async fn call_failover(&self, method: &str, params: Vec<Value>) -> Result<Value, EndpointError> {
        let mut last_err = None;
        for _ in 0..self.pool.len() {
            let (index, url) = self.pool.current();
            match self.transport.call(index, method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(endpoint = %url, method, error = %e, "rpc call failed, rotating endpoint");
                    self.pool.rotate();
                    last_err = Some(EndpointError {
                        endpoint: url.to_string(),
                        reason: e.0,
                    });
                }
            }
        }
        Err(last_err.expect("pool holds at least one endpoint"))
    }

    /// Single-shot call: one attempt; on failure rotate once and surface
    /// the error for the caller's own retry schedule.
    async fn call_once(&self, method: &str, params: Vec<Value>) -> Result<Value, EndpointError> {
        let (index, url) = self.pool.current();
        match self.transport.call(index, method, params).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(endpoint = %url, method, error = %e, "rpc call failed, rotating endpoint");
                self.pool.rotate();
                Err(EndpointError {
                    endpoint: url.to_string(),
                    reason: e.0,
                })
            }
        }
    }

    fn malformed(&self, method: &str, value: &Value) -> EndpointError {
        EndpointError {
            endpoint: self.pool.current().1.to_string(),
            reason: format!("malformed {method} result: {value}"),
        }
    }

    /// Fresh balance of an account, in motes. Fails over.
    pub async fn get_balance(&self, address: &Address) -> Result<u64, EndpointError> {
        let value = self
            .call_failover("getbalance", vec![json!(address.to_string())])
            .await?;
        value
            .as_u64()
            .ok_or_else(|| self.malformed("getbalance", &value))
    }

    /// Latest blockhash anchoring a new transfer. Fails over.
    pub async fn latest_blockhash(&self) -> Result<BlockHash, EndpointError> {
        let value = self.call_failover("getlatestblockhash", vec![]).await?;
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.malformed("getlatestblockhash", &value))
    }

    /// Status of a submitted transaction: `None` until the backend has
    /// seen it. Single-shot.
    pub async fn transaction_status(
        &self,
        reference: &Signature,
    ) -> Result<Option<Value>, EndpointError> {
        let value = self
            .call_once("gettransactionstatus", vec![json!(reference.to_string())])
            .await?;
        if value.is_null() {
            Ok(None)
        } else {
            debug!(reference = %reference, status = %value, "transaction status present");
            Ok(Some(value))
        }
    }

    /// Request an airdrop from the backend faucet. Single-shot; the
    /// acquirer owns the retry schedule.
    pub async fn request_airdrop(
        &self,
        address: &Address,
        motes: u64,
    ) -> Result<Signature, EndpointError> {
        let value = self
            .call_once("requestairdrop", vec![json!(address.to_string()), json!(motes)])
            .await?;
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.malformed("requestairdrop", &value))
    }

    /// Submit a signed transaction payload. Single-shot, never retried
    /// here: submission is not idempotent.
    pub async fn submit_transaction(&self, payload_hex: &str) -> Result<Signature, EndpointError> {
        let value = self
            .call_once("sendrawtransaction", vec![json!(payload_hex)])
            .await?;
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.malformed("sendrawtransaction", &value))
    }
}
