//! End-to-end funding flow over a real temp-dir store and a simulated
//! devnet backend.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spigot_core::constants::COIN;
use spigot_core::{Address, Signature, SignedTransaction};
use spigot_funding::rpc::TransportError;
use spigot_funding::{
    await_confirmation, transfer, Acquirer, EndpointPool, Faucet, FunderStore, FundingError,
    ResilientClient, RetryPolicy, Selector, Transport,
};

const AIRDROP_SIG: [u8; 64] = [0xAA; 64];
const SUBMIT_SIG: [u8; 64] = [0xBB; 64];

#[derive(Default)]
struct DevnetState {
    balances: HashMap<String, u64>,
    /// Whether the RPC faucet grants requests.
    airdrop_ok: bool,
    /// Airdrop awaiting confirmation: (address, motes).
    pending: Option<(String, u64)>,
    /// Null statuses to report before the pending airdrop confirms.
    polls_until_confirm: u32,
    /// Every method invoked, in order.
    calls: Vec<String>,
    /// Raw payloads seen by sendrawtransaction.
    submitted: Vec<String>,
}

/// In-memory devnet: balances, a faucet that credits on confirmation, and
/// a call log.
#[derive(Clone)]
struct DevnetTransport(Arc<Mutex<DevnetState>>);

impl DevnetTransport {
    fn new(state: DevnetState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| *m == method).count()
    }

    fn submitted(&self) -> Vec<String> {
        self.0.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl Transport for DevnetTransport {
    async fn call(
        &self,
        _endpoint: usize,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(method.to_string());
        match method {
            "getbalance" => {
                let address = params[0].as_str().unwrap().to_string();
                Ok(json!(state.balances.get(&address).copied().unwrap_or(0)))
            }
            "requestairdrop" => {
                if !state.airdrop_ok {
                    return Err(TransportError("airdrop limit reached".into()));
                }
                let address = params[0].as_str().unwrap().to_string();
                let motes = params[1].as_u64().unwrap();
                state.pending = Some((address, motes));
                Ok(json!(Signature::from_bytes(AIRDROP_SIG).to_string()))
            }
            "gettransactionstatus" => {
                if state.polls_until_confirm > 0 {
                    state.polls_until_confirm -= 1;
                    return Ok(Value::Null);
                }
                if let Some((address, motes)) = state.pending.take() {
                    *state.balances.entry(address).or_default() += motes;
                }
                Ok(json!({"confirmed": true}))
            }
            "getlatestblockhash" => Ok(json!(hex::encode([0x11u8; 32]))),
            "sendrawtransaction" => {
                state.submitted.push(params[0].as_str().unwrap().to_string());
                Ok(json!(Signature::from_bytes(SUBMIT_SIG).to_string()))
            }
            other => Err(TransportError(format!("unknown method {other}"))),
        }
    }
}

/// Tier-2 faucet that always refuses, counting the attempts.
struct DownFaucet(Arc<Mutex<u32>>);

#[async_trait]
impl Faucet for DownFaucet {
    async fn request(
        &self,
        _address: &Address,
        _motes: u64,
    ) -> Result<Signature, spigot_funding::airdrop::FaucetError> {
        *self.0.lock().unwrap() += 1;
        Err(spigot_funding::airdrop::FaucetError("faucet dry".into()))
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    store: FunderStore,
    client: ResilientClient<DevnetTransport>,
    transport: DevnetTransport,
    faucet: DownFaucet,
    web_calls: Arc<Mutex<u32>>,
}

impl Fixture {
    fn new(state: DevnetState) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FunderStore::open(dir.path());
        let pool = Arc::new(
            EndpointPool::new(vec![
                "http://node0.test".into(),
                "http://node1.test".into(),
            ])
            .unwrap(),
        );
        let transport = DevnetTransport::new(state);
        let client = ResilientClient::new(pool, transport.clone());
        let web_calls = Arc::new(Mutex::new(0));
        Self {
            _dir: dir,
            store,
            client,
            transport,
            faucet: DownFaucet(web_calls.clone()),
            web_calls,
        }
    }

    fn acquirer(&self) -> Acquirer<'_, DevnetTransport> {
        Acquirer::new(&self.client, &self.faucet, RetryPolicy::new(3, Duration::ZERO))
    }

    fn set_balance(&self, address: &Address, motes: u64) {
        self.transport
            .0
            .lock()
            .unwrap()
            .balances
            .insert(address.to_string(), motes);
    }
}

fn confirm_policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::ZERO)
}

fn dest() -> Address {
    Address::from_bytes([0xDDu8; 32])
}

#[tokio::test]
async fn pool_account_wins_when_primary_is_short() {
    let fixture = Fixture::new(DevnetState::default());
    let primary = fixture.store.create_primary().unwrap();
    let pool_account = fixture.store.create_pool_account().unwrap();
    fixture.set_balance(&primary.address(), 3 * COIN / 10);
    fixture.set_balance(&pool_account.address(), 6 * COIN / 10);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let chosen = selector.select(COIN / 2).await.unwrap();

    assert_eq!(chosen.address(), pool_account.address());
    assert_eq!(fixture.transport.count("requestairdrop"), 0);
    assert_eq!(*fixture.web_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn primary_qualifies_at_exact_boundary() {
    let fixture = Fixture::new(DevnetState::default());
    let primary = fixture.store.create_primary().unwrap();
    fixture.store.create_pool_account().unwrap();
    fixture.set_balance(&primary.address(), COIN / 2);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let chosen = selector.select(COIN / 2).await.unwrap();

    // Balance equal to the requirement qualifies: >= not >.
    assert_eq!(chosen.address(), primary.address());
    // The pool was never consulted.
    assert_eq!(fixture.transport.count("getbalance"), 1);
}

#[tokio::test]
async fn top_up_cycle_rescues_underfunded_primary() {
    let fixture = Fixture::new(DevnetState {
        airdrop_ok: true,
        polls_until_confirm: 2,
        ..Default::default()
    });
    let primary = fixture.store.create_primary().unwrap();
    fixture.set_balance(&primary.address(), 2 * COIN / 10);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let chosen = selector.select(COIN / 2).await.unwrap();

    // Exactly one top-up cycle: 0.2 + 0.5 airdropped = 0.7.
    assert_eq!(chosen.address(), primary.address());
    assert_eq!(fixture.transport.count("requestairdrop"), 1);
    let balance = fixture.client.get_balance(&primary.address()).await.unwrap();
    assert_eq!(balance, 7 * COIN / 10);
}

#[tokio::test]
async fn selection_is_idempotent_on_stable_balances() {
    let fixture = Fixture::new(DevnetState::default());
    fixture.store.create_primary().unwrap();
    let pool_account = fixture.store.create_pool_account().unwrap();
    fixture.set_balance(&pool_account.address(), COIN);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let first = selector.select(COIN / 2).await.unwrap();
    let second = selector.select(COIN / 2).await.unwrap();
    assert_eq!(first.address(), second.address());
}

#[tokio::test]
async fn fails_when_nothing_can_be_funded() {
    // Faucets down everywhere, primary and pool all broke.
    let fixture = Fixture::new(DevnetState::default());
    fixture.store.create_primary().unwrap();
    fixture.store.create_pool_account().unwrap();

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let err = selector.select(COIN / 2).await.unwrap_err();

    assert!(matches!(
        err,
        FundingError::NoFundedAccountAvailable { required } if required == COIN / 2
    ));
    // Both tiers exhausted their budgets: 3 RPC + 3 web attempts.
    assert_eq!(fixture.transport.count("requestairdrop"), 3);
    assert_eq!(*fixture.web_calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn empty_store_fails_without_airdrop_attempts() {
    let fixture = Fixture::new(DevnetState {
        airdrop_ok: true,
        ..Default::default()
    });

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let err = selector.select(COIN / 2).await.unwrap_err();

    assert!(matches!(err, FundingError::NoFundedAccountAvailable { .. }));
    // No primary to top up, so no funding request was ever issued.
    assert_eq!(fixture.transport.count("requestairdrop"), 0);
}

#[tokio::test]
async fn zero_amount_rejected_before_any_network_call() {
    let fixture = Fixture::new(DevnetState::default());
    fixture.store.create_primary().unwrap();

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let err = transfer::send(&selector, &fixture.client, &dest(), 0)
        .await
        .unwrap_err();

    assert!(matches!(err, FundingError::InvalidAmount { motes: 0 }));
    assert!(fixture.transport.calls().is_empty());
}

#[tokio::test]
async fn transfer_submits_a_verifiable_transaction() {
    let fixture = Fixture::new(DevnetState::default());
    let primary = fixture.store.create_primary().unwrap();
    fixture.set_balance(&primary.address(), COIN);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let reference = transfer::send(&selector, &fixture.client, &dest(), COIN / 2)
        .await
        .unwrap();

    assert_eq!(reference, Signature::from_bytes(SUBMIT_SIG));

    let submitted = fixture.transport.submitted();
    assert_eq!(submitted.len(), 1);
    let tx = SignedTransaction::from_wire_hex(&submitted[0]).unwrap();
    tx.verify().unwrap();
    assert_eq!(tx.message.from, primary.address());
    assert_eq!(tx.message.to, dest());
    assert_eq!(tx.message.motes, COIN / 2);
}

#[tokio::test]
async fn submitted_transfer_confirms_via_waiter() {
    let fixture = Fixture::new(DevnetState {
        polls_until_confirm: 3,
        ..Default::default()
    });
    let primary = fixture.store.create_primary().unwrap();
    fixture.set_balance(&primary.address(), COIN);

    let acquirer = fixture.acquirer();
    let selector = Selector::new(&fixture.store, &fixture.client, &acquirer, confirm_policy());
    let reference = transfer::send(&selector, &fixture.client, &dest(), COIN / 4)
        .await
        .unwrap();

    assert!(await_confirmation(&fixture.client, &reference, &confirm_policy()).await);
    assert_eq!(fixture.transport.count("gettransactionstatus"), 4);
}
