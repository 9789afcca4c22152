//! # Test Harness
//!
//! An in-memory relay with the built-in contracts installed and the genesis
//! state applied. Each call runs as its own transaction; a failed call rolls
//! the ledger back the way the executor would.
//!
//! ```ignore
//! let mut chain = TestChain::with_admins(3)?;
//! let res = chain.call(&chain.admin(0), addresses::GOVERNANCE, "GetNotClosedProposals", vec![]);
//! assert!(res.ok);
//! ```

use crate::addresses;
use crate::config::GovernanceConfig;
use crate::domain::proposal::Proposal;
use crate::errors::ContractResult;
use crate::genesis;
use crate::registry::builtin_registry;
use bolt_vm::adapters::{InMemoryLedger, StaticValidationEngine, StateWrite};
use bolt_vm::domain::entities::{Event, EventType, ExecutionContext, Ibtp, Response, TxInfo};
use bolt_vm::domain::value_objects::{Address, Arg, TxHash};
use bolt_vm::ports::{LedgerState, ValidationEngine};
use bolt_vm::BoltVm;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Nanoseconds between two harness transactions.
const BLOCK_INTERVAL: i64 = 1_000_000_000;

/// A deterministic address derived from `seed`.
#[must_use]
pub fn account(seed: u64) -> String {
    format!("0x{seed:040x}")
}

/// In-memory relay running the built-in contracts.
pub struct TestChain {
    vm: BoltVm,
    ledger: Arc<InMemoryLedger>,
    config: GovernanceConfig,
    tx_count: u64,
}

impl TestChain {
    /// Chain with `config`, accepting every IBTP proof.
    pub fn new(config: GovernanceConfig) -> ContractResult<Self> {
        Self::with_engine(config, Arc::new(StaticValidationEngine::accept_all()))
    }

    /// Chain with `count` genesis admins, `account(1)..=account(count)`.
    pub fn with_admins(count: u64) -> ContractResult<Self> {
        Self::new(GovernanceConfig::default().with_super_admins((1..=count).map(account)))
    }

    /// Chain with an explicit validation engine.
    pub fn with_engine(config: GovernanceConfig, engine: Arc<dyn ValidationEngine>) -> ContractResult<Self> {
        let ledger = Arc::new(InMemoryLedger::new());
        genesis::apply(ledger.as_ref(), &config)?;
        let registry = builtin_registry(&config)?;
        Ok(Self {
            vm: BoltVm::new(Arc::new(registry), engine),
            ledger,
            config,
            tx_count: 0,
        })
    }

    /// Governance configuration in force.
    #[must_use]
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Genesis admin `i` (zero based).
    #[must_use]
    pub fn admin(&self, i: usize) -> String {
        self.config.super_admins.get(i).cloned().unwrap_or_default()
    }

    /// Underlying ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Run `method` on `address` as a transaction sent by `caller`.
    pub fn call(&mut self, caller: &str, address: &str, method: &str, args: Vec<Arg>) -> Response {
        self.call_recorded(caller, address, method, args).0
    }

    /// Like [`TestChain::call`], also returning the writes the transaction
    /// made. The log is taken before a failed call is rolled back.
    pub fn call_recorded(
        &mut self,
        caller: &str,
        address: &str,
        method: &str,
        args: Vec<Arg>,
    ) -> (Response, Vec<StateWrite>) {
        let ctx = self.next_context(caller, address);
        let snapshot = self.ledger.snapshot();
        let logged = self.ledger.write_count();
        let response = self.vm.execute(&ctx, method, &args);
        let writes = self.ledger.writes().split_off(logged);
        if !response.ok {
            self.ledger.restore(snapshot);
        }
        (response, writes)
    }

    /// Like [`TestChain::call`], decoding a successful JSON result.
    pub fn query<T: DeserializeOwned>(
        &mut self,
        address: &str,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<T, String> {
        let data = self.call(&account(0), address, method, args).into_result()?;
        serde_json::from_slice(&data).map_err(|e| e.to_string())
    }

    /// Relay an IBTP through the typed fast path.
    pub fn handle_ibtp(&mut self, caller: &str, ibtp: &Ibtp) -> Response {
        let ctx = self.next_context(caller, addresses::INTERCHAIN);
        let snapshot = self.ledger.snapshot();
        let response = match self.vm.handle_ibtp(&ctx, ibtp) {
            Ok(response) => response,
            Err(err) => Response::error(err.to_string()),
        };
        if !response.ok {
            self.ledger.restore(snapshot);
        }
        response
    }

    /// Cast `ballot` from the genesis admins in order until the proposal
    /// closes, returning its final state.
    pub fn vote_all(&mut self, proposal_id: &str, ballot: &str) -> Result<Proposal, String> {
        for voter in self.config.super_admins.clone() {
            self.call(
                &voter,
                addresses::GOVERNANCE,
                "Vote",
                vec![Arg::string(proposal_id), Arg::string(ballot), Arg::string("")],
            )
            .into_result()?;
            let proposal = self.proposal(proposal_id)?;
            if !proposal.is_open() {
                return Ok(proposal);
            }
        }
        self.proposal(proposal_id)
    }

    /// Current state of a proposal.
    pub fn proposal(&mut self, proposal_id: &str) -> Result<Proposal, String> {
        self.query(addresses::GOVERNANCE, "GetProposal", vec![Arg::string(proposal_id)])
    }

    /// Every event posted so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.ledger.events()
    }

    /// Events of one kind.
    #[must_use]
    pub fn events_of(&self, event_type: EventType) -> Vec<Event> {
        self.ledger.events_of(event_type)
    }

    /// Writes recorded since the last [`TestChain::clear_writes`].
    #[must_use]
    pub fn writes(&self) -> Vec<StateWrite> {
        self.ledger.writes()
    }

    /// Forget recorded writes.
    pub fn clear_writes(&self) {
        self.ledger.clear_write_log();
    }

    /// Raw state of `key` in the contract at `address`.
    #[must_use]
    pub fn state(&self, address: &str, key: &str) -> Option<Vec<u8>> {
        self.ledger.get_state(&Address::new(address), key.as_bytes())
    }

    fn next_context(&mut self, caller: &str, address: &str) -> ExecutionContext {
        self.tx_count += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&self.tx_count.to_be_bytes());
        let tx = TxInfo {
            hash: TxHash(hash),
            index: 0,
            timestamp: BLOCK_INTERVAL.saturating_mul(i64::try_from(self.tx_count).unwrap_or(i64::MAX)),
            height: self.tx_count,
        };
        let ledger: Arc<dyn LedgerState> = self.ledger.clone();
        ExecutionContext::new_transaction(Address::new(caller), Address::new(address), tx, ledger)
    }
}
