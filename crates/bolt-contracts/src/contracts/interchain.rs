//! # Interchain Manager
//!
//! Keeps the per-service IBTP counters and admits interchain messages.
//!
//! ## IBTP Admission
//!
//! | Check | Request | Receipt |
//! |-------|---------|---------|
//! | Proof | source chain's master rule | destination chain's master rule |
//! | Appchain | source must be available | destination must be available |
//! | Service | destination available, admits source | - |
//! | Index | request counter + 1 (ordered) | receipt counter + 1 (ordered), never above the request counter |
//!
//! Checks run only for the side registered on this relay. A message passing
//! between two foreign relays is counted but not validated here.
//!
//! Both entry points (`HandleIBTPData` and the typed fast path) share one
//! implementation.

use super::respond;
use crate::addresses;
use crate::config::GovernanceConfig;
use crate::domain::appchain::Appchain;
use crate::domain::ids::parse_ibtp_service;
use crate::domain::interchain::{ChainService, Interchain, InterchainEvent, InterchainMeta};
use crate::domain::rule::Rule;
use crate::domain::service::Service;
use crate::errors::{ContractError, ContractResult};
use crate::governance::call::{invoke, invoke_bool, invoke_json, json_response};
use crate::governance::permission::only;
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{Ibtp, IbtpType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::{Contract, IbtpHandler, Stub, StubExt};
use bolt_vm::VmError;
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "interchain";

/// State key of the relay chain id.
pub const BITXHUB_ID_KEY: &str = "bitxhub-id";

fn tx_key(ibtp_id: &str) -> String {
    format!("index-tx-{ibtp_id}")
}

fn receipt_tx_key(ibtp_id: &str) -> String {
    format!("index-receipt-tx-{ibtp_id}")
}

fn send_window_key(id: &str) -> String {
    format!("index-send-interchain-{id}")
}

fn receipt_window_key(id: &str) -> String {
    format!("index-receipt-interchain-{id}")
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug)]
enum Op {
    Register { chain_service_id: String },
    GetBitXHubID,
    GetInterchain { full_service_id: String },
    ParseChainService { id: String },
    HandleIBTPData { data: Vec<u8> },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "Register" => {
                n(1)?;
                Self::Register { chain_service_id: args.string(0)? }
            }
            "GetBitXHubID" => {
                n(0)?;
                Self::GetBitXHubID
            }
            "GetInterchain" | "Interchain" => {
                n(1)?;
                Self::GetInterchain { full_service_id: args.string(0)? }
            }
            "ParseChainService" => {
                n(1)?;
                Self::ParseChainService { id: args.string(0)? }
            }
            "HandleIBTPData" => {
                n(1)?;
                Self::HandleIBTPData { data: args.bytes(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Interchain manager contract.
pub struct InterchainManager {
    config: Arc<GovernanceConfig>,
}

impl InterchainManager {
    /// Create the contract.
    #[must_use]
    pub fn new(config: Arc<GovernanceConfig>) -> Self {
        Self { config }
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        match op {
            Op::Register { chain_service_id } => {
                only(stub, addresses::SERVICE_MANAGER)?;
                let full = format!("{}:{chain_service_id}", self.bitxhub_id(stub));
                let record = match load(stub, &full)? {
                    Some(record) => record,
                    None => {
                        let record = Interchain::new(&full);
                        stub.set_object(&Interchain::key(&full), &record)?;
                        info!("[{COMPONENT}] registered {full}");
                        record
                    }
                };
                json_response(&record)
            }
            Op::GetBitXHubID => Ok(Response::success(self.bitxhub_id(stub))),
            Op::GetInterchain { full_service_id } => {
                let record = load(stub, &full_service_id)?.ok_or_else(|| {
                    ContractError::not_found(format!("this service does not exist: {full_service_id}"))
                })?;
                json_response(&record)
            }
            Op::ParseChainService { id } => json_response(&self.parse(stub, &id)?),
            Op::HandleIBTPData { data } => {
                let ibtp: Ibtp = serde_json::from_slice(&data)
                    .map_err(|e| ContractError::invalid(format!("invalid ibtp: {e}")))?;
                self.handle(stub, &ibtp)
            }
        }
    }

    fn bitxhub_id(&self, stub: &dyn Stub) -> String {
        stub.get(BITXHUB_ID_KEY)
            .map(|id| String::from_utf8_lossy(&id).into_owned())
            .unwrap_or_else(|| self.config.bitxhub_id.clone())
    }

    fn parse(&self, stub: &dyn Stub, id: &str) -> ContractResult<ChainService> {
        let local = self.bitxhub_id(stub);
        let full = parse_ibtp_service(id, &local)?;
        Ok(ChainService {
            is_local: full.bitxhub_id == local,
            bxh_id: full.bitxhub_id,
            chain_id: full.chain_service.chain_id,
            service_id: full.chain_service.service_id,
        })
    }

    // =========================================================================
    // IBTP HANDLING
    // =========================================================================

    fn handle(&self, stub: &dyn Stub, ibtp: &Ibtp) -> ContractResult<Response> {
        let src = self
            .parse(stub, &ibtp.from)
            .map_err(|e| ContractError::invalid(format!("invalid ibtp: parse source chain service id: {e}")))?;
        let dst = self
            .parse(stub, &ibtp.to)
            .map_err(|e| ContractError::invalid(format!("invalid target service: {e}")))?;
        let from = src.full_service_id();

        let record = match load(stub, &from)? {
            Some(record) => record,
            None if src.is_local => {
                return Err(ContractError::not_found(format!("this service does not exist: {from}")));
            }
            None => Interchain::new(&from),
        };

        if ibtp.typ.is_receipt() {
            check_receipt(stub, ibtp, &src, &dst, &record)?;
        } else {
            check_request(stub, ibtp, &src, &dst, &record)?;
        }
        let ibtp_id = self.process(stub, ibtp, &src, &dst, record)?;
        Ok(Response::success(ibtp_id))
    }

    fn process(
        &self,
        stub: &dyn Stub,
        ibtp: &Ibtp,
        src: &ChainService,
        dst: &ChainService,
        mut record: Interchain,
    ) -> ContractResult<String> {
        let from = src.full_service_id();
        let to = dst.full_service_id();
        let ibtp_id = format!("{from}-{to}-{}", ibtp.index);
        let tx_hash = stub.tx_hash().to_hex();
        let is_receipt = ibtp.typ.is_receipt();

        if is_receipt {
            record.receipt_counter.insert(to.clone(), ibtp.index);
        } else {
            *record.interchain_counter.entry(to.clone()).or_default() += 1;
        }
        stub.set_object(&Interchain::key(&from), &record)?;

        let mut target = load(stub, &to)?.unwrap_or_else(|| Interchain::new(&to));
        if is_receipt {
            target.source_receipt_counter.insert(from.clone(), ibtp.index);
            stub.set_object(&receipt_tx_key(&ibtp_id), &tx_hash)?;
        } else {
            target.source_interchain_counter.insert(from.clone(), ibtp.index);
            stub.set_object(&tx_key(&ibtp_id), &tx_hash)?;

            let meta = InterchainMeta {
                target_chain: ibtp.to.clone(),
                tx_hash: tx_hash.clone(),
                timestamp: stub.tx_timestamp(),
            };
            self.push_meta(stub, &send_window_key(&ibtp.from), meta.clone())?;
            self.push_meta(
                stub,
                &receipt_window_key(&ibtp.to),
                InterchainMeta {
                    target_chain: ibtp.from.clone(),
                    ..meta
                },
            )?;
        }
        stub.set_object(&Interchain::key(&to), &target)?;

        stub.post_interchain_event(&InterchainEvent {
            ibtp_id: ibtp_id.clone(),
            from: from.clone(),
            to: to.clone(),
            index: ibtp.index,
            is_receipt,
            source: record,
        })?;

        if is_receipt && dst.is_local {
            invoke(
                stub,
                addresses::SERVICE_MANAGER,
                "RecordInvokeService",
                vec![
                    Arg::string(&to),
                    Arg::string(&from),
                    Arg::bool(ibtp.typ == IbtpType::ReceiptSuccess),
                ],
            )?;
        }

        info!("[{COMPONENT}] handled ibtp {ibtp_id}");
        Ok(ibtp_id)
    }

    fn push_meta(&self, stub: &dyn Stub, key: &str, meta: InterchainMeta) -> ContractResult<()> {
        let mut window: Vec<InterchainMeta> = stub.get_object(key)?.unwrap_or_default();
        window.push(meta);
        let overflow = window.len().saturating_sub(self.config.interchain_meta_window);
        window.drain(..overflow);
        stub.set_object(key, &window)?;
        Ok(())
    }
}

fn load(stub: &dyn Stub, full_service_id: &str) -> ContractResult<Option<Interchain>> {
    Ok(stub.get_object(&Interchain::key(full_service_id))?)
}

fn check_request(
    stub: &dyn Stub,
    ibtp: &Ibtp,
    src: &ChainService,
    dst: &ChainService,
    record: &Interchain,
) -> ContractResult<()> {
    if src.is_local {
        let chain = available_appchain(stub, &src.chain_id, "current appchain not available")?;
        let src_id = src.chain_service_id();
        if !invoke_bool(stub, addresses::SERVICE_MANAGER, "IsAvailable", vec![Arg::string(&src_id)])? {
            return Err(ContractError::invalid(format!("the service {src_id} is not available")));
        }
        verify_proof(stub, &chain, ibtp)?;
    }

    let ordered = if dst.is_local {
        let service = service_info(stub, dst)?;
        if !service.is_available() {
            return Err(ContractError::invalid(format!(
                "target service not available: {} is {}",
                service.chain_service_id(),
                service.status
            )));
        }
        let from = src.full_service_id();
        if !service.admits(&from) {
            return Err(ContractError::denied(
                from,
                format!("target service not available: not permitted to visit {}", dst.full_service_id()),
            ));
        }
        service.ordered
    } else {
        true
    };

    if ordered {
        let last = record.interchain_counter.get(&dst.full_service_id()).copied().unwrap_or(0);
        check_index(ibtp.index, last)?;
    }
    Ok(())
}

fn check_receipt(
    stub: &dyn Stub,
    ibtp: &Ibtp,
    src: &ChainService,
    dst: &ChainService,
    record: &Interchain,
) -> ContractResult<()> {
    if dst.is_local {
        let chain = available_appchain(stub, &dst.chain_id, "target appchain not available")?;
        verify_proof(stub, &chain, ibtp)?;
    }

    let to = dst.full_service_id();
    let sent = record.interchain_counter.get(&to).copied().unwrap_or(0);
    if ibtp.index > sent {
        return Err(ContractError::invalid(format!(
            "wrong index: receipt {} exceeds request index {sent}",
            ibtp.index
        )));
    }

    let ordered = if src.is_local { service_info(stub, src)?.ordered } else { true };
    if ordered {
        let last = record.receipt_counter.get(&to).copied().unwrap_or(0);
        check_index(ibtp.index, last)?;
    }
    Ok(())
}

fn check_index(index: u64, last: u64) -> ContractResult<()> {
    let required = last.saturating_add(1);
    if index <= last {
        return Err(ContractError::invalid(format!(
            "index already exists: required {required}, but {index}"
        )));
    }
    if index > required {
        return Err(ContractError::invalid(format!("wrong index: required {required}, but {index}")));
    }
    Ok(())
}

fn available_appchain(stub: &dyn Stub, chain_id: &str, context: &str) -> ContractResult<Appchain> {
    let chain: Appchain = invoke_json(stub, addresses::APPCHAIN_MANAGER, "GetAppchain", vec![Arg::string(chain_id)])
        .map_err(|e| ContractError::invalid(format!("{context}: appchain {chain_id} is not registered: {e}")))?;
    if !chain.is_available() {
        return Err(ContractError::invalid(format!(
            "{context}: appchain {chain_id} is {}, can not handle IBTP",
            chain.status
        )));
    }
    Ok(chain)
}

fn service_info(stub: &dyn Stub, service: &ChainService) -> ContractResult<Service> {
    invoke_json(
        stub,
        addresses::SERVICE_MANAGER,
        "GetServiceInfo",
        vec![Arg::string(service.chain_service_id())],
    )
}

fn verify_proof(stub: &dyn Stub, chain: &Appchain, ibtp: &Ibtp) -> ContractResult<()> {
    let rule: Rule = invoke_json(stub, addresses::RULE_MANAGER, "GetMasterRule", vec![Arg::string(&chain.id)])?;
    let validators = String::from_utf8_lossy(&chain.trust_root);
    let ok = stub
        .validation_engine()
        .validate(&rule.address, &chain.id, &ibtp.proof, &ibtp.payload, &validators)
        .map_err(|e| ContractError::invalid(format!("invalid ibtp: {e}")))?;
    if !ok {
        return Err(ContractError::invalid(format!(
            "invalid ibtp: proof of {} rejected by rule {}",
            ibtp.id(),
            rule.address
        )));
    }
    debug!("[{COMPONENT}] proof of {} verified by {}", ibtp.id(), rule.address);
    Ok(())
}

impl Contract for InterchainManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}

impl IbtpHandler for InterchainManager {
    fn handle_ibtp(&self, stub: &dyn Stub, ibtp: &Ibtp) -> Response {
        respond(COMPONENT, "HandleIBTP", self.handle(stub, ibtp))
    }
}
