//! # Shared Fixtures
//!
//! Builders for the relay states most flows start from: a chain with three
//! genesis admins, registered appchains and their services.

use anyhow::{anyhow, ensure, Result};
use bolt_contracts::addresses;
use bolt_contracts::domain::proposal::{Proposal, ProposalStatus};
use bolt_contracts::domain::{Appchain, Service};
use bolt_contracts::governance::proposals::GovernanceResult;
use bolt_contracts::testing::{account, TestChain};
use bolt_vm::domain::entities::{Ibtp, IbtpType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::telemetry::{init_logging, LogConfig};
use std::sync::Once;

/// Relay chain id of every fixture.
pub const BXH: &str = "1356";

/// Master rule address registered with every fixture appchain.
pub const MASTER_RULE: &str = "0x00000000000000000000000000000000000000e1";

/// Number of genesis admins in [`relay`].
pub const ADMINS: u64 = 3;

/// Admin account of the `n`th fixture appchain.
pub fn chain_admin(n: u64) -> String {
    account(1_000 + n)
}

static LOGGING: Once = Once::new();

/// Install contract logging once per test binary, when `BOLT_LOG_LEVEL`
/// asks for it.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        if std::env::var_os("BOLT_LOG_LEVEL").is_some() {
            let _ = init_logging(&LogConfig::from_env());
        }
    });
}

/// A relay with [`ADMINS`] genesis admins.
pub fn relay() -> TestChain {
    init_test_logging();
    TestChain::with_admins(ADMINS).expect("genesis")
}

/// Decode the [`GovernanceResult`] of a successful call.
pub fn governance_result(res: Response) -> Result<GovernanceResult> {
    let data = res.into_result().map_err(|e| anyhow!(e))?;
    Ok(serde_json::from_slice(&data)?)
}

/// Vote `approve` with every genesis admin and check the proposal passed.
pub fn approve(chain: &mut TestChain, proposal_id: &str) -> Result<Proposal> {
    let proposal = chain.vote_all(proposal_id, "approve").map_err(|e| anyhow!(e))?;
    ensure!(
        proposal.status == ProposalStatus::Approved,
        "proposal {proposal_id} is {}",
        proposal.status
    );
    Ok(proposal)
}

/// Arguments of a `RegisterAppchain` call sent by `admin`.
pub fn appchain_args(chain_id: &str, admin: &str) -> Vec<Arg> {
    vec![
        Arg::string(chain_id),
        Arg::string(format!("{chain_id}-name")),
        Arg::string("Fabric V1.4.3"),
        Arg::bytes(format!("validators of {chain_id}").into_bytes()),
        Arg::string(format!("broker-{chain_id}")),
        Arg::string("fixture appchain"),
        Arg::string(MASTER_RULE),
        Arg::string("https://rules.bitxhub.local/fabric"),
        Arg::string(admin),
        Arg::string("join the relay"),
    ]
}

/// Open the registration proposal of `chain_id`.
pub fn register_appchain(chain: &mut TestChain, chain_id: &str, admin: &str) -> Result<String> {
    let res = chain.call(admin, addresses::APPCHAIN_MANAGER, "RegisterAppchain", appchain_args(chain_id, admin));
    Ok(governance_result(res)?.proposal_id)
}

/// Register and approve `chain_id`.
pub fn setup_appchain(chain: &mut TestChain, chain_id: &str, admin: &str) -> Result<()> {
    let proposal_id = register_appchain(chain, chain_id, admin)?;
    approve(chain, &proposal_id)?;
    Ok(())
}

/// Arguments of a `RegisterService` call.
pub fn service_args(chain_id: &str, service_id: &str, ordered: bool, permits: &str) -> Vec<Arg> {
    vec![
        Arg::string(chain_id),
        Arg::string(service_id),
        Arg::string(format!("{chain_id}-{service_id}")),
        Arg::string("CallContract"),
        Arg::string("fixture service"),
        Arg::bool(ordered),
        Arg::string(permits),
        Arg::string("{}"),
        Arg::string("expose"),
    ]
}

/// Open the registration proposal of `chain_id:service_id`.
pub fn register_service(
    chain: &mut TestChain,
    admin: &str,
    chain_id: &str,
    service_id: &str,
    ordered: bool,
) -> Result<String> {
    let res = chain.call(
        admin,
        addresses::SERVICE_MANAGER,
        "RegisterService",
        service_args(chain_id, service_id, ordered, ""),
    );
    Ok(governance_result(res)?.proposal_id)
}

/// Call `RegisterService` for `chain_id:service_id` with the display name
/// `name` instead of the fixture default.
pub fn register_named_service(
    chain: &mut TestChain,
    admin: &str,
    chain_id: &str,
    service_id: &str,
    name: &str,
) -> Response {
    let mut args = service_args(chain_id, service_id, false, "");
    args[2] = Arg::string(name);
    chain.call(admin, addresses::SERVICE_MANAGER, "RegisterService", args)
}

/// Register and approve `chain_id:service_id`.
pub fn setup_service(chain: &mut TestChain, admin: &str, chain_id: &str, service_id: &str, ordered: bool) -> Result<()> {
    let proposal_id = register_service(chain, admin, chain_id, service_id, ordered)?;
    approve(chain, &proposal_id)?;
    Ok(())
}

/// Two available appchains, `chainA` with ordered `svcA` and `chainB` with
/// ordered `svcB`.
pub fn two_chain_relay() -> Result<TestChain> {
    let mut chain = relay();
    populate_two_chains(&mut chain)?;
    Ok(chain)
}

/// Install the [`two_chain_relay`] appchains and services on `chain`.
pub fn populate_two_chains(chain: &mut TestChain) -> Result<()> {
    setup_appchain(chain, "chainA", &chain_admin(1))?;
    setup_appchain(chain, "chainB", &chain_admin(2))?;
    setup_service(chain, &chain_admin(1), "chainA", "svcA", true)?;
    setup_service(chain, &chain_admin(2), "chainB", "svcB", true)?;
    Ok(())
}

/// `bxh:chain:service`.
pub fn full_id(chain_id: &str, service_id: &str) -> String {
    format!("{BXH}:{chain_id}:{service_id}")
}

/// An IBTP between two fixture services.
pub fn ibtp(from: &str, to: &str, index: u64, typ: IbtpType) -> Ibtp {
    Ibtp {
        from: from.to_string(),
        to: to.to_string(),
        index,
        typ,
        timeout_height: 0,
        proof: b"proof".to_vec(),
        payload: b"payload".to_vec(),
    }
}

/// Current state of an appchain.
pub fn appchain(chain: &mut TestChain, chain_id: &str) -> Result<Appchain> {
    chain
        .query(addresses::APPCHAIN_MANAGER, "GetAppchain", vec![Arg::string(chain_id)])
        .map_err(|e| anyhow!(e))
}

/// Current state of a service.
pub fn service(chain: &mut TestChain, chain_service_id: &str) -> Result<Service> {
    chain
        .query(addresses::SERVICE_MANAGER, "GetServiceInfo", vec![Arg::string(chain_service_id)])
        .map_err(|e| anyhow!(e))
}

/// Boolean result of a query.
pub fn query_bool(chain: &mut TestChain, address: &str, method: &str, args: Vec<Arg>) -> bool {
    chain.call(&account(0), address, method, args).result_str() == "true"
}
