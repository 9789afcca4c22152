//! # Interchain Flows
//!
//! IBTP admission and bookkeeping between two fixture appchains:
//!
//! ```text
//!   chainA:svcA  ──request(1..n)──►  chainB:svcB
//!                ◄──receipt(1..n)──
//! ```
//!
//! Every rejected message must leave the counters, windows and event log
//! untouched.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bolt_contracts::addresses;
    use bolt_contracts::domain::interchain::{ChainService, InterchainMeta};
    use bolt_contracts::domain::Interchain;
    use bolt_contracts::testing::{account, TestChain};
    use bolt_contracts::GovernanceConfig;
    use bolt_vm::adapters::StaticValidationEngine;
    use bolt_vm::domain::entities::{EventType as LogEventType, IbtpType, Response};
    use bolt_vm::domain::value_objects::Arg;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn src() -> String {
        full_id("chainA", "svcA")
    }

    fn dst() -> String {
        full_id("chainB", "svcB")
    }

    fn send(chain: &mut TestChain, index: u64) -> Response {
        chain.handle_ibtp(&account(0), &ibtp(&src(), &dst(), index, IbtpType::Interchain))
    }

    fn receipt(chain: &mut TestChain, index: u64, typ: IbtpType) -> Response {
        chain.handle_ibtp(&account(0), &ibtp(&src(), &dst(), index, typ))
    }

    fn record(chain: &mut TestChain, id: &str) -> Interchain {
        chain
            .query(addresses::INTERCHAIN, "GetInterchain", vec![Arg::string(id)])
            .unwrap()
    }

    /// Two-chain relay validating proofs with `engine`.
    fn relay_with_engine(engine: StaticValidationEngine) -> TestChain {
        let config = GovernanceConfig::default().with_super_admins((1..=ADMINS).map(account));
        let mut chain = TestChain::with_engine(config, Arc::new(engine)).unwrap();
        populate_two_chains(&mut chain).unwrap();
        chain
    }

    fn governance_action(chain: &mut TestChain, caller: &str, address: &str, method: &str, args: Vec<Arg>) {
        let res = chain.call(caller, address, method, args);
        let id = governance_result(res).unwrap().proposal_id;
        approve(chain, &id).unwrap();
    }

    /// Assert a rejected IBTP left no trace.
    fn assert_untouched(chain: &mut TestChain, before: (Interchain, usize)) {
        assert_eq!(record(chain, &src()), before.0);
        assert_eq!(chain.events_of(LogEventType::Interchain).len(), before.1);
    }

    fn snapshot(chain: &mut TestChain) -> (Interchain, usize) {
        (record(chain, &src()), chain.events_of(LogEventType::Interchain).len())
    }

    // =============================================================================
    // ADMISSION AND COUNTERS
    // =============================================================================

    #[test]
    fn test_request_then_receipt_updates_both_sides() {
        let mut chain = two_chain_relay().unwrap();

        let res = send(&mut chain, 1);
        assert!(res.ok, "{}", res.result_str());
        let ibtp_id = format!("{}-{}-1", src(), dst());
        assert_eq!(res.result_str(), ibtp_id);
        assert!(chain.state(addresses::INTERCHAIN, &format!("index-tx-{ibtp_id}")).is_some());

        let res = receipt(&mut chain, 1, IbtpType::ReceiptSuccess);
        assert!(res.ok, "{}", res.result_str());
        assert!(chain
            .state(addresses::INTERCHAIN, &format!("index-receipt-tx-{ibtp_id}"))
            .is_some());

        let source = record(&mut chain, &src());
        assert_eq!(source.interchain_counter.get(&dst()), Some(&1));
        assert_eq!(source.receipt_counter.get(&dst()), Some(&1));
        let target = record(&mut chain, &dst());
        assert_eq!(target.source_interchain_counter.get(&src()), Some(&1));
        assert_eq!(target.source_receipt_counter.get(&src()), Some(&1));

        assert_eq!(chain.events_of(LogEventType::Interchain).len(), 2);
        let svc = service(&mut chain, "chainB:svcB").unwrap();
        assert_eq!(svc.invoke_count, 1);
        assert!((svc.invoke_success_rate - 1.0).abs() < 1e-9);
        assert_eq!(svc.invoke_records[&src()].invoke_count, 1);
    }

    #[test]
    fn test_short_service_ids_resolve_to_local_relay() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.handle_ibtp(
            &account(0),
            &ibtp("chainA:svcA", "chainB:svcB", 1, IbtpType::Interchain),
        );
        assert_eq!(res.result_str(), format!("{}-{}-1", src(), dst()));
        assert_eq!(record(&mut chain, &src()).interchain_counter.get(&dst()), Some(&1));
    }

    #[test]
    fn test_index_gap_refused() {
        let mut chain = two_chain_relay().unwrap();
        let before = snapshot(&mut chain);

        let res = send(&mut chain, 2);
        assert!(!res.ok);
        assert!(res.result_str().contains("wrong index: required 1, but 2"), "{}", res.result_str());
        assert_untouched(&mut chain, before);
    }

    #[test]
    fn test_replayed_index_refused() {
        let mut chain = two_chain_relay().unwrap();
        assert!(send(&mut chain, 1).ok);
        let before = snapshot(&mut chain);

        let res = send(&mut chain, 1);
        assert!(res.result_str().contains("index already exists: required 2, but 1"));
        assert_untouched(&mut chain, before);
    }

    #[test]
    fn test_receipt_cannot_overtake_requests() {
        let mut chain = two_chain_relay().unwrap();
        assert!(send(&mut chain, 1).ok);

        let res = receipt(&mut chain, 2, IbtpType::ReceiptSuccess);
        assert!(res.result_str().contains("exceeds request index 1"));
        assert!(receipt(&mut chain, 1, IbtpType::ReceiptSuccess).ok);
        assert!(!receipt(&mut chain, 1, IbtpType::ReceiptSuccess).ok);
    }

    #[test]
    fn test_failure_receipts_lower_success_rate() {
        let mut chain = two_chain_relay().unwrap();
        assert!(send(&mut chain, 1).ok);
        assert!(send(&mut chain, 2).ok);
        assert!(receipt(&mut chain, 1, IbtpType::ReceiptSuccess).ok);
        assert!(receipt(&mut chain, 2, IbtpType::ReceiptFailure).ok);

        let svc = service(&mut chain, "chainB:svcB").unwrap();
        assert_eq!(svc.invoke_count, 2);
        assert!((svc.invoke_success_rate - 0.5).abs() < 1e-9);
        assert_eq!(svc.invoke_records[&src()].fail_count, 1);
    }

    #[test]
    fn test_unordered_destination_skips_index_check() {
        let mut chain = two_chain_relay().unwrap();
        setup_service(&mut chain, &chain_admin(2), "chainB", "svcC", false).unwrap();

        let res = chain.handle_ibtp(
            &account(0),
            &ibtp(&src(), &full_id("chainB", "svcC"), 5, IbtpType::Interchain),
        );
        assert!(res.ok, "{}", res.result_str());
        assert_eq!(
            record(&mut chain, &src()).interchain_counter.get(&full_id("chainB", "svcC")),
            Some(&1)
        );
    }

    // =============================================================================
    // PROOFS
    // =============================================================================

    #[test]
    fn test_rejected_proof_refused() {
        let mut chain = relay_with_engine(StaticValidationEngine::reject_all());
        let before = snapshot(&mut chain);

        let res = send(&mut chain, 1);
        assert!(res.result_str().contains("invalid ibtp"), "{}", res.result_str());
        assert_untouched(&mut chain, before);
    }

    #[test]
    fn test_unavailable_rule_refused() {
        let mut chain = relay_with_engine(StaticValidationEngine::accept_all().with_unavailable(MASTER_RULE));
        let res = send(&mut chain, 1);
        assert!(!res.ok);
        assert!(res.result_str().contains("invalid ibtp"));
    }

    #[test]
    fn test_remote_source_is_counted_without_proof() {
        let mut chain = relay_with_engine(StaticValidationEngine::reject_all());
        let remote = "1357:chainR:svcR";

        let res = chain.handle_ibtp(&account(0), &ibtp(remote, &dst(), 1, IbtpType::Interchain));
        assert!(res.ok, "{}", res.result_str());
        assert_eq!(record(&mut chain, remote).interchain_counter.get(&dst()), Some(&1));

        // svcB is ordered, so the remote index is checked all the same
        let res = chain.handle_ibtp(&account(0), &ibtp(remote, &dst(), 1, IbtpType::Interchain));
        assert!(!res.ok);
    }

    // =============================================================================
    // AVAILABILITY AND PERMISSIONS
    // =============================================================================

    #[test]
    fn test_frozen_source_chain_refused() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);
        governance_action(
            &mut chain,
            &admin,
            addresses::APPCHAIN_MANAGER,
            "FreezeAppchain",
            vec![Arg::string("chainA"), Arg::string("")],
        );

        let res = send(&mut chain, 1);
        assert!(res.result_str().contains("current appchain not available"), "{}", res.result_str());
    }

    #[test]
    fn test_paused_destination_refused() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);
        governance_action(
            &mut chain,
            &admin,
            addresses::APPCHAIN_MANAGER,
            "FreezeAppchain",
            vec![Arg::string("chainB"), Arg::string("")],
        );

        let res = send(&mut chain, 1);
        assert!(res.result_str().contains("target service not available"), "{}", res.result_str());
    }

    #[test]
    fn test_blocklisted_source_refused() {
        let mut chain = two_chain_relay().unwrap();
        governance_action(
            &mut chain,
            &chain_admin(2),
            addresses::SERVICE_MANAGER,
            "UpdateService",
            vec![
                Arg::string("chainB:svcB"),
                Arg::string("chainB-svcB"),
                Arg::string("fixture service"),
                Arg::string(src()),
                Arg::string("{}"),
                Arg::string("block chainA"),
            ],
        );

        let res = send(&mut chain, 1);
        assert!(res.result_str().starts_with("[3]"), "{}", res.result_str());
    }

    #[test]
    fn test_unregistered_local_source_refused() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.handle_ibtp(
            &account(0),
            &ibtp(&full_id("chainA", "ghost"), &dst(), 1, IbtpType::Interchain),
        );
        assert!(res.result_str().starts_with("[1]"), "{}", res.result_str());
    }

    #[test]
    fn test_malformed_ids_refused() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.handle_ibtp(&account(0), &ibtp("svcA", &dst(), 1, IbtpType::Interchain));
        assert!(res.result_str().contains("parse source chain service id"));

        let res = chain.handle_ibtp(&account(0), &ibtp(&src(), "1356::svcB", 1, IbtpType::Interchain));
        assert!(res.result_str().contains("invalid target service"));
    }

    // =============================================================================
    // WINDOWS AND ENTRY POINTS
    // =============================================================================

    #[test]
    fn test_recent_window_is_bounded() {
        let mut chain = two_chain_relay().unwrap();
        for index in 1..=7 {
            assert!(send(&mut chain, index).ok);
        }

        let raw = chain
            .state(addresses::INTERCHAIN, &format!("index-send-interchain-{}", src()))
            .unwrap();
        let window: Vec<InterchainMeta> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(window.len(), chain.config().interchain_meta_window);
        assert!(window.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(window.iter().all(|m| m.target_chain == dst()));

        let raw = chain
            .state(addresses::INTERCHAIN, &format!("index-receipt-interchain-{}", dst()))
            .unwrap();
        let window: Vec<InterchainMeta> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].target_chain, src());
    }

    #[test]
    fn test_encoded_entry_point_matches_fast_path() {
        let mut chain = two_chain_relay().unwrap();
        let data = serde_json::to_vec(&ibtp(&src(), &dst(), 1, IbtpType::Interchain)).unwrap();

        let res = chain.call(&account(0), addresses::INTERCHAIN, "HandleIBTPData", vec![Arg::bytes(data)]);
        assert_eq!(res.result_str(), format!("{}-{}-1", src(), dst()));
        assert!(send(&mut chain, 2).ok);

        let res = chain.call(
            &account(0),
            addresses::INTERCHAIN,
            "HandleIBTPData",
            vec![Arg::bytes(b"not json".to_vec())],
        );
        assert!(res.result_str().starts_with("[4]"));
    }

    #[test]
    fn test_parse_chain_service() {
        let mut chain = two_chain_relay().unwrap();
        let local: ChainService = chain
            .query(addresses::INTERCHAIN, "ParseChainService", vec![Arg::string("chainA:svcA")])
            .unwrap();
        assert!(local.is_local);
        assert_eq!(local.full_service_id(), src());

        let remote: ChainService = chain
            .query(addresses::INTERCHAIN, "ParseChainService", vec![Arg::string("1357:chainR:svcR")])
            .unwrap();
        assert!(!remote.is_local);
        assert_eq!(remote.chain_service_id(), "chainR:svcR");
    }

    #[test]
    fn test_interchain_register_only_from_service_manager() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.call(&chain_admin(1), addresses::INTERCHAIN, "Register", vec![Arg::string("chainA:fake")]);
        assert!(res.result_str().starts_with("[3]"));
    }
}
