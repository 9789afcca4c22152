//! # Governance Flows
//!
//! Proposal lifecycle through the governance contract: voting thresholds,
//! withdrawal, zero-permission strategies and priority locking between
//! proposals on the same object.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bolt_contracts::addresses;
    use bolt_contracts::domain::proposal::{Proposal, ProposalStatus, ProposalStrategy, ProposalType};
    use bolt_contracts::governance::{EventType, GovernanceStatus};
    use bolt_contracts::testing::{account, TestChain};
    use bolt_contracts::GovernanceConfig;
    use bolt_vm::domain::entities::EventType as LogEventType;
    use bolt_vm::domain::value_objects::Arg;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn vote(chain: &mut TestChain, voter: &str, id: &str, ballot: &str) -> bolt_vm::domain::entities::Response {
        chain.call(
            voter,
            addresses::GOVERNANCE,
            "Vote",
            vec![Arg::string(id), Arg::string(ballot), Arg::string("reviewed")],
        )
    }

    fn proposals(chain: &mut TestChain, method: &str, arg: &str) -> Vec<Proposal> {
        chain
            .query(addresses::GOVERNANCE, method, vec![Arg::string(arg)])
            .unwrap()
    }

    /// Open a name update on `chainA:svcA`, a low priority proposal.
    fn open_service_rename(chain: &mut TestChain) -> String {
        let res = chain.call(
            &chain_admin(1),
            addresses::SERVICE_MANAGER,
            "UpdateService",
            vec![
                Arg::string("chainA:svcA"),
                Arg::string("svcA-renamed"),
                Arg::string("fixture service"),
                Arg::string(""),
                Arg::string("{}"),
                Arg::string("rename"),
            ],
        );
        governance_result(res).unwrap().proposal_id
    }

    fn open_service_freeze(chain: &mut TestChain) -> String {
        let admin = chain.admin(0);
        let res = chain.call(
            &admin,
            addresses::SERVICE_MANAGER,
            "FreezeService",
            vec![Arg::string("chainA:svcA"), Arg::string("misbehaving")],
        );
        governance_result(res).unwrap().proposal_id
    }

    // =============================================================================
    // VOTING
    // =============================================================================

    #[test]
    fn test_proposal_snapshots_electorate_and_threshold() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let proposal = chain.proposal(&id).unwrap();
        assert_eq!(id, format!("{}-0", chain_admin(1)));
        assert_eq!(proposal.status, ProposalStatus::Proposed);
        assert_eq!(proposal.typ, ProposalType::AppchainMgr);
        assert_eq!(proposal.event_type, EventType::Register);
        assert_eq!(proposal.obj_last_status, Some(GovernanceStatus::Unavailable));
        assert_eq!(proposal.electorate.len(), 3);
        assert_eq!(proposal.threshold, 3);
        assert!(!proposal.is_special);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Registering);
    }

    #[test]
    fn test_proposal_stays_open_below_threshold() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        for i in 0..2 {
            let admin = chain.admin(i);
            assert!(vote(&mut chain, &admin, &id, "approve").ok);
        }
        let proposal = chain.proposal(&id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Proposed);
        assert_eq!(proposal.approve, 2);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Registering);

        let admin = chain.admin(2);
        assert!(vote(&mut chain, &admin, &id, "approve").ok);
        assert_eq!(chain.proposal(&id).unwrap().status, ProposalStatus::Approved);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
    }

    #[test]
    fn test_majority_decides_outcome() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        for (i, ballot) in ["approve", "reject", "approve"].into_iter().enumerate() {
            let admin = chain.admin(i);
            assert!(vote(&mut chain, &admin, &id, ballot).ok);
        }
        let proposal = chain.proposal(&id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Approved);
        assert_eq!((proposal.approve, proposal.against), (2, 1));
        assert_eq!(proposal.close_reason, "vote finished");
    }

    #[test]
    fn test_rejected_registration_restores_status_and_releases_name() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let proposal = chain.vote_all(&id, "reject").unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Unavailable);

        // name and admin account are free again
        let retry = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        assert_eq!(retry, format!("{}-1", chain_admin(1)));
    }

    #[test]
    fn test_vote_requires_governance_admin() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let res = vote(&mut chain, &account(500), &id, "approve");
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[3]"), "{}", res.result_str());
        // appchain admins do not vote either
        let res = vote(&mut chain, &chain_admin(1), &id, "approve");
        assert!(!res.ok);
        assert!(chain.proposal(&id).unwrap().ballots.is_empty());
    }

    #[test]
    fn test_double_vote_and_illegal_ballot_rejected() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let admin = chain.admin(0);

        assert!(vote(&mut chain, &admin, &id, "approve").ok);
        let again = vote(&mut chain, &admin, &id, "reject");
        assert!(!again.ok);
        assert!(again.result_str().contains("already voted"));

        let other = chain.admin(1);
        let res = vote(&mut chain, &other, &id, "maybe");
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[4]"));

        let proposal = chain.proposal(&id).unwrap();
        assert_eq!((proposal.approve, proposal.against), (1, 0));
    }

    #[test]
    fn test_closed_proposal_rejects_votes() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        approve(&mut chain, &id).unwrap();

        let admin = chain.admin(0);
        let res = vote(&mut chain, &admin, &id, "approve");
        assert!(!res.ok);
        assert!(res.result_str().contains("can not be voted on"));
    }

    // =============================================================================
    // WITHDRAWAL
    // =============================================================================

    #[test]
    fn test_submitter_withdraws_open_proposal() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let res = chain.call(
            &chain_admin(1),
            addresses::GOVERNANCE,
            "WithdrawProposal",
            vec![Arg::string(&id), Arg::string("wrong broker")],
        );
        assert!(res.ok, "{}", res.result_str());

        let proposal = chain.proposal(&id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        assert_eq!(proposal.close_reason, "withdrawn: wrong broker");
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Unavailable);
    }

    #[test]
    fn test_only_submitter_withdraws() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let admin = chain.admin(0);

        let res = chain.call(
            &admin,
            addresses::GOVERNANCE,
            "WithdrawProposal",
            vec![Arg::string(&id), Arg::string("")],
        );
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[3]"));
        assert!(chain.proposal(&id).unwrap().is_open());
    }

    // =============================================================================
    // STRATEGIES
    // =============================================================================

    #[test]
    fn test_zero_permission_type_skips_vote() {
        let config = GovernanceConfig {
            zero_permission_types: vec![ProposalType::AppchainMgr],
            ..GovernanceConfig::default()
        }
        .with_super_admins((1..=3).map(account));
        let mut chain = TestChain::new(config).unwrap();

        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let proposal = chain.proposal(&id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Approved);
        assert_eq!(proposal.strategy, ProposalStrategy::ZeroPermission);
        assert_eq!(proposal.close_reason, "zero permission");
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);

        let strategy: ProposalStrategy = chain
            .query(addresses::GOVERNANCE, "GetProposalStrategy", vec![Arg::string("AppchainMgr")])
            .unwrap();
        assert_eq!(strategy, ProposalStrategy::ZeroPermission);
    }

    #[test]
    fn test_manage_only_callable_by_governance() {
        let mut chain = relay();
        register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let admin = chain.admin(0);

        let res = chain.call(
            &admin,
            addresses::APPCHAIN_MANAGER,
            "Manage",
            vec![
                Arg::string("register"),
                Arg::string("approved"),
                Arg::string("unavailable"),
                Arg::string("chainA"),
                Arg::bytes(Vec::new()),
            ],
        );
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[3]"));
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Registering);
    }

    #[test]
    fn test_submit_proposal_only_from_managers() {
        let mut chain = relay();
        let admin = chain.admin(0);
        let res = chain.call(
            &admin,
            addresses::GOVERNANCE,
            "SubmitProposal",
            vec![
                Arg::string(&admin),
                Arg::string("register"),
                Arg::string("AppchainMgr"),
                Arg::string("chainX"),
                Arg::string("unavailable"),
                Arg::string(""),
                Arg::bytes(Vec::new()),
            ],
        );
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[3]"));
    }

    // =============================================================================
    // PRIORITY LOCKING
    // =============================================================================

    #[test]
    fn test_higher_priority_proposal_pauses_open_one() {
        let mut chain = two_chain_relay().unwrap();
        let rename = open_service_rename(&mut chain);
        assert_eq!(service(&mut chain, "chainA:svcA").unwrap().status, GovernanceStatus::Updating);

        let freeze = open_service_freeze(&mut chain);
        assert_eq!(chain.proposal(&rename).unwrap().status, ProposalStatus::Paused);
        assert_eq!(chain.proposal(&freeze).unwrap().lock_proposal_id, rename);
        assert_eq!(service(&mut chain, "chainA:svcA").unwrap().status, GovernanceStatus::Freezing);

        // a paused proposal takes no votes
        let admin = chain.admin(0);
        assert!(!vote(&mut chain, &admin, &rename, "approve").ok);
    }

    #[test]
    fn test_lower_priority_proposal_refused_while_higher_open() {
        let mut chain = two_chain_relay().unwrap();
        open_service_freeze(&mut chain);

        let res = chain.call(
            &chain_admin(1),
            addresses::SERVICE_MANAGER,
            "UpdateService",
            vec![
                Arg::string("chainA:svcA"),
                Arg::string("svcA-renamed"),
                Arg::string("fixture service"),
                Arg::string(""),
                Arg::string("{}"),
                Arg::string("rename"),
            ],
        );
        assert!(!res.ok);
    }

    #[test]
    fn test_approved_higher_priority_rejects_paused() {
        let mut chain = two_chain_relay().unwrap();
        let rename = open_service_rename(&mut chain);
        let freeze = open_service_freeze(&mut chain);

        approve(&mut chain, &freeze).unwrap();
        let paused = chain.proposal(&rename).unwrap();
        assert_eq!(paused.status, ProposalStatus::Rejected);
        assert!(paused.close_reason.starts_with("priority"));
        assert_eq!(service(&mut chain, "chainA:svcA").unwrap().status, GovernanceStatus::Frozen);
    }

    #[test]
    fn test_paused_rename_dropped_for_priority_frees_new_name() {
        let mut chain = two_chain_relay().unwrap();
        let rename = open_service_rename(&mut chain);
        let freeze = open_service_freeze(&mut chain);
        approve(&mut chain, &freeze).unwrap();
        assert_eq!(chain.proposal(&rename).unwrap().status, ProposalStatus::Rejected);

        let svc = service(&mut chain, "chainA:svcA").unwrap();
        assert_eq!(svc.name, "chainA-svcA");
        assert_eq!(svc.status, GovernanceStatus::Frozen);

        let res = register_named_service(&mut chain, &chain_admin(2), "chainB", "svcX", "svcA-renamed");
        assert!(res.ok, "{}", res.result_str());
        let taken = register_named_service(&mut chain, &chain_admin(1), "chainA", "svcY", "chainA-svcA");
        assert!(taken.result_str().starts_with("[5]"), "{}", taken.result_str());
    }

    #[test]
    fn test_rejected_higher_priority_reopens_paused() {
        let mut chain = two_chain_relay().unwrap();
        let rename = open_service_rename(&mut chain);
        let freeze = open_service_freeze(&mut chain);

        let closed = chain.vote_all(&freeze, "reject").unwrap();
        assert_eq!(closed.status, ProposalStatus::Rejected);
        assert_eq!(chain.proposal(&rename).unwrap().status, ProposalStatus::Proposed);
        assert_eq!(service(&mut chain, "chainA:svcA").unwrap().status, GovernanceStatus::Updating);

        approve(&mut chain, &rename).unwrap();
        let svc = service(&mut chain, "chainA:svcA").unwrap();
        assert_eq!(svc.name, "svcA-renamed");
        assert_eq!(svc.status, GovernanceStatus::Available);
    }

    // =============================================================================
    // QUERIES AND AUDIT
    // =============================================================================

    #[test]
    fn test_proposal_queries() {
        let mut chain = relay();
        let first = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        approve(&mut chain, &first).unwrap();
        let second = register_appchain(&mut chain, "chainB", &chain_admin(2)).unwrap();

        let open: Vec<Proposal> = chain.query(addresses::GOVERNANCE, "GetNotClosedProposals", vec![]).unwrap();
        assert_eq!(open.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), [second.as_str()]);

        let by_type = proposals(&mut chain, "GetProposalsByTyp", "AppchainMgr");
        assert_eq!(by_type.len(), 2);
        assert_eq!(by_type[0].id, second, "newest first");

        let approved = proposals(&mut chain, "GetProposalsByStatus", "approved");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first);

        assert_eq!(proposals(&mut chain, "GetProposalsByObjId", "chainA").len(), 1);
        assert_eq!(proposals(&mut chain, "GetProposalsByFrom", &chain_admin(2))[0].id, second);

        let missing = chain.call(&account(0), addresses::GOVERNANCE, "GetProposal", vec![Arg::string("nope-0")]);
        assert!(missing.result_str().starts_with("[1]"));
    }

    #[test]
    fn test_every_proposal_change_is_audited() {
        let mut chain = relay();
        let id = register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let opened = chain.events_of(LogEventType::AuditProposal).len();
        assert!(opened >= 1);

        approve(&mut chain, &id).unwrap();
        // one per ballot below threshold, one for the close
        assert_eq!(chain.events_of(LogEventType::AuditProposal).len(), opened + 3);
        assert!(!chain.events_of(LogEventType::AuditAppchain).is_empty());
    }

    #[test]
    fn test_unknown_method_reports_missing() {
        let mut chain = relay();
        let res = chain.call(&account(0), addresses::GOVERNANCE, "Nope", vec![]);
        assert!(!res.ok);
    }
}
