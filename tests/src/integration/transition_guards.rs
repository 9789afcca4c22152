//! # Transition Guards
//!
//! An event that the resource's transition table refuses fails with
//! `IllegalTransition` before anything is written. Each case runs the call
//! through the recording harness and checks the write log of that single
//! transaction, which is taken before the harness rolls a failure back.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bolt_contracts::addresses;
    use bolt_contracts::domain::{Dapp, Node, Role};
    use bolt_contracts::governance::GovernanceStatus;
    use bolt_contracts::testing::account;
    use bolt_vm::adapters::StateWrite;
    use bolt_vm::domain::entities::Response;
    use bolt_vm::domain::value_objects::Arg;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn assert_refused_without_writes((res, writes): (Response, Vec<StateWrite>)) {
        assert!(res.result_str().starts_with("[2]"), "{}", res.result_str());
        assert!(writes.is_empty(), "unexpected writes: {writes:?}");
    }

    fn event_args(id: &str) -> Vec<Arg> {
        vec![Arg::string(id), Arg::string("out of order")]
    }

    // =============================================================================
    // PER RESOURCE KIND
    // =============================================================================

    #[test]
    fn test_freeze_of_registering_service_writes_nothing() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        register_service(&mut chain, &chain_admin(1), "chainA", "svcA", true).unwrap();

        let admin = chain.admin(0);
        assert_refused_without_writes(chain.call_recorded(
            &admin,
            addresses::SERVICE_MANAGER,
            "FreezeService",
            event_args("chainA:svcA"),
        ));
        let svc = service(&mut chain, "chainA:svcA").unwrap();
        assert_eq!(svc.status, GovernanceStatus::Registering);
    }

    #[test]
    fn test_activate_of_available_appchain_writes_nothing() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        assert_refused_without_writes(chain.call_recorded(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "ActivateAppchain",
            event_args("chainA"),
        ));
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
    }

    #[test]
    fn test_activate_of_available_role_writes_nothing() {
        let mut chain = relay();
        let admin = chain.admin(0);
        let member = account(300);
        let res = chain.call(
            &admin,
            addresses::ROLE_MANAGER,
            "RegisterRole",
            vec![
                Arg::string(&member),
                Arg::string("governanceAdmin"),
                Arg::string(""),
                Arg::string("new member"),
            ],
        );
        approve(&mut chain, &governance_result(res).unwrap().proposal_id).unwrap();

        assert_refused_without_writes(chain.call_recorded(
            &admin,
            addresses::ROLE_MANAGER,
            "ActivateRole",
            event_args(&member),
        ));
        let role: Role = chain
            .query(addresses::ROLE_MANAGER, "GetRole", vec![Arg::string(&member)])
            .unwrap();
        assert_eq!(role.status, GovernanceStatus::Available);
    }

    #[test]
    fn test_logout_of_registering_node_writes_nothing() {
        let mut chain = relay();
        let admin = chain.admin(0);
        let vp = account(410);
        let res = chain.call(
            &admin,
            addresses::NODE_MANAGER,
            "RegisterNode",
            vec![
                Arg::string(&vp),
                Arg::string("vpNode"),
                Arg::string("QmPeer5"),
                Arg::u64(5),
                Arg::string("vp-5"),
                Arg::string("chainA"),
                Arg::string("join"),
            ],
        );
        assert!(res.ok, "{}", res.result_str());

        assert_refused_without_writes(chain.call_recorded(
            &admin,
            addresses::NODE_MANAGER,
            "LogoutNode",
            event_args(&vp),
        ));
        let node: Node = chain
            .query(addresses::NODE_MANAGER, "GetNode", vec![Arg::string(&vp)])
            .unwrap();
        assert_eq!(node.status, GovernanceStatus::Registering);
    }

    #[test]
    fn test_logout_of_bound_rule_writes_nothing() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        assert_refused_without_writes(chain.call_recorded(
            &chain_admin(1),
            addresses::RULE_MANAGER,
            "LogoutRule",
            vec![Arg::string("chainA"), Arg::string(MASTER_RULE)],
        ));
        let master = chain.call(
            &account(0),
            addresses::RULE_MANAGER,
            "IsAvailableRule",
            vec![Arg::string("chainA"), Arg::string(MASTER_RULE)],
        );
        assert_eq!(master.result_str(), "true");
    }

    #[test]
    fn test_activate_of_available_dapp_writes_nothing() {
        let mut chain = relay();
        let owner = account(500);
        let res = chain.call(
            &owner,
            addresses::DAPP_MANAGER,
            "RegisterDapp",
            vec![
                Arg::string("wallet"),
                Arg::string("tool"),
                Arg::string("a dapp on the relay"),
                Arg::string("https://dapp.local"),
                Arg::string(""),
                Arg::string(""),
                Arg::string("launch"),
            ],
        );
        let result = governance_result(res).unwrap();
        approve(&mut chain, &result.proposal_id).unwrap();
        let dapp_id = String::from_utf8(result.extra).unwrap();

        assert_refused_without_writes(chain.call_recorded(
            &owner,
            addresses::DAPP_MANAGER,
            "ActivateDapp",
            event_args(&dapp_id),
        ));
        let dapp: Dapp = chain
            .query(addresses::DAPP_MANAGER, "GetDapp", vec![Arg::string(&dapp_id)])
            .unwrap();
        assert_eq!(dapp.status, GovernanceStatus::Available);
    }

    #[test]
    fn test_second_event_on_busy_service_writes_nothing() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);
        let res = chain.call(&admin, addresses::SERVICE_MANAGER, "FreezeService", event_args("chainA:svcA"));
        assert!(res.ok, "{}", res.result_str());

        assert_refused_without_writes(chain.call_recorded(
            &admin,
            addresses::SERVICE_MANAGER,
            "FreezeService",
            event_args("chainA:svcA"),
        ));
        assert_eq!(service(&mut chain, "chainA:svcA").unwrap().status, GovernanceStatus::Freezing);
    }
}
