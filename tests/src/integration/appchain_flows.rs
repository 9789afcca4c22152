//! # Appchain Flows
//!
//! Appchain registration, updates and lifecycle, including the fan-out to
//! the role manager (admins), the rule manager (master rule) and the
//! service manager (pausing and clearing services).

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bolt_contracts::addresses;
    use bolt_contracts::domain::proposal::ProposalStatus;
    use bolt_contracts::domain::{Appchain, Role, Rule};
    use bolt_contracts::governance::GovernanceStatus;
    use bolt_contracts::testing::{account, TestChain};
    use bolt_vm::domain::value_objects::Arg;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const SECOND_RULE: &str = "0x00000000000000000000000000000000000000e2";

    fn chain_event(chain: &mut TestChain, caller: &str, method: &str, chain_id: &str) -> String {
        let res = chain.call(
            caller,
            addresses::APPCHAIN_MANAGER,
            method,
            vec![Arg::string(chain_id), Arg::string("governance action")],
        );
        governance_result(res).unwrap().proposal_id
    }

    fn update_args(chain_id: &str, name: &str, desc: &str, admins: &str) -> Vec<Arg> {
        vec![
            Arg::string(chain_id),
            Arg::string(name),
            Arg::string(desc),
            Arg::bytes(format!("validators of {chain_id}").into_bytes()),
            Arg::string(admins),
            Arg::string("update"),
        ]
    }

    fn admins_of(chain: &mut TestChain, chain_id: &str) -> Vec<String> {
        let roles: Vec<Role> = chain
            .query(addresses::ROLE_MANAGER, "GetAppchainAdmins", vec![Arg::string(chain_id)])
            .unwrap();
        roles.into_iter().map(|r| r.id).collect()
    }

    fn service_status(chain: &mut TestChain, id: &str) -> GovernanceStatus {
        service(chain, id).unwrap().status
    }

    // =============================================================================
    // REGISTRATION
    // =============================================================================

    #[test]
    fn test_approved_registration_installs_admins_and_master_rule() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let appchain = appchain(&mut chain, "chainA").unwrap();
        assert_eq!(appchain.status, GovernanceStatus::Available);
        assert_eq!(appchain.broker, "broker-chainA");

        assert!(query_bool(
            &mut chain,
            addresses::ROLE_MANAGER,
            "IsAppchainAdmin",
            vec![Arg::string(chain_admin(1)), Arg::string("chainA")],
        ));
        assert_eq!(admins_of(&mut chain, "chainA"), [chain_admin(1)]);

        let rule: Rule = chain
            .query(addresses::RULE_MANAGER, "GetMasterRule", vec![Arg::string("chainA")])
            .unwrap();
        assert_eq!(rule.address, MASTER_RULE);
        assert!(rule.master);
        assert_eq!(rule.status, GovernanceStatus::Available);

        let by_name: Appchain = chain
            .query(addresses::APPCHAIN_MANAGER, "GetAppchainByName", vec![Arg::string("chainA-name")])
            .unwrap();
        assert_eq!(by_name.id, "chainA");
    }

    #[test]
    fn test_sender_must_be_listed_admin() {
        let mut chain = relay();
        let mut args = appchain_args("chainA", &chain_admin(1));
        args[8] = Arg::string(chain_admin(2));

        let res = chain.call(&chain_admin(1), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args);
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[3]"));
        assert!(appchain(&mut chain, "chainA").is_err());
    }

    #[test]
    fn test_duplicate_chain_name_refused() {
        let mut chain = relay();
        register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let mut args = appchain_args("chainB", &chain_admin(2));
        args[1] = Arg::string("chainA-name");
        let res = chain.call(&chain_admin(2), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args);
        assert!(!res.ok);
        assert!(res.result_str().starts_with("[5]"), "{}", res.result_str());
    }

    #[test]
    fn test_admin_account_serves_one_role() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        // already admin of chainA
        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "RegisterAppchain",
            appchain_args("chainB", &chain_admin(1)),
        );
        assert!(!res.ok);

        // genesis admins are occupied as well
        let admin = chain.admin(0);
        let res = chain.call(&admin, addresses::APPCHAIN_MANAGER, "RegisterAppchain", appchain_args("chainB", &admin));
        assert!(!res.ok);
    }

    #[test]
    fn test_registration_needs_master_rule_and_broker() {
        let mut chain = relay();
        let mut args = appchain_args("chainA", &chain_admin(1));
        args[6] = Arg::string("");
        let res = chain.call(&chain_admin(1), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args);
        assert!(res.result_str().starts_with("[4]"));

        let mut args = appchain_args("chainA", &chain_admin(1));
        args[4] = Arg::string("");
        let res = chain.call(&chain_admin(1), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args);
        assert!(res.result_str().starts_with("[4]"));
    }

    #[test]
    fn test_second_registration_while_open_refused() {
        let mut chain = relay();
        register_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let mut args = appchain_args("chainA", &chain_admin(2));
        args[1] = Arg::string("other-name");
        let res = chain.call(&chain_admin(2), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args);
        assert!(res.result_str().starts_with("[2]"), "{}", res.result_str());
    }

    // =============================================================================
    // UPDATES
    // =============================================================================

    #[test]
    fn test_description_update_applies_directly() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "UpdateAppchain",
            update_args("chainA", "chainA-name", "new description", ""),
        );
        assert_eq!(governance_result(res).unwrap().proposal_id, "");

        let appchain = appchain(&mut chain, "chainA").unwrap();
        assert_eq!(appchain.desc, "new description");
        assert_eq!(appchain.status, GovernanceStatus::Available);
    }

    #[test]
    fn test_rename_goes_through_vote() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "UpdateAppchain",
            update_args("chainA", "renamed", "fixture appchain", ""),
        );
        let id = governance_result(res).unwrap().proposal_id;
        assert!(!id.is_empty());
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Updating);

        approve(&mut chain, &id).unwrap();
        let appchain = appchain(&mut chain, "chainA").unwrap();
        assert_eq!(appchain.chain_name, "renamed");
        assert_eq!(appchain.status, GovernanceStatus::Available);

        // the old name is free for others
        let mut args = appchain_args("chainB", &chain_admin(2));
        args[1] = Arg::string("chainA-name");
        assert!(chain.call(&chain_admin(2), addresses::APPCHAIN_MANAGER, "RegisterAppchain", args).ok);
    }

    #[test]
    fn test_admin_set_update_replaces_roles() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let added = account(2_001);

        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "UpdateAppchain",
            update_args("chainA", "chainA-name", "fixture appchain", &format!("{},{added}", chain_admin(1))),
        );
        let id = governance_result(res).unwrap().proposal_id;
        approve(&mut chain, &id).unwrap();

        let mut admins = admins_of(&mut chain, "chainA");
        admins.sort();
        let mut expected = vec![chain_admin(1), added.clone()];
        expected.sort();
        assert_eq!(admins, expected);
        assert!(query_bool(
            &mut chain,
            addresses::ROLE_MANAGER,
            "IsAppchainAdmin",
            vec![Arg::string(&added), Arg::string("chainA")],
        ));
    }

    #[test]
    fn test_sender_must_stay_admin() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();

        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "UpdateAppchain",
            update_args("chainA", "chainA-name", "fixture appchain", &account(2_002)),
        );
        assert!(!res.ok);
    }

    #[test]
    fn test_only_chain_admin_updates() {
        let mut chain = relay();
        setup_appchain(&mut chain, "chainA", &chain_admin(1)).unwrap();
        let admin = chain.admin(0);

        let res = chain.call(
            &admin,
            addresses::APPCHAIN_MANAGER,
            "UpdateAppchain",
            update_args("chainA", "chainA-name", "hijacked", ""),
        );
        assert!(res.result_str().starts_with("[3]"));
    }

    // =============================================================================
    // FREEZE, ACTIVATE, LOGOUT
    // =============================================================================

    #[test]
    fn test_freeze_pauses_services_and_activate_resumes() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);

        let freeze = chain_event(&mut chain, &admin, "FreezeAppchain", "chainA");
        assert!(chain.proposal(&freeze).unwrap().is_special);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Freezing);
        approve(&mut chain, &freeze).unwrap();

        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Frozen);
        assert!(!query_bool(&mut chain, addresses::APPCHAIN_MANAGER, "IsAvailable", vec![Arg::string("chainA")]));
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Paused);
        assert_eq!(service_status(&mut chain, "chainB:svcB"), GovernanceStatus::Available);

        let activate = chain_event(&mut chain, &chain_admin(1), "ActivateAppchain", "chainA");
        approve(&mut chain, &activate).unwrap();
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Available);
    }

    #[test]
    fn test_only_governance_admin_freezes() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.call(
            &chain_admin(1),
            addresses::APPCHAIN_MANAGER,
            "FreezeAppchain",
            vec![Arg::string("chainA"), Arg::string("")],
        );
        assert!(res.result_str().starts_with("[3]"));
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
    }

    #[test]
    fn test_rejected_freeze_restores_available() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);
        let freeze = chain_event(&mut chain, &admin, "FreezeAppchain", "chainA");

        let proposal = chain.vote_all(&freeze, "reject").unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Available);
    }

    #[test]
    fn test_logout_pauses_then_clears_services_and_rules() {
        let mut chain = two_chain_relay().unwrap();
        let logout = chain_event(&mut chain, &chain_admin(1), "LogoutAppchain", "chainA");
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::LoggingOut);
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Paused);

        approve(&mut chain, &logout).unwrap();
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Forbidden);
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Forbidden);
        assert!(!query_bool(&mut chain, addresses::RULE_MANAGER, "HasMasterRule", vec![Arg::string("chainA")]));
    }

    #[test]
    fn test_rejected_logout_unpauses_services() {
        let mut chain = two_chain_relay().unwrap();
        let logout = chain_event(&mut chain, &chain_admin(1), "LogoutAppchain", "chainA");

        chain.vote_all(&logout, "reject").unwrap();
        assert_eq!(appchain(&mut chain, "chainA").unwrap().status, GovernanceStatus::Available);
        assert_eq!(service_status(&mut chain, "chainA:svcA"), GovernanceStatus::Available);
    }

    #[test]
    fn test_frozen_chain_cannot_freeze_again() {
        let mut chain = two_chain_relay().unwrap();
        let admin = chain.admin(0);
        let freeze = chain_event(&mut chain, &admin, "FreezeAppchain", "chainA");
        approve(&mut chain, &freeze).unwrap();

        let res = chain.call(
            &admin,
            addresses::APPCHAIN_MANAGER,
            "FreezeAppchain",
            vec![Arg::string("chainA"), Arg::string("")],
        );
        assert!(res.result_str().starts_with("[2]"));
    }

    // =============================================================================
    // RULES
    // =============================================================================

    #[test]
    fn test_master_rule_switch() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.call(
            &chain_admin(1),
            addresses::RULE_MANAGER,
            "RegisterRule",
            vec![Arg::string("chainA"), Arg::string(SECOND_RULE), Arg::string("https://rules.bitxhub.local/v2")],
        );
        assert!(res.ok, "{}", res.result_str());
        assert!(!query_bool(
            &mut chain,
            addresses::RULE_MANAGER,
            "IsAvailableRule",
            vec![Arg::string("chainA"), Arg::string(SECOND_RULE)],
        ));

        let res = chain.call(
            &chain_admin(1),
            addresses::RULE_MANAGER,
            "UpdateMasterRule",
            vec![Arg::string("chainA"), Arg::string(SECOND_RULE), Arg::string("upgrade")],
        );
        let id = governance_result(res).unwrap().proposal_id;
        approve(&mut chain, &id).unwrap();

        let master: Rule = chain
            .query(addresses::RULE_MANAGER, "GetMasterRule", vec![Arg::string("chainA")])
            .unwrap();
        assert_eq!(master.address, SECOND_RULE);
        let rules: Vec<Rule> = chain
            .query(addresses::RULE_MANAGER, "GetRules", vec![Arg::string("chainA")])
            .unwrap();
        let old = rules.iter().find(|r| r.address == MASTER_RULE).unwrap();
        assert!(!old.master);
        assert_eq!(old.status, GovernanceStatus::Bindable);
    }

    #[test]
    fn test_master_rule_cannot_logout() {
        let mut chain = two_chain_relay().unwrap();
        let res = chain.call(
            &chain_admin(1),
            addresses::RULE_MANAGER,
            "LogoutRule",
            vec![Arg::string("chainA"), Arg::string(MASTER_RULE)],
        );
        assert!(!res.ok);
        assert!(query_bool(&mut chain, addresses::RULE_MANAGER, "HasMasterRule", vec![Arg::string("chainA")]));
    }
}
