//! # Dapp Flows
//!
//! Registration, updates, ownership transfer and evaluation of dapps.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bolt_contracts::addresses;
    use bolt_contracts::domain::proposal::ProposalStatus;
    use bolt_contracts::domain::Dapp;
    use bolt_contracts::governance::GovernanceStatus;
    use bolt_contracts::testing::{account, TestChain};
    use bolt_vm::domain::entities::Response;
    use bolt_vm::domain::value_objects::Arg;

    const CONTRACT: &str = "0x00000000000000000000000000000000000000c1";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn owner() -> String {
        account(500)
    }

    fn dapp_args(name: &str, typ: &str, url: &str, contracts: &str) -> Vec<Arg> {
        vec![
            Arg::string(name),
            Arg::string(typ),
            Arg::string("a dapp on the relay"),
            Arg::string(url),
            Arg::string(contracts),
            Arg::string(""),
            Arg::string("launch"),
        ]
    }

    fn register(chain: &mut TestChain, caller: &str, name: &str, contracts: &str) -> Response {
        chain.call(
            caller,
            addresses::DAPP_MANAGER,
            "RegisterDapp",
            dapp_args(name, "tool", "https://dapp.local", contracts),
        )
    }

    fn update(chain: &mut TestChain, caller: &str, dapp_id: &str, name: &str, url: &str) -> Response {
        chain.call(
            caller,
            addresses::DAPP_MANAGER,
            "UpdateDapp",
            vec![
                Arg::string(dapp_id),
                Arg::string(name),
                Arg::string("a dapp on the relay"),
                Arg::string(url),
                Arg::string(CONTRACT),
                Arg::string(""),
                Arg::string("refresh"),
            ],
        )
    }

    fn dapp(chain: &mut TestChain, dapp_id: &str) -> Dapp {
        chain
            .query(addresses::DAPP_MANAGER, "GetDapp", vec![Arg::string(dapp_id)])
            .unwrap()
    }

    /// A relay with one available dapp owned by [`owner`]; returns its id.
    fn relay_with_dapp() -> (TestChain, String) {
        let mut chain = relay();
        let result = governance_result(register(&mut chain, &owner(), "wallet", CONTRACT)).unwrap();
        approve(&mut chain, &result.proposal_id).unwrap();
        let dapp_id = String::from_utf8(result.extra).unwrap();
        (chain, dapp_id)
    }

    // =============================================================================
    // REGISTRATION
    // =============================================================================

    #[test]
    fn test_registered_dapp_is_voted_in() {
        let (mut chain, dapp_id) = relay_with_dapp();
        assert_eq!(dapp_id, format!("{}-0", owner()));

        let registered = dapp(&mut chain, &dapp_id);
        assert_eq!(registered.status, GovernanceStatus::Available);
        assert_eq!(registered.owner_addr, owner());

        let by_name: Dapp = chain
            .query(addresses::DAPP_MANAGER, "GetDappByName", vec![Arg::string("wallet")])
            .unwrap();
        assert_eq!(by_name.dapp_id, dapp_id);
        let owned: Vec<Dapp> = chain
            .query(addresses::DAPP_MANAGER, "GetDappsByOwner", vec![Arg::string(owner())])
            .unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[test]
    fn test_second_dapp_of_owner_gets_next_sequence() {
        let (mut chain, _) = relay_with_dapp();
        let other = "0x00000000000000000000000000000000000000c2";
        let result = governance_result(register(&mut chain, &owner(), "explorer", other)).unwrap();
        assert_eq!(String::from_utf8(result.extra).unwrap(), format!("{}-1", owner()));
    }

    #[test]
    fn test_name_and_contract_are_unique() {
        let (mut chain, _) = relay_with_dapp();
        let same_name = register(&mut chain, &account(501), "wallet", "");
        assert!(same_name.result_str().starts_with("[5]"));
        let same_contract = register(&mut chain, &account(501), "vault", CONTRACT);
        assert!(same_contract.result_str().starts_with("[5]"));
    }

    #[test]
    fn test_registration_fields_are_checked() {
        let mut chain = relay();
        let no_url = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "RegisterDapp",
            dapp_args("wallet", "tool", " ", CONTRACT),
        );
        assert!(no_url.result_str().starts_with("[4]"));
        let bad_type = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "RegisterDapp",
            dapp_args("wallet", "casino", "https://dapp.local", CONTRACT),
        );
        assert!(bad_type.result_str().starts_with("[4]"));
        let bad_contract = register(&mut chain, &owner(), "wallet", "not-an-address");
        assert!(bad_contract.result_str().starts_with("[4]"));
    }

    #[test]
    fn test_rejected_registration_releases_name() {
        let mut chain = relay();
        let result = governance_result(register(&mut chain, &owner(), "wallet", CONTRACT)).unwrap();
        let proposal = chain.vote_all(&result.proposal_id, "reject").unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);

        let retry = register(&mut chain, &account(501), "wallet", CONTRACT);
        assert!(retry.ok, "{}", retry.result_str());
    }

    // =============================================================================
    // UPDATES
    // =============================================================================

    #[test]
    fn test_url_update_applies_directly() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let res = update(&mut chain, &owner(), &dapp_id, "wallet", "https://wallet.local");
        assert_eq!(governance_result(res).unwrap().proposal_id, "");
        assert_eq!(dapp(&mut chain, &dapp_id).url, "https://wallet.local");
    }

    #[test]
    fn test_rename_goes_through_vote() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let res = update(&mut chain, &owner(), &dapp_id, "wallet-pro", "https://dapp.local");
        let proposal_id = governance_result(res).unwrap().proposal_id;
        assert_eq!(dapp(&mut chain, &dapp_id).status, GovernanceStatus::Updating);

        approve(&mut chain, &proposal_id).unwrap();
        let renamed = dapp(&mut chain, &dapp_id);
        assert_eq!(renamed.name, "wallet-pro");
        assert_eq!(renamed.status, GovernanceStatus::Available);

        let reuse = register(&mut chain, &account(501), "wallet", "");
        assert!(reuse.ok, "{}", reuse.result_str());
    }

    #[test]
    fn test_only_owner_updates() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let res = update(&mut chain, &account(501), &dapp_id, "wallet", "https://wallet.local");
        assert!(res.result_str().starts_with("[3]"));
    }

    // =============================================================================
    // LIFECYCLE AND TRANSFER
    // =============================================================================

    #[test]
    fn test_freeze_requires_governance_admin() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let by_owner = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "FreezeDapp",
            vec![Arg::string(&dapp_id), Arg::string("abuse")],
        );
        assert!(by_owner.result_str().starts_with("[3]"));

        let admin = chain.admin(0);
        let res = chain.call(
            &admin,
            addresses::DAPP_MANAGER,
            "FreezeDapp",
            vec![Arg::string(&dapp_id), Arg::string("abuse")],
        );
        let proposal_id = governance_result(res).unwrap().proposal_id;
        approve(&mut chain, &proposal_id).unwrap();
        assert_eq!(dapp(&mut chain, &dapp_id).status, GovernanceStatus::Frozen);
        assert!(!query_bool(
            &mut chain,
            addresses::DAPP_MANAGER,
            "IsAvailable",
            vec![Arg::string(&dapp_id)]
        ));

        let res = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "ActivateDapp",
            vec![Arg::string(&dapp_id), Arg::string("fixed")],
        );
        let proposal_id = governance_result(res).unwrap().proposal_id;
        approve(&mut chain, &proposal_id).unwrap();
        assert_eq!(dapp(&mut chain, &dapp_id).status, GovernanceStatus::Available);
    }

    #[test]
    fn test_transfer_moves_ownership() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let new_owner = account(501);
        let res = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "TransferDapp",
            vec![Arg::string(&dapp_id), Arg::string(&new_owner), Arg::string("sold")],
        );
        let proposal_id = governance_result(res).unwrap().proposal_id;
        assert_eq!(dapp(&mut chain, &dapp_id).status, GovernanceStatus::Transferring);

        approve(&mut chain, &proposal_id).unwrap();
        let moved = dapp(&mut chain, &dapp_id);
        assert_eq!(moved.owner_addr, new_owner);
        assert_eq!(moved.transfer_records.len(), 1);
        assert!(!moved.transfer_records[0].confirm);

        let stale = chain.call(&owner(), addresses::DAPP_MANAGER, "ConfirmTransfer", vec![Arg::string(&dapp_id)]);
        assert!(stale.result_str().starts_with("[3]"));
        let confirm = chain.call(&new_owner, addresses::DAPP_MANAGER, "ConfirmTransfer", vec![Arg::string(&dapp_id)]);
        assert!(confirm.ok, "{}", confirm.result_str());
        assert!(dapp(&mut chain, &dapp_id).transfer_records[0].confirm);

        let previous: Vec<Dapp> = chain
            .query(addresses::DAPP_MANAGER, "GetDappsByOwner", vec![Arg::string(owner())])
            .unwrap();
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].owner_addr, new_owner);
    }

    #[test]
    fn test_transfer_to_self_refused() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let res = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "TransferDapp",
            vec![Arg::string(&dapp_id), Arg::string(owner()), Arg::string("loop")],
        );
        assert!(res.result_str().starts_with("[4]"));
    }

    // =============================================================================
    // EVALUATION AND PERMISSIONS
    // =============================================================================

    #[test]
    fn test_evaluation_keeps_mean() {
        let (mut chain, dapp_id) = relay_with_dapp();
        for (seed, score) in [(600, 5.0), (601, 3.0), (602, 1.0)] {
            let res = chain.call(
                &account(seed),
                addresses::DAPP_MANAGER,
                "EvaluateDapp",
                vec![Arg::string(&dapp_id), Arg::string("ok"), Arg::f64(score)],
            );
            assert!(res.ok, "{}", res.result_str());
        }
        let rated = dapp(&mut chain, &dapp_id);
        assert!((rated.score - 3.0).abs() < 1e-9);
        assert_eq!(rated.evaluation_records.len(), 3);
    }

    #[test]
    fn test_blocklisted_account_does_not_see_dapp() {
        let (mut chain, dapp_id) = relay_with_dapp();
        let blocked = account(502);
        let res = chain.call(
            &owner(),
            addresses::DAPP_MANAGER,
            "UpdateDapp",
            vec![
                Arg::string(&dapp_id),
                Arg::string("wallet"),
                Arg::string("a dapp on the relay"),
                Arg::string("https://dapp.local"),
                Arg::string(CONTRACT),
                Arg::string(&blocked),
                Arg::string("block"),
            ],
        );
        assert_eq!(governance_result(res).unwrap().proposal_id, "");

        let visible: Vec<Dapp> = chain
            .query(
                addresses::DAPP_MANAGER,
                "GetPermissionAvailableDapps",
                vec![Arg::string(&blocked)],
            )
            .unwrap();
        assert!(visible.is_empty());
        let visible: Vec<Dapp> = chain
            .query(
                addresses::DAPP_MANAGER,
                "GetPermissionAvailableDapps",
                vec![Arg::string(account(503))],
            )
            .unwrap();
        assert_eq!(visible.len(), 1);
    }
}
