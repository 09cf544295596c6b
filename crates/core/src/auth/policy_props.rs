//! Property-based tests for policy evaluation.

use proptest::prelude::*;
use starledger_shared::types::UserId;

use super::policy::{AuthScheme, Policy, Principal, evaluate};
use super::roles::{ADMIN_ROLE, DEVELOPER_ROLE, ORGANIZATION_CLAIM, OWNER_ROLE};

fn scheme() -> impl Strategy<Value = AuthScheme> {
    prop_oneof![Just(AuthScheme::Bearer), Just(AuthScheme::Cookie)]
}

fn policy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::OrganizationAdmin),
        Just(Policy::OrganizationOwner),
        Just(Policy::Developer),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A policy passes exactly when its row's claim and role are both present.
    #[test]
    fn test_evaluate_matches_table(
        scheme in scheme(),
        policy in policy(),
        owner in any::<bool>(),
        admin in any::<bool>(),
        developer in any::<bool>(),
        claim in any::<bool>(),
    ) {
        let mut principal = Principal::new(UserId::new(), scheme);
        if owner { principal = principal.with_role(OWNER_ROLE); }
        if admin { principal = principal.with_role(ADMIN_ROLE); }
        if developer { principal = principal.with_role(DEVELOPER_ROLE); }
        if claim { principal = principal.with_claim(ORGANIZATION_CLAIM, "org"); }

        let expected = match policy {
            Policy::OrganizationAdmin => claim && admin,
            Policy::OrganizationOwner => claim && owner,
            Policy::Developer => developer,
        };
        prop_assert_eq!(evaluate(policy, &principal).is_ok(), expected);
    }
}
