//! Membership transitions and rollups against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use starledger_shared::types::{OrganizationId, UpdateMode, UserId};

use super::{OrganizationAggregator, OrganizationError, OrganizationService};
use crate::auth::{
    ADMIN_ROLE, AuthError, AuthScheme, ORGANIZATION_CLAIM, OWNER_ROLE, Principal, ensure_roles,
    load_principal,
};
use crate::clock::ManualClock;
use crate::history::{DateRange, PendingSnapshots};
use crate::ledger::{BalanceLedger, ResourceLedger};
use crate::records::Claim;
use crate::store::{IdentityStore, LedgerStore, MemoryStore};
use crate::testing::{seed_resource, seed_user};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

struct World {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    service: OrganizationService<MemoryStore>,
    aggregator: OrganizationAggregator<MemoryStore>,
}

impl World {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        ensure_roles(store.as_ref()).await.unwrap();
        let clock = Arc::new(ManualClock::at_day(day(1)));
        Self {
            service: OrganizationService::new(Arc::clone(&store), clock.clone()),
            aggregator: OrganizationAggregator::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    async fn principal(&self, user_id: UserId) -> Principal {
        load_principal(self.store.as_ref(), user_id, AuthScheme::Bearer)
            .await
            .unwrap()
    }

    fn balances(&self) -> BalanceLedger<MemoryStore> {
        BalanceLedger::new(
            Arc::clone(&self.store),
            self.clock.clone(),
            PendingSnapshots::new(),
        )
    }

    /// Founder with balance 100 and member with balance 250.
    async fn acme(&self) -> (OrganizationId, UserId, UserId) {
        let founder = seed_user(&self.store, "founder@example.com", 100).await;
        let member = seed_user(&self.store, "member@example.com", 250).await;
        let org = self.service.create(founder.id, "Acme").await.unwrap();
        let caller = self.principal(founder.id).await;
        self.service
            .add_member(&caller, org.organization.id, member.id)
            .await
            .unwrap();
        (org.organization.id, founder.id, member.id)
    }
}

#[tokio::test]
async fn test_create_grants_founder_everything() {
    let world = World::new().await;
    let founder = seed_user(&world.store, "f@example.com", 0).await;

    let details = world.service.create(founder.id, "Acme").await.unwrap();

    let org_id = details.organization.id;
    assert_eq!(details.members.len(), 1);
    assert!(details.members[0].is_owner && details.members[0].is_admin);
    let principal = world.principal(founder.id).await;
    assert!(principal.roles.contains(OWNER_ROLE));
    assert!(principal.roles.contains(ADMIN_ROLE));
    assert!(
        principal
            .claims
            .contains(&Claim::new(ORGANIZATION_CLAIM, org_id.to_string()))
    );
    world.store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn test_create_validates_name_and_founder() {
    let world = World::new().await;
    let founder = seed_user(&world.store, "f@example.com", 0).await;

    assert!(matches!(
        world.service.create(founder.id, "ab").await,
        Err(OrganizationError::InvalidName)
    ));
    assert!(matches!(
        world.service.create(founder.id, &"x".repeat(101)).await,
        Err(OrganizationError::InvalidName)
    ));
    assert!(matches!(
        world.service.create(UserId::new(), "Acme").await,
        Err(OrganizationError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_total_balance_sums_members() {
    let world = World::new().await;
    let (org_id, _, _) = world.acme().await;

    let total = world.aggregator.total_balance(org_id).await.unwrap();

    assert_eq!(total.balance, 350);
}

#[tokio::test]
async fn test_rollups_on_unknown_org_are_not_found() {
    let world = World::new().await;
    let missing = OrganizationId::new();

    assert!(matches!(
        world.aggregator.total_balance(missing).await,
        Err(OrganizationError::NotFound(_))
    ));
    assert!(matches!(
        world.aggregator.balance_history(missing, DateRange::all()).await,
        Err(OrganizationError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_empty_history_is_ok_and_empty() {
    let world = World::new().await;
    let (org_id, _, _) = world.acme().await;

    let history = world
        .aggregator
        .balance_history(org_id, DateRange::all())
        .await
        .unwrap();

    assert!(history.is_empty());
}

#[tokio::test]
async fn test_balance_history_sums_per_day() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let ledger = world.balances();

    ledger.apply(founder, 10, UpdateMode::Add).await.unwrap();
    ledger.apply(member, 50, UpdateMode::Subtract).await.unwrap();
    world.clock.set(day(3).and_hms_opt(8, 0, 0).unwrap().and_utc());
    ledger.apply(founder, 0, UpdateMode::Set).await.unwrap();

    let history = world
        .aggregator
        .balance_history(org_id, DateRange::all())
        .await
        .unwrap();
    let rows: Vec<_> = history.iter().map(|row| (row.day, row.balance)).collect();
    assert_eq!(rows, vec![(day(1), 110 + 200), (day(3), 0)]);

    let only_start = world
        .aggregator
        .balance_history(org_id, DateRange::new(Some(day(2)), None).unwrap())
        .await
        .unwrap();
    assert_eq!(only_start.len(), 1);
    assert_eq!(only_start[0].day, day(3));
}

#[tokio::test]
async fn test_removed_member_history_still_queryable() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let ledger = world.balances();
    ledger.apply(member, 1, UpdateMode::Add).await.unwrap();

    let caller = world.principal(founder).await;
    world
        .service
        .remove_member(&caller, org_id, member)
        .await
        .unwrap();

    assert_eq!(world.aggregator.total_balance(org_id).await.unwrap().balance, 100);
    let history = ledger.history(member, DateRange::all()).await.unwrap();
    assert_eq!(history.len(), 1);
    let member = world.store.find_user(member).await.unwrap().unwrap();
    assert_eq!(member.organization_id, None);
    world.store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn test_resource_rollups() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let iron = seed_resource(&world.store, "IRON").await;
    let gold = seed_resource(&world.store, "GOLD").await;
    let ledger = ResourceLedger::new(
        Arc::clone(&world.store),
        world.clock.clone(),
        PendingSnapshots::new(),
    );
    for (user, resource, quantity) in [
        (founder, iron.id, 1.5),
        (member, iron.id, 2.0),
        (member, gold.id, 4.0),
    ] {
        ledger.attach(user, resource).await.unwrap();
        ledger
            .apply(user, resource, quantity, UpdateMode::Set)
            .await
            .unwrap();
    }

    let totals = world.aggregator.resources(org_id).await.unwrap();
    let iron_total = totals.iter().find(|t| t.resource_id == iron.id).unwrap();
    assert!((iron_total.quantity - 3.5).abs() < f64::EPSILON);
    assert_eq!(totals.len(), 2);

    let by_user = world.aggregator.resources_by_user(org_id).await.unwrap();
    assert_eq!(by_user.len(), 3);
    assert_eq!(by_user[0].user_name, "founder@example.com");

    let history = world
        .aggregator
        .resource_history(org_id, DateRange::all())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|row| row.day == day(1)));
}

#[tokio::test]
async fn test_balance_by_user_uses_handle_when_set() {
    let world = World::new().await;
    let (org_id, founder, _) = world.acme().await;
    crate::store::UserStore::update_profile(
        world.store.as_ref(),
        founder,
        None,
        Some("Boss".to_string()),
    )
    .await
    .unwrap();

    let balances = world.aggregator.balance_by_user(org_id).await.unwrap();

    assert!(balances.iter().any(|row| row.user_name == "Boss" && row.balance == 100));
    assert!(
        balances
            .iter()
            .any(|row| row.user_name == "member@example.com" && row.balance == 250)
    );
}

#[tokio::test]
async fn test_add_member_is_idempotent() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let caller = world.principal(founder).await;

    let details = world
        .service
        .add_member(&caller, org_id, member)
        .await
        .unwrap();

    assert_eq!(details.members.len(), 2);
    let claims = world.store.claims_of(member).await.unwrap();
    assert_eq!(claims, vec![Claim::new(ORGANIZATION_CLAIM, org_id.to_string())]);
}

#[tokio::test]
async fn test_promote_admin_is_idempotent() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let caller = world.principal(founder).await;

    world
        .service
        .promote_admin(&caller, org_id, member)
        .await
        .unwrap();
    let details = world
        .service
        .promote_admin(&caller, org_id, member)
        .await
        .unwrap();

    let promoted = details.members.iter().find(|m| m.id == member).unwrap();
    assert!(promoted.is_admin);
    assert!(!promoted.is_owner);
    assert_eq!(
        world.store.roles_of(member).await.unwrap(),
        vec![ADMIN_ROLE.to_string()]
    );
}

#[tokio::test]
async fn test_member_without_admin_role_cannot_add() {
    let world = World::new().await;
    let (org_id, _, member) = world.acme().await;
    let outsider = seed_user(&world.store, "o@example.com", 0).await;
    let caller = world.principal(member).await;

    let err = world
        .service
        .add_member(&caller, org_id, outsider.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrganizationError::Forbidden(AuthError::MissingRole { .. })
    ));
    assert_eq!(err.http_status_code(), 403);
}

#[tokio::test]
async fn test_admin_of_other_org_is_refused() {
    let world = World::new().await;
    let (org_id, _, _) = world.acme().await;
    let rival = seed_user(&world.store, "rival@example.com", 0).await;
    world.service.create(rival.id, "Rival").await.unwrap();
    let caller = world.principal(rival.id).await;
    let target = seed_user(&world.store, "t@example.com", 0).await;

    let err = world
        .service
        .add_member(&caller, org_id, target.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrganizationError::Forbidden(AuthError::NotMemberOf(id)) if id == org_id
    ));
}

#[tokio::test]
async fn test_cannot_pull_member_of_another_org() {
    let world = World::new().await;
    let (org_id, founder, _) = world.acme().await;
    let rival = seed_user(&world.store, "rival@example.com", 0).await;
    world.service.create(rival.id, "Rival").await.unwrap();
    let caller = world.principal(founder).await;

    let err = world
        .service
        .add_member(&caller, org_id, rival.id)
        .await
        .unwrap_err();

    assert!(matches!(err, OrganizationError::AlreadyAffiliated { .. }));
}

#[tokio::test]
async fn test_removal_keeps_grants_by_default() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let caller = world.principal(founder).await;
    world
        .service
        .promote_admin(&caller, org_id, member)
        .await
        .unwrap();

    world
        .service
        .remove_member(&caller, org_id, member)
        .await
        .unwrap();

    let user = world.store.find_user(member).await.unwrap().unwrap();
    assert!(!user.is_admin);
    assert_eq!(world.store.roles_of(member).await.unwrap(), vec![ADMIN_ROLE.to_string()]);
}

#[tokio::test]
async fn test_rejoined_member_can_administer_new_org() {
    let world = World::new().await;
    let (first_org, founder, member) = world.acme().await;
    let first_owner = world.principal(founder).await;
    world
        .service
        .remove_member(&first_owner, first_org, member)
        .await
        .unwrap();

    let second_founder = seed_user(&world.store, "second@example.com", 0).await;
    let second_org = world
        .service
        .create(second_founder.id, "Second")
        .await
        .unwrap()
        .organization
        .id;
    let second_owner = world.principal(second_founder.id).await;
    world
        .service
        .add_member(&second_owner, second_org, member)
        .await
        .unwrap();
    world
        .service
        .promote_admin(&second_owner, second_org, member)
        .await
        .unwrap();

    let claims = world.store.claims_of(member).await.unwrap();
    assert!(claims.contains(&Claim::new(ORGANIZATION_CLAIM, second_org.to_string())));
    let newcomer = seed_user(&world.store, "new@example.com", 0).await;
    let caller = world.principal(member).await;
    let details = world
        .service
        .add_member(&caller, second_org, newcomer.id)
        .await
        .unwrap();
    assert!(details.members.iter().any(|m| m.id == newcomer.id));
    world.store.check_invariants().await.unwrap();
}

#[tokio::test]
async fn test_removal_can_revoke_grants() {
    let world = World::new().await;
    let service = OrganizationService::new(Arc::clone(&world.store), world.clock.clone())
        .revoke_grants_on_removal(true);
    let (org_id, founder, member) = world.acme().await;
    let caller = world.principal(founder).await;
    service.promote_admin(&caller, org_id, member).await.unwrap();

    service.remove_member(&caller, org_id, member).await.unwrap();

    assert!(world.store.roles_of(member).await.unwrap().is_empty());
    assert!(world.store.claims_of(member).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_non_member_is_not_found() {
    let world = World::new().await;
    let (org_id, founder, _) = world.acme().await;
    let stranger = seed_user(&world.store, "s@example.com", 0).await;
    let caller = world.principal(founder).await;

    let err = world
        .service
        .remove_member(&caller, org_id, stranger.id)
        .await
        .unwrap_err();

    assert!(matches!(err, OrganizationError::NotMember { .. }));
}

#[tokio::test]
async fn test_delete_requires_owner_and_orphans_members() {
    let world = World::new().await;
    let (org_id, founder, member) = world.acme().await;
    let caller = world.principal(founder).await;
    world
        .service
        .promote_admin(&caller, org_id, member)
        .await
        .unwrap();

    let admin = world.principal(member).await;
    let err = world.service.delete(&admin, org_id).await.unwrap_err();
    assert!(matches!(
        err,
        OrganizationError::Forbidden(AuthError::MissingRole { .. })
    ));

    world.service.delete(&caller, org_id).await.unwrap();

    assert!(matches!(
        world.service.get(org_id).await,
        Err(OrganizationError::NotFound(_))
    ));
    let founder = world.store.find_user(founder).await.unwrap().unwrap();
    assert_eq!(founder.organization_id, None);
    assert!(!founder.is_owner);
    world.store.check_invariants().await.unwrap();
}
