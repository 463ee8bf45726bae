//! The transfer compliance rule set.
//!
//! Checks run in a fixed order and the first failing one decides:
//!
//! ```text
//! to == issuer                         -> APPROVED (skips everything, lock included)
//! locked                               -> LOCKED
//! !new_holders && receiver_balance==0  -> NEW_SHAREHOLDERS_NOT_ALLOWED
//! from not on any attached whitelist   -> SENDER_NOT_WHITELISTED
//! to not on any attached whitelist     -> RECEIVER_NOT_WHITELISTED
//! from == issuer                       -> APPROVED (skips the holding period)
//! to inside a Reg-D holding period     -> REGULATION_D_HOLDING_PERIOD
//! otherwise                            -> APPROVED
//! ```
//!
//! Malformed requests are rejected with an error before any check runs;
//! a denial is a [`Decision`], never an error.

use chrono::{DateTime, Utc};
use sharegate_policy::PolicyStore;
use sharegate_types::{Address, Decision, ReasonCode, Result, ShareGateError, TransferRequest};
use sharegate_whitelist::{Whitelist, WhitelistLookup};
use tracing::debug;

/// Evaluate `request` against `store` and the whitelists it references.
///
/// # Errors
/// - [`ShareGateError::ZeroAddress`] / [`ShareGateError::InvalidAmount`]
///   for a malformed request.
/// - [`ShareGateError::UnknownAsset`] if `store` does not govern the asset.
/// - [`ShareGateError::UnknownWhitelist`] if an attached whitelist does
///   not resolve.
/// - [`ShareGateError::NotVerifiedCaller`] if a QIB list has not
///   registered the store as a verified caller.
pub fn evaluate<L: WhitelistLookup + ?Sized>(
    store: &PolicyStore,
    lists: &L,
    request: &TransferRequest,
    now: DateTime<Utc>,
) -> Result<Decision> {
    request.validate()?;
    if request.asset != store.asset() {
        return Err(ShareGateError::UnknownAsset(request.asset));
    }

    let decision = decide(store, lists, request, now)?;
    debug!(
        asset = %request.asset,
        from = %request.from.short(),
        to = %request.to.short(),
        amount = %request.amount,
        decision = %decision,
        "Transfer evaluated"
    );
    Ok(decision)
}

fn decide<L: WhitelistLookup + ?Sized>(
    store: &PolicyStore,
    lists: &L,
    request: &TransferRequest,
    now: DateTime<Utc>,
) -> Result<Decision> {
    // Bypass A: value returning to the issuer always moves.
    if store.is_issuer(&request.to) {
        return Ok(Decision::approve());
    }

    if store.is_locked() {
        return Ok(Decision::from_reason(ReasonCode::Locked));
    }

    if !store.new_shareholders_allowed() && request.receiver_balance.is_zero() {
        return Ok(Decision::from_reason(ReasonCode::NewShareholdersNotAllowed));
    }

    let attached = store
        .attached_whitelists()
        .map(|address| lists.resolve(&address))
        .collect::<Result<Vec<&Whitelist>>>()?;
    let caller = store.address();

    if !on_any(&attached, caller, &request.from)? {
        return Ok(Decision::from_reason(ReasonCode::SenderNotWhitelisted));
    }
    if !on_any(&attached, caller, &request.to)? {
        return Ok(Decision::from_reason(ReasonCode::ReceiverNotWhitelisted));
    }

    // Bypass B: the issuer may place restricted shares early.
    if store.is_issuer(&request.from) {
        return Ok(Decision::approve());
    }

    let designated = store.reg_d_whitelist();
    for list in attached
        .iter()
        .filter(|w| w.category().is_regulation_d() || designated == Some(w.address()))
    {
        if !list.verify(caller, &request.to)? {
            continue;
        }
        let release = list.release_date(&request.to).max(store.offering_end());
        if release.is_some_and(|r| now < r) {
            return Ok(Decision::from_reason(ReasonCode::RegulationDHoldingPeriod));
        }
    }

    Ok(Decision::approve())
}

fn on_any(lists: &[&Whitelist], caller: Address, member: &Address) -> Result<bool> {
    for list in lists {
        if list.verify(caller, member)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;
    use sharegate_types::{AssetId, PolicyConfig};
    use sharegate_whitelist::WhitelistBook;

    use super::*;

    struct Env {
        store: PolicyStore,
        book: WhitelistBook,
        owner: Address,
        general: Address,
        reg_d: Address,
        asset: AssetId,
        issuer: Address,
        alice: Address,
        bob: Address,
    }

    impl Env {
        fn new() -> Self {
            let owner = Address::derive("owner");
            let asset = AssetId(Address::derive("token"));
            let mut store = PolicyStore::new(
                Address::derive("store"),
                owner,
                asset,
                &PolicyConfig::default(),
            )
            .unwrap();
            let mut book = WhitelistBook::new();
            let general = book
                .deploy(Whitelist::general(Address::derive("general"), owner).unwrap())
                .unwrap();
            let reg_d = book
                .deploy(Whitelist::regulation_d(Address::derive("regd"), owner).unwrap())
                .unwrap();
            store.add_whitelist(owner, general).unwrap();
            let issuer = Address::derive("issuer");
            store.set_issuer(owner, issuer).unwrap();
            Self {
                store,
                book,
                owner,
                general,
                reg_d,
                asset,
                issuer,
                alice: Address::derive("alice"),
                bob: Address::derive("bob"),
            }
        }

        fn whitelist(&mut self, list: Address, member: Address, release: Option<DateTime<Utc>>) {
            self.book
                .get_mut(&list)
                .unwrap()
                .add(self.owner, member, release)
                .unwrap();
        }

        fn request(&self, from: Address, to: Address) -> TransferRequest {
            TransferRequest::new(self.asset, from, to, Decimal::new(10, 0))
                .with_receiver_balance(Decimal::ONE)
        }

        fn reason(&self, request: &TransferRequest) -> ReasonCode {
            self.reason_at(request, Utc::now())
        }

        fn reason_at(&self, request: &TransferRequest, now: DateTime<Utc>) -> ReasonCode {
            evaluate(&self.store, &self.book, request, now)
                .unwrap()
                .reason()
        }
    }

    #[test]
    fn sender_check_precedes_receiver_check() {
        let mut env = Env::new();
        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason(&req), ReasonCode::SenderNotWhitelisted);

        env.whitelist(env.general, env.alice, None);
        assert_eq!(env.reason(&req), ReasonCode::ReceiverNotWhitelisted);

        env.whitelist(env.general, env.bob, None);
        assert_eq!(env.reason(&req), ReasonCode::Approved);
    }

    #[test]
    fn lock_precedes_membership() {
        let mut env = Env::new();
        env.store.set_locked(env.owner, true).unwrap();
        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason(&req), ReasonCode::Locked);
    }

    #[test]
    fn issuer_destination_bypasses_everything() {
        let mut env = Env::new();
        env.store.set_locked(env.owner, true).unwrap();
        env.store.allow_new_shareholders(env.owner, false).unwrap();
        let req = env
            .request(env.alice, env.issuer)
            .with_receiver_balance(Decimal::ZERO);
        let decision = evaluate(&env.store, &env.book, &req, Utc::now()).unwrap();
        assert!(decision.allowed());
        assert_eq!(decision.reason(), ReasonCode::Approved);
    }

    #[test]
    fn new_shareholder_gate() {
        let mut env = Env::new();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.general, env.bob, None);
        env.store.allow_new_shareholders(env.owner, false).unwrap();

        let fresh = env.request(env.alice, env.bob).with_receiver_balance(Decimal::ZERO);
        assert_eq!(env.reason(&fresh), ReasonCode::NewShareholdersNotAllowed);

        let holder = env.request(env.alice, env.bob);
        assert_eq!(env.reason(&holder), ReasonCode::Approved);
    }

    #[test]
    fn regulation_d_holding_period() {
        let mut env = Env::new();
        let now = Utc::now();
        let release = now + Duration::days(90);
        env.store.add_whitelist(env.owner, env.reg_d).unwrap();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.reg_d, env.bob, Some(release));

        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason_at(&req, now), ReasonCode::RegulationDHoldingPeriod);
        assert_eq!(
            env.reason_at(&req, release + Duration::seconds(1)),
            ReasonCode::Approved
        );

        // The issuer may send into the holding period.
        env.whitelist(env.general, env.issuer, None);
        let from_issuer = env.request(env.issuer, env.bob);
        assert_eq!(env.reason_at(&from_issuer, now), ReasonCode::Approved);
    }

    #[test]
    fn holding_period_ends_at_release_instant() {
        let mut env = Env::new();
        let release = Utc::now() + Duration::days(30);
        env.store.add_whitelist(env.owner, env.reg_d).unwrap();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.reg_d, env.bob, Some(release));

        let req = env.request(env.alice, env.bob);
        assert_eq!(
            env.reason_at(&req, release - Duration::seconds(1)),
            ReasonCode::RegulationDHoldingPeriod
        );
        assert_eq!(env.reason_at(&req, release), ReasonCode::Approved);
    }

    #[test]
    fn designated_general_list_carries_release_dates() {
        let mut env = Env::new();
        let now = Utc::now();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.general, env.bob, Some(now + Duration::days(1)));
        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason_at(&req, now), ReasonCode::Approved);

        env.store
            .set_reg_d_whitelist(env.owner, env.asset, env.general)
            .unwrap();
        assert_eq!(env.reason_at(&req, now), ReasonCode::RegulationDHoldingPeriod);
    }

    #[test]
    fn offering_end_extends_release() {
        let mut env = Env::new();
        let now = Utc::now();
        env.store.add_whitelist(env.owner, env.reg_d).unwrap();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.reg_d, env.bob, None);
        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason_at(&req, now), ReasonCode::Approved);

        env.store
            .set_initial_offer_end_date(env.owner, Some(now + Duration::days(7)))
            .unwrap();
        assert_eq!(env.reason_at(&req, now), ReasonCode::RegulationDHoldingPeriod);
    }

    #[test]
    fn detached_whitelist_stops_counting() {
        let mut env = Env::new();
        env.whitelist(env.general, env.alice, None);
        env.whitelist(env.general, env.bob, None);
        let req = env.request(env.alice, env.bob);
        assert_eq!(env.reason(&req), ReasonCode::Approved);

        env.store.remove_whitelist(env.owner, env.general).unwrap();
        assert_eq!(env.reason(&req), ReasonCode::SenderNotWhitelisted);
    }

    #[test]
    fn malformed_requests_are_errors() {
        let env = Env::new();
        let zero = env.request(Address::ZERO, env.bob);
        assert!(matches!(
            evaluate(&env.store, &env.book, &zero, Utc::now()),
            Err(ShareGateError::ZeroAddress { .. })
        ));

        let other = TransferRequest::new(
            AssetId(Address::derive("other")),
            env.alice,
            env.bob,
            Decimal::ONE,
        );
        assert!(matches!(
            evaluate(&env.store, &env.book, &other, Utc::now()),
            Err(ShareGateError::UnknownAsset(_))
        ));
    }

    #[test]
    fn unresolvable_whitelist_is_error() {
        let mut env = Env::new();
        env.store
            .add_whitelist(env.owner, Address::derive("nowhere"))
            .unwrap();
        let req = env.request(env.alice, env.bob);
        assert!(matches!(
            evaluate(&env.store, &env.book, &req, Utc::now()),
            Err(ShareGateError::UnknownWhitelist(_))
        ));
    }

    #[test]
    fn qib_list_requires_store_as_verified_caller() {
        let mut env = Env::new();
        let qib = env
            .book
            .deploy(Whitelist::qualified_institutional(Address::derive("qib"), env.owner).unwrap())
            .unwrap();
        env.store.remove_whitelist(env.owner, env.general).unwrap();
        env.store.add_whitelist(env.owner, qib).unwrap();
        env.whitelist(qib, env.alice, None);
        env.whitelist(qib, env.bob, None);

        let req = env.request(env.alice, env.bob);
        assert!(matches!(
            evaluate(&env.store, &env.book, &req, Utc::now()),
            Err(ShareGateError::NotVerifiedCaller { .. })
        ));

        let store_addr = env.store.address();
        env.book
            .get_mut(&qib)
            .unwrap()
            .add_verified_caller(env.owner, store_addr)
            .unwrap();
        assert_eq!(env.reason(&req), ReasonCode::Approved);
    }
}
