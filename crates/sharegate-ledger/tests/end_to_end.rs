//! End-to-end tests across the whole compliance stack.
//!
//! Transfers enter the ledger, which verifies through
//! registry -> regulator service -> policy store -> whitelists, and
//! records a `CheckStatus` for every attempt. Arbitration tests drive the
//! ledger through a 2-of-2 multisig wallet.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sharegate_arbitration::{ExecutionStatus, MultiSigArbitration};
use sharegate_compliance::{ContractKind, Deployment};
use sharegate_ledger::{LedgerCall, LedgerExecutor, RegulatedLedger};
use sharegate_policy::PolicyStore;
use sharegate_types::*;
use sharegate_whitelist::Whitelist;

/// Helper: one regulated share with its full compliance deployment.
struct Market {
    deployment: Deployment,
    ledger: RegulatedLedger,
    owner: Address,
    issuer: Address,
    store: Address,
    service: Address,
    general: Address,
    reg_d: Address,
}

impl Market {
    fn new() -> Self {
        let owner = Address::derive("owner");
        let issuer = Address::derive("issuer");
        let token = Address::derive("token");
        let asset = AssetId(token);

        let mut deployment = Deployment::new();
        let general = deployment
            .deploy_whitelist(Whitelist::general(Address::derive("wl-general"), owner).unwrap())
            .unwrap();
        let reg_d = deployment
            .deploy_whitelist(Whitelist::regulation_d(Address::derive("wl-regd"), owner).unwrap())
            .unwrap();
        let store = deployment
            .deploy_policy_store(
                PolicyStore::new(
                    Address::derive("store"),
                    owner,
                    asset,
                    &PolicyConfig::default(),
                )
                .unwrap(),
            )
            .unwrap();
        let service = deployment
            .deploy_service(Address::derive("service"), owner, store)
            .unwrap();
        let registry = deployment
            .deploy_registry(Address::derive("registry"), owner, service)
            .unwrap();
        deployment.attach_whitelist(&store, owner, general).unwrap();
        deployment.attach_whitelist(&store, owner, reg_d).unwrap();
        deployment
            .store_mut(&store)
            .unwrap()
            .set_issuer(owner, issuer)
            .unwrap();

        let ledger = RegulatedLedger::new(token, owner, "Acme Class A", "ACME", registry).unwrap();
        deployment
            .register_contract(token, ContractKind::Ledger)
            .unwrap();

        Self {
            deployment,
            ledger,
            owner,
            issuer,
            store,
            service,
            general,
            reg_d,
        }
    }

    fn policy(&mut self) -> &mut PolicyStore {
        self.deployment.store_mut(&self.store).unwrap()
    }

    fn whitelist(&mut self, list: Address, member: Address, release: Option<DateTime<Utc>>) {
        let owner = self.owner;
        self.deployment
            .whitelist_mut(&list)
            .unwrap()
            .add(owner, member, release)
            .unwrap();
    }

    fn mint(&mut self, to: Address, amount: i64) {
        self.ledger.mint(self.owner, to, dec(amount)).unwrap();
    }

    fn transfer_at(&mut self, from: Address, to: Address, amount: i64, now: DateTime<Utc>) -> Decision {
        self.ledger
            .transfer(&self.deployment, from, to, dec(amount), now)
            .unwrap()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: i64) -> Decision {
        self.transfer_at(from, to, amount, Utc::now())
    }

    fn last_reason(&self) -> ReasonCode {
        let last = self.ledger.journal().records().iter().rev().find_map(|r| match r.event {
            AuditEvent::CheckStatus { reason, .. } => Some(reason),
            _ => None,
        });
        match last {
            Some(reason) => reason,
            None => panic!("no CheckStatus recorded"),
        }
    }
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn alice() -> Address {
    Address::derive("alice")
}

fn bob() -> Address {
    Address::derive("bob")
}

// ---------------------------------------------------------------------------
// Reason-code walk
// ---------------------------------------------------------------------------

#[test]
fn reason_codes_in_evaluation_order() {
    let mut m = Market::new();
    m.mint(alice(), 100);

    // Neither party listed: sender check comes first.
    assert_eq!(m.transfer(alice(), bob(), 10).reason(), ReasonCode::SenderNotWhitelisted);

    m.whitelist(m.general, alice(), None);
    assert_eq!(m.transfer(alice(), bob(), 10).reason(), ReasonCode::ReceiverNotWhitelisted);

    m.whitelist(m.general, bob(), None);
    let owner = m.owner;
    m.policy().set_locked(owner, true).unwrap();
    assert_eq!(m.transfer(alice(), bob(), 10).reason(), ReasonCode::Locked);

    m.policy().set_locked(owner, false).unwrap();
    m.policy().allow_new_shareholders(owner, false).unwrap();
    assert_eq!(m.transfer(alice(), bob(), 10).reason(), ReasonCode::NewShareholdersNotAllowed);
    assert_eq!(m.ledger.balance_of(&bob()), Decimal::ZERO);

    // Bob becomes a holder through the issuer.
    m.mint(m.issuer, 5);
    m.whitelist(m.general, m.issuer, None);
    m.policy().allow_new_shareholders(owner, true).unwrap();
    assert!(m.transfer(m.issuer, bob(), 1).allowed());
    m.policy().allow_new_shareholders(owner, false).unwrap();

    let d = m.transfer(alice(), bob(), 10);
    assert!(d.allowed());
    assert_eq!(d.reason(), ReasonCode::Approved);
    assert_eq!(m.ledger.balance_of(&alice()), dec(90));
    assert_eq!(m.ledger.balance_of(&bob()), dec(11));
}

#[test]
fn every_attempt_is_audited() {
    let mut m = Market::new();
    m.mint(alice(), 10);
    let before = m.ledger.journal().len();

    m.transfer(alice(), bob(), 1);
    m.transfer(alice(), bob(), 1);

    let statuses = m
        .ledger
        .journal()
        .records()
        .iter()
        .skip(before)
        .filter(|r| r.event.name() == "CheckStatus")
        .count();
    assert_eq!(statuses, 2);
    assert_eq!(m.last_reason(), ReasonCode::SenderNotWhitelisted);
    assert_eq!(m.ledger.balance_of(&alice()), dec(10));
}

// ---------------------------------------------------------------------------
// Issuer bypasses
// ---------------------------------------------------------------------------

#[test]
fn transfer_to_issuer_ignores_lock_and_whitelists() {
    let mut m = Market::new();
    m.mint(alice(), 10);
    let owner = m.owner;
    m.policy().set_locked(owner, true).unwrap();
    m.policy().allow_new_shareholders(owner, false).unwrap();

    let issuer = m.issuer;
    let d = m.transfer(alice(), issuer, 4);
    assert!(d.allowed());
    assert_eq!(m.ledger.balance_of(&issuer), dec(4));
}

#[test]
fn regulation_d_holding_period_and_issuer_exemption() {
    let mut m = Market::new();
    let now = Utc::now();
    let release = now + Duration::days(365);
    m.mint(alice(), 10);
    m.mint(m.issuer, 10);
    m.whitelist(m.general, alice(), None);
    m.whitelist(m.general, m.issuer, None);
    m.whitelist(m.reg_d, bob(), Some(release));

    assert_eq!(
        m.transfer_at(alice(), bob(), 1, now).reason(),
        ReasonCode::RegulationDHoldingPeriod
    );
    let issuer = m.issuer;
    assert_eq!(m.transfer_at(issuer, bob(), 1, now).reason(), ReasonCode::Approved);

    let later = release + Duration::seconds(1);
    assert_eq!(m.transfer_at(alice(), bob(), 1, later).reason(), ReasonCode::Approved);
    assert_eq!(m.ledger.balance_of(&bob()), dec(2));
}

// ---------------------------------------------------------------------------
// Whitelist and policy properties
// ---------------------------------------------------------------------------

#[test]
fn re_adding_keeps_latest_release_time() {
    let mut m = Market::new();
    let now = Utc::now();
    m.whitelist(m.reg_d, bob(), Some(now + Duration::days(10)));
    m.whitelist(m.reg_d, bob(), Some(now - Duration::days(1)));

    let list = m.deployment.whitelist(&m.reg_d).unwrap();
    assert_eq!(list.release_date(&bob()), Some(now - Duration::days(1)));
    assert!(list.verify(m.owner, &bob()).unwrap());

    m.mint(alice(), 5);
    m.whitelist(m.general, alice(), None);
    assert!(m.transfer_at(alice(), bob(), 1, now).allowed());
}

#[test]
fn attach_then_detach_restores_eligibility() {
    let mut m = Market::new();
    m.mint(alice(), 5);
    let extra = m
        .deployment
        .deploy_whitelist(Whitelist::general(Address::derive("wl-extra"), m.owner).unwrap())
        .unwrap();
    m.whitelist(extra, alice(), None);
    m.whitelist(extra, bob(), None);
    assert_eq!(m.transfer(alice(), bob(), 1).reason(), ReasonCode::SenderNotWhitelisted);

    let (owner, store, general, reg_d) = (m.owner, m.store, m.general, m.reg_d);
    m.deployment.attach_whitelist(&store, owner, extra).unwrap();
    assert!(m.transfer(alice(), bob(), 1).allowed());

    m.policy().remove_whitelist(owner, extra).unwrap();
    assert_eq!(m.transfer(alice(), bob(), 1).reason(), ReasonCode::SenderNotWhitelisted);
    assert_eq!(m.policy().whitelists(), &[Some(general), Some(reg_d), None]);
}

#[test]
fn replacing_storage_swaps_the_rules() {
    let mut m = Market::new();
    m.mint(alice(), 5);
    m.whitelist(m.general, alice(), None);
    m.whitelist(m.general, bob(), None);
    assert!(m.transfer(alice(), bob(), 1).allowed());

    let frozen = PolicyStore::new(
        Address::derive("store-frozen"),
        m.owner,
        m.ledger.asset(),
        &PolicyConfig {
            locked: true,
            ..PolicyConfig::default()
        },
    )
    .unwrap();
    let frozen = m.deployment.deploy_policy_store(frozen).unwrap();
    let (owner, service) = (m.owner, m.service);

    assert!(matches!(
        m.deployment.replace_storage(&service, owner, Address::derive("plain")),
        Err(ShareGateError::NotAContract { .. })
    ));
    m.deployment.replace_storage(&service, owner, frozen).unwrap();
    assert_eq!(m.transfer(alice(), bob(), 1).reason(), ReasonCode::Locked);
    assert_eq!(
        m.deployment.service(&service).unwrap().journal().names(),
        vec!["ReplaceStorage"]
    );
}

#[test]
fn caller_errors_are_not_decisions() {
    let mut m = Market::new();
    m.mint(alice(), 5);
    let before = m.ledger.journal().len();

    let err = m
        .ledger
        .transfer(&m.deployment, alice(), Address::ZERO, dec(1), Utc::now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);

    let err = m
        .ledger
        .transfer(&m.deployment, alice(), bob(), dec(50), Utc::now())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Ledger);
    assert_eq!(m.ledger.journal().len(), before);
}

// ---------------------------------------------------------------------------
// Arbitration
// ---------------------------------------------------------------------------

fn arbitration(m: &mut Market) -> (MultiSigArbitration, Address, Address) {
    let a = Address::derive("arbiter-a");
    let b = Address::derive("arbiter-b");
    let wallet = MultiSigArbitration::new(
        Address::derive("wallet"),
        &ArbitrationConfig::new(vec![a, b], 2),
    )
    .unwrap();
    m.deployment
        .register_contract(wallet.address(), ContractKind::ArbitrationWallet)
        .unwrap();
    let owner = m.owner;
    m.ledger
        .set_multisig_arbitrator(owner, wallet.address())
        .unwrap();
    (wallet, a, b)
}

#[test]
fn forced_transfer_through_two_of_two_wallet() {
    let mut m = Market::new();
    m.mint(alice(), 20);
    let owner = m.owner;
    m.policy().set_locked(owner, true).unwrap();
    let (mut wallet, a, b) = arbitration(&mut m);

    let payload = LedgerCall::ForceTransfer {
        from: alice(),
        to: bob(),
        value: dec(15),
    }
    .encode()
    .unwrap();
    let token = m.ledger.address();
    let now = Utc::now();

    let mut exec = LedgerExecutor::new(&mut m.ledger, &m.deployment, now);
    let r = wallet
        .submit_transaction(a, token, Decimal::ZERO, payload, &mut exec)
        .unwrap();
    assert_eq!(r.status, ExecutionStatus::Pending);

    let r = wallet
        .confirm_transaction(b, r.transaction_id, &mut exec)
        .unwrap();
    assert_eq!(r.status, ExecutionStatus::Executed);

    assert!(wallet
        .confirm_transaction(b, r.transaction_id, &mut exec)
        .is_err());

    // Lock and whitelists were never consulted.
    assert_eq!(m.ledger.balance_of(&alice()), dec(5));
    assert_eq!(m.ledger.balance_of(&bob()), dec(15));
    assert_eq!(
        m.ledger.journal().last(),
        Some(&AuditEvent::ForcedTransfer {
            arbitrator: wallet.address(),
            from: alice(),
            to: bob(),
            value: dec(15),
        })
    );
    assert_eq!(
        wallet.journal().names(),
        vec!["Submission", "Confirmation", "Confirmation", "Execution"]
    );
}

#[test]
fn single_owner_cannot_force_transfer() {
    let mut m = Market::new();
    m.mint(alice(), 20);
    let (mut wallet, a, _) = arbitration(&mut m);
    let payload = LedgerCall::ForceTransfer {
        from: alice(),
        to: bob(),
        value: dec(20),
    }
    .encode()
    .unwrap();
    let token = m.ledger.address();

    let mut exec = LedgerExecutor::new(&mut m.ledger, &m.deployment, Utc::now());
    wallet
        .submit_transaction(a, token, Decimal::ZERO, payload, &mut exec)
        .unwrap();

    assert_eq!(m.ledger.balance_of(&alice()), dec(20));
    // A wallet owner acting directly is not the arbitrator.
    assert!(m.ledger.force_transfer(a, alice(), bob(), dec(1)).is_err());
}

#[test]
fn denied_wallet_transfer_fails_then_retries() {
    let mut m = Market::new();
    let (mut wallet, a, b) = arbitration(&mut m);
    let wallet_addr = wallet.address();
    m.mint(wallet_addr, 10);
    m.whitelist(m.general, wallet_addr, None);
    m.whitelist(m.general, bob(), None);
    let owner = m.owner;
    m.policy().set_locked(owner, true).unwrap();

    let payload = LedgerCall::Transfer {
        to: bob(),
        value: dec(3),
    }
    .encode()
    .unwrap();
    let token = m.ledger.address();

    let id = {
        let mut exec = LedgerExecutor::new(&mut m.ledger, &m.deployment, Utc::now());
        let r = wallet
            .submit_transaction(a, token, Decimal::ZERO, payload, &mut exec)
            .unwrap();
        let r = wallet
            .confirm_transaction(b, r.transaction_id, &mut exec)
            .unwrap();
        assert_eq!(r.status, ExecutionStatus::Failed);
        r.transaction_id
    };
    assert!(!wallet.transaction(id).unwrap().executed);
    assert_eq!(m.last_reason(), ReasonCode::Locked);
    assert_eq!(m.ledger.balance_of(&bob()), Decimal::ZERO);

    m.policy().set_locked(owner, false).unwrap();
    let mut exec = LedgerExecutor::new(&mut m.ledger, &m.deployment, Utc::now());
    let r = wallet.execute_transaction(a, id, &mut exec).unwrap();
    assert_eq!(r.status, ExecutionStatus::Executed);

    assert_eq!(m.ledger.balance_of(&bob()), dec(3));
    assert_eq!(
        wallet.journal().names(),
        vec![
            "Submission",
            "Confirmation",
            "Confirmation",
            "ExecutionFailure",
            "Execution"
        ]
    );
}
