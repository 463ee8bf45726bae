//! A share ledger that asks the compliance layer before moving value.
//!
//! Every transfer attempt produces a `CheckStatus` audit event carrying
//! the reason code, whether or not value moves. Value moves only on an
//! allowing decision. Forced transfers by the configured arbitration
//! wallet skip the compliance layer entirely.
//!
//! All mutations are atomic: either the whole operation succeeds or
//! balances and allowances are unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sharegate_compliance::TransferVerifier;
use sharegate_types::{
    Address, AssetId, AuditEvent, Capabilities, Decision, EventJournal, Result, Role,
    ShareGateError, TransferRequest,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RegulatedLedger {
    address: Address,
    owner: Address,
    name: String,
    symbol: String,
    registry: Address,

    balances: HashMap<Address, Decimal>,
    allowances: HashMap<(Address, Address), Decimal>,
    total_supply: Decimal,
    minting_finished: bool,

    arbitrator: Option<Address>,
    journal: EventJournal,
}

impl RegulatedLedger {
    /// Deploy a ledger at `address` that verifies through `registry`.
    ///
    /// # Errors
    /// [`ShareGateError::ZeroAddress`] for a zero ledger, owner or registry.
    pub fn new(
        address: Address,
        owner: Address,
        name: &str,
        symbol: &str,
        registry: Address,
    ) -> Result<Self> {
        address.ensure_non_zero("ledger")?;
        owner.ensure_non_zero("owner")?;
        registry.ensure_non_zero("registry")?;
        info!(ledger = %address.short(), symbol, registry = %registry.short(), "Ledger deployed");
        Ok(Self {
            address,
            owner,
            name: name.to_string(),
            symbol: symbol.to_string(),
            registry,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: Decimal::ZERO,
            minting_finished: false,
            arbitrator: None,
            journal: EventJournal::new(address),
        })
    }

    fn capabilities(&self, caller: Address) -> Capabilities {
        Capabilities::of(caller)
            .with_if(Role::Owner, caller == self.owner)
            .with_if(Role::ArbitrationOwner, self.arbitrator == Some(caller))
    }

    fn ensure_amount(amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() {
            return Err(ShareGateError::InvalidAmount(amount));
        }
        Ok(())
    }

    fn ensure_balance(&self, holder: &Address, amount: Decimal) -> Result<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(ShareGateError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: Decimal) {
        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += amount;
        self.journal.emit(AuditEvent::Transfer {
            from,
            to,
            value: amount,
        });
    }

    // =================================================================
    // Supply
    // =================================================================

    pub fn mint(&mut self, caller: Address, to: Address, amount: Decimal) -> Result<()> {
        self.capabilities(caller).require_any(&[Role::Owner], "mint")?;
        if self.minting_finished {
            return Err(ShareGateError::MintingFinished);
        }
        to.ensure_non_zero("to")?;
        Self::ensure_amount(amount)?;

        *self.balances.entry(to).or_default() += amount;
        self.total_supply += amount;
        self.journal.emit(AuditEvent::Mint { to, amount });
        self.journal.emit(AuditEvent::Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        });
        info!(ledger = %self.address.short(), to = %to.short(), %amount, "Minted");
        Ok(())
    }

    /// Permanently close minting.
    pub fn finish_minting(&mut self, caller: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "finishMinting")?;
        if self.minting_finished {
            return Err(ShareGateError::MintingFinished);
        }
        self.minting_finished = true;
        self.journal.emit(AuditEvent::MintFinished);
        info!(ledger = %self.address.short(), supply = %self.total_supply, "Minting finished");
        Ok(())
    }

    // =================================================================
    // Regulated transfers
    // =================================================================

    /// Move `amount` from `caller` to `to` if the compliance layer allows.
    ///
    /// Returns the decision. A denial is `Ok` with nothing moved.
    ///
    /// # Errors
    /// [`ShareGateError::InsufficientBalance`] before evaluation, or any
    /// caller error from the verifier.
    pub fn transfer<V: TransferVerifier + ?Sized>(
        &mut self,
        verifier: &V,
        caller: Address,
        to: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        Self::ensure_amount(amount)?;
        self.ensure_balance(&caller, amount)?;
        let request = TransferRequest::new(self.asset(), caller, to, amount)
            .with_receiver_balance(self.balance_of(&to));
        let decision = self.check(verifier, &request, now)?;
        if decision.allowed() {
            self.move_balance(caller, to, amount);
        }
        Ok(decision)
    }

    /// Move `amount` from `from` to `to` on `caller`'s allowance.
    pub fn transfer_from<V: TransferVerifier + ?Sized>(
        &mut self,
        verifier: &V,
        caller: Address,
        from: Address,
        to: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        Self::ensure_amount(amount)?;
        let allowed = self.allowance(&from, &caller);
        if allowed < amount {
            return Err(ShareGateError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }
        self.ensure_balance(&from, amount)?;
        let request = TransferRequest::new(self.asset(), from, to, amount)
            .with_spender(caller)
            .with_receiver_balance(self.balance_of(&to));
        let decision = self.check(verifier, &request, now)?;
        if decision.allowed() {
            self.allowances.insert((from, caller), allowed - amount);
            self.move_balance(from, to, amount);
        }
        Ok(decision)
    }

    /// Evaluate and record the outcome as `CheckStatus`.
    fn check<V: TransferVerifier + ?Sized>(
        &mut self,
        verifier: &V,
        request: &TransferRequest,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let decision = verifier.verify_transfer(self.registry, request, now)?;
        self.journal.emit(AuditEvent::CheckStatus {
            spender: request.spender,
            from: request.from,
            to: request.to,
            value: request.amount,
            reason: decision.reason(),
        });
        debug!(
            ledger = %self.address.short(),
            from = %request.from.short(),
            to = %request.to.short(),
            amount = %request.amount,
            decision = %decision,
            "CheckStatus"
        );
        Ok(decision)
    }

    /// Set `spender`'s allowance over `caller`'s balance. Not regulated.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Decimal) -> Result<()> {
        spender.ensure_non_zero("spender")?;
        Self::ensure_amount(amount)?;
        self.allowances.insert((caller, spender), amount);
        self.journal.emit(AuditEvent::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        Ok(())
    }

    // =================================================================
    // Arbitration
    // =================================================================

    /// Owner-only.
    pub fn set_multisig_arbitrator(&mut self, caller: Address, arbitrator: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "setMultisigArbitrator")?;
        arbitrator.ensure_non_zero("arbitrator")?;
        self.arbitrator = Some(arbitrator);
        self.journal
            .emit(AuditEvent::MultisigArbitratorSet { arbitrator });
        info!(
            ledger = %self.address.short(),
            arbitrator = %arbitrator.short(),
            "Multisig arbitrator set"
        );
        Ok(())
    }

    /// Owner-only read of the configured arbitrator.
    pub fn multisig_arbitrator(&self, caller: Address) -> Result<Option<Address>> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "multisigArbitrator")?;
        Ok(self.arbitrator)
    }

    /// Move value without consulting the compliance layer. Only the
    /// configured arbitrator may call this.
    pub fn force_transfer(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> Result<()> {
        if let Err(err) = self
            .capabilities(caller)
            .require_any(&[Role::ArbitrationOwner], "forceTransfer")
        {
            warn!(ledger = %self.address.short(), caller = %caller.short(), "Forced transfer refused");
            return Err(err);
        }
        from.ensure_non_zero("from")?;
        to.ensure_non_zero("to")?;
        Self::ensure_amount(amount)?;
        self.ensure_balance(&from, amount)?;

        self.move_balance(from, to, amount);
        self.journal.emit(AuditEvent::ForcedTransfer {
            arbitrator: caller,
            from,
            to,
            value: amount,
        });
        info!(
            ledger = %self.address.short(),
            from = %from.short(),
            to = %to.short(),
            %amount,
            "Forced transfer"
        );
        Ok(())
    }

    // =================================================================
    // Reads
    // =================================================================

    #[must_use]
    pub fn balance_of(&self, holder: &Address) -> Decimal {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Decimal {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    #[must_use]
    pub fn is_minting_finished(&self) -> bool {
        self.minting_finished
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The ledger's own address doubles as the asset identity.
    #[must_use]
    pub fn asset(&self) -> AssetId {
        AssetId(self.address)
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn registry(&self) -> Address {
        self.registry
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut EventJournal {
        &mut self.journal
    }
}
