//! # Deal Engine
//!
//! Escrow and settlement engine for data-licensing deals.
//!
//! The [`DealEngine`] owns the deal registry, the custody ledger, the access
//! gate and the configuration, and talks to an external swap venue through
//! the [`SwapGateway`] port.
//!
//! # Operation Flow
//!
//! ```text
//! receive_deposit(stable) ─→ create_deal ─→ [decline ⇄ accept]* ─┬→ payout
//!                              │ swap stable → utility            └→ settle_declined_deal
//!                              ↓ credit utility_allocated             │ swap utility → stable
//!                                                                     ↓ to the payout relay
//! ```
//!
//! # Atomicity
//!
//! Every mutating operation holds the state mutex for its whole duration,
//! gateway calls included. Custody transfers are staged in a
//! [`TransferBatch`], checked against the balances before the swap and
//! committed only after every fallible step succeeded. A failed operation
//! leaves balances and deal fields untouched.
//!
//! # Guard Order
//!
//! Role, then pause, then deal index, then the per-operation lifecycle
//! checks of [`Deal`].

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::access_gate::{AccessGate, Role};
use crate::config::EngineConfig;
use crate::domain::entities::deal::{Deal, DealTerms, LogicVersion};
use crate::domain::errors::DomainError;
use crate::domain::events::{
    AdminEvent, AdminGranted, AdminRevoked, ConfigParameter, ConfigUpdated, CustodyWithdrawn,
    DealAccepted, DealCreated, DealDeclined, DealEvent, DeclineSettled, EngineEvent, EnginePaused,
    EngineUnpaused, LogicUpgraded, PayoutSettled,
};
use crate::domain::services::settlement_calculator::{
    min_amount_out, seller_commission, PayoutPlan, RefundPlan, SettlementPlan,
};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, Asset, DealIndex, Percent, SwapPath, TokenAmount};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::custody::{CustodyLedger, TransferBatch, TransferReason};
use crate::infrastructure::persistence::DealRegistry;
use crate::infrastructure::swap::{SwapError, SwapGateway, SwapOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// First index assigned by `create_deal_v2` after the V2 upgrade.
pub const V2_FIRST_INDEX: DealIndex = DealIndex::new(101);

/// Schema version written into every [`EngineSnapshot`].
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serializable copy of the full engine state.
///
/// `events` and the custody journal grow with every operation and are
/// copied in full. Callers that archive events elsewhere can empty the
/// event journal with [`DealEngine::drain_events`]. The custody journal is
/// kept whole since per-recipient totals are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Layout version of this snapshot.
    pub schema_version: u32,
    /// Active logic version.
    pub logic_version: LogicVersion,
    /// Configuration.
    pub config: EngineConfig,
    /// Roles and pause flag.
    pub gate: AccessGate,
    /// Every deal plus the index counter.
    pub registry: DealRegistry,
    /// Custody balances and journal.
    pub custody: CustodyLedger,
    /// Event journal.
    pub events: Vec<EngineEvent>,
}

#[derive(Debug)]
struct EngineState {
    logic_version: LogicVersion,
    config: EngineConfig,
    gate: AccessGate,
    registry: DealRegistry,
    custody: CustodyLedger,
    events: Vec<EngineEvent>,
    gateway: Arc<dyn SwapGateway>,
}

impl EngineState {
    fn record(&mut self, event: impl Into<EngineEvent>) {
        self.events.push(event.into());
    }

    fn authorize_transition(&self, caller: Address) -> ApplicationResult<()> {
        self.gate.require(caller, Role::Admin)?;
        self.gate.ensure_running()
    }

    fn update_config(&mut self, update: impl FnOnce(&mut EngineConfig)) -> ApplicationResult<()> {
        let mut config = self.config.clone();
        update(&mut config);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn ensure_funded(&self, index: DealIndex, batch: &TransferBatch) -> ApplicationResult<()> {
        if let Err(e) = self.custody.ensure_covers(batch) {
            warn!(deal_index = %index, error = %e, "custody cannot fund settlement");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Escrow and settlement engine.
#[derive(Debug)]
pub struct DealEngine {
    state: Mutex<EngineState>,
    clock: Arc<dyn Clock>,
}

impl DealEngine {
    /// Creates an engine deployed by `owner`.
    ///
    /// `owner` receives the owner role and admin; `config.initial_admin`
    /// receives admin. The configured router is replaced by the router of
    /// `gateway`.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the config is invalid.
    pub fn new(
        owner: Address,
        mut config: EngineConfig,
        gateway: Arc<dyn SwapGateway>,
        clock: Arc<dyn Clock>,
    ) -> ApplicationResult<Self> {
        config.swap_router = gateway.router();
        config.validate()?;
        info!(owner = ?owner, router = ?config.swap_router, "deal engine initialised");

        Ok(Self {
            state: Mutex::new(EngineState {
                logic_version: LogicVersion::V1,
                gate: AccessGate::new(owner, config.initial_admin),
                config,
                registry: DealRegistry::new(),
                custody: CustodyLedger::new(),
                events: Vec::new(),
                gateway,
            }),
            clock,
        })
    }

    /// Rebuilds an engine from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the schema version is
    /// unknown or the stored config is invalid.
    pub fn restore(
        snapshot: EngineSnapshot,
        gateway: Arc<dyn SwapGateway>,
        clock: Arc<dyn Clock>,
    ) -> ApplicationResult<Self> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(ApplicationError::configuration(format!(
                "unsupported snapshot schema version {}",
                snapshot.schema_version
            )));
        }
        let mut config = snapshot.config;
        config.swap_router = gateway.router();
        config.validate()?;
        info!(
            deals = snapshot.registry.len(),
            logic_version = %snapshot.logic_version,
            "deal engine restored"
        );

        Ok(Self {
            state: Mutex::new(EngineState {
                logic_version: snapshot.logic_version,
                config,
                gate: snapshot.gate,
                registry: snapshot.registry,
                custody: snapshot.custody,
                events: snapshot.events,
                gateway,
            }),
            clock,
        })
    }

    /// Exports the full engine state.
    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock().await;
        EngineSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            logic_version: state.logic_version,
            config: state.config.clone(),
            gate: state.gate.clone(),
            registry: state.registry.clone(),
            custody: state.custody.clone(),
            events: state.events.clone(),
        }
    }

    // ========== Deal Creation ==========

    /// Creates a deal, swapping `price_amount` of custody stable tokens into
    /// the utility tokens held for it.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if `caller` is not an admin
    /// - `Paused` while paused
    /// - `Validation` for a zero price or an unrepresentable lock window
    /// - `InsufficientBalance` if custody holds less stable than the price
    /// - `GatewayFailure` if the swap fails or yields less than
    ///   `min_utility_amount`
    pub async fn create_deal(&self, caller: Address, terms: DealTerms) -> ApplicationResult<DealIndex> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        let version = state.logic_version;
        self.open_deal(&mut state, terms, version).await
    }

    /// Creates a deal under the V2 operation set.
    ///
    /// # Errors
    ///
    /// As [`create_deal`](Self::create_deal), plus `UnsupportedOperation`
    /// before the V2 upgrade.
    pub async fn create_deal_v2(
        &self,
        caller: Address,
        terms: DealTerms,
    ) -> ApplicationResult<DealIndex> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        if state.logic_version < LogicVersion::V2 {
            return Err(ApplicationError::unsupported(
                "create_deal_v2 requires the v2 logic upgrade",
            ));
        }
        self.open_deal(&mut state, terms, LogicVersion::V2).await
    }

    async fn open_deal(
        &self,
        state: &mut EngineState,
        terms: DealTerms,
        version: LogicVersion,
    ) -> ApplicationResult<DealIndex> {
        let now = self.clock.now();
        terms.validate()?;
        if now.checked_add_secs(terms.lock_duration_secs).is_none() {
            return Err(DomainError::validation("lock duration out of range").into());
        }

        let mut batch = TransferBatch::new();
        batch.debit(
            Asset::Stable,
            terms.price_amount,
            state.config.swap_router,
            TransferReason::CreationSwapOut,
        );
        state.custody.ensure_covers(&batch)?;

        let order = SwapOrder {
            amount_in: terms.price_amount,
            min_amount_out: terms.min_utility_amount,
            path: state.config.creation_path()?,
            recipient: state.config.custody_account,
            deadline: deadline_after(&state.config, now)?,
        };
        let gateway = Arc::clone(&state.gateway);
        let receipt = gateway.swap_exact_in(&order).await?;
        if receipt.amount_out < terms.min_utility_amount {
            return Err(SwapError::SlippageExceeded {
                min_out: terms.min_utility_amount,
                actual: receipt.amount_out,
            }
            .into());
        }

        let index = state.registry.next_index();
        let deal = Deal::open(index, terms, receipt.amount_out, now, version)?;
        batch.credit(
            Asset::Utility,
            receipt.amount_out,
            state.config.swap_router,
            TransferReason::CreationSwapIn,
        );
        state.custody.commit(batch)?;
        state.registry.create(deal.clone())?;
        state.record(DealEvent::Created(DealCreated::from_deal(&deal)));

        info!(
            deal_index = %index,
            external_id = deal.external_id(),
            price = %deal.price_amount(),
            utility_allocated = %deal.utility_allocated(),
            logic_version = %version,
            "deal created"
        );
        Ok(index)
    }

    // ========== Lifecycle Transitions ==========

    /// Registers the buyer's decline.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Paused`, `InvalidIndex`, then `InvalidState` if
    /// already declined, `AlreadySettled` once settled, or `WindowClosed`
    /// once the window elapsed.
    pub async fn decline_deal(&self, caller: Address, index: DealIndex) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        let now = self.clock.now();
        state.registry.get_mut(index)?.decline(now)?;
        state.record(DealEvent::Declined(DealDeclined::new(index, now)));
        info!(deal_index = %index, "deal declined");
        Ok(())
    }

    /// Re-registers acceptance of a declined deal.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Paused`, `InvalidIndex`, then `InvalidState` if
    /// already accepted, `AlreadySettled` once settled, or `WindowClosed`
    /// once the window elapsed.
    pub async fn accept_deal(&self, caller: Address, index: DealIndex) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        let now = self.clock.now();
        state.registry.get_mut(index)?.accept(now)?;
        state.record(DealEvent::Accepted(DealAccepted::new(index, now)));
        info!(deal_index = %index, "deal accepted");
        Ok(())
    }

    /// Settles an accepted deal: pays the seller commission in stable tokens
    /// to the payout relay and splits the utility remainder between the
    /// staking pool and the platform beneficiary.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`, `Paused`, `InvalidIndex`
    /// - `AlreadySettled`, `Locked`, `DeclinedState` in that order
    /// - `InsufficientBalance` if custody cannot fund the utility outflow
    /// - `GatewayFailure` if a quote or the swap fails
    pub async fn payout(&self, caller: Address, index: DealIndex) -> ApplicationResult<PayoutPlan> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        let now = self.clock.now();
        let deal = state.registry.get(index)?.clone();
        deal.ensure_payable(now)?;

        let gateway = Arc::clone(&state.gateway);
        let plan = plan_payout(gateway.as_ref(), &state.config, &deal).await?;

        let mut batch = TransferBatch::new();
        batch.debit(
            Asset::Utility,
            plan.required,
            state.config.swap_router,
            TransferReason::SettlementSwap,
        );
        batch.debit(
            Asset::Utility,
            plan.staking_share,
            state.config.staking_pool,
            TransferReason::StakingShare,
        );
        batch.debit(
            Asset::Utility,
            plan.platform_share,
            deal.platform_beneficiary(),
            TransferReason::PlatformShare,
        );
        state.ensure_funded(index, &batch)?;

        let stable_out = sell_utility(gateway.as_ref(), &state.config, plan.required, now).await?;

        state.custody.commit(batch)?;
        state.registry.get_mut(index)?.mark_settled()?;
        state.record(DealEvent::PayoutSettled(PayoutSettled::new(
            index,
            now,
            stable_out,
            plan.required,
            plan.staking_share,
            plan.platform_share,
        )));

        info!(
            deal_index = %index,
            seller_commission = %plan.seller_commission,
            stable_out = %stable_out,
            utility_sold = %plan.required,
            staking_share = %plan.staking_share,
            platform_share = %plan.platform_share,
            shortfall = %plan.shortfall,
            "deal paid out"
        );
        Ok(plan)
    }

    /// Settles a declined deal: refunds the full price in stable tokens to
    /// the payout relay. No commission is distributed.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`, `Paused`, `InvalidIndex`
    /// - `NotDeclined`, `Locked`, `AlreadySettled` in that order
    /// - `InsufficientBalance` if custody holds less utility than required
    /// - `GatewayFailure` if a quote or the swap fails
    pub async fn settle_declined_deal(
        &self,
        caller: Address,
        index: DealIndex,
    ) -> ApplicationResult<RefundPlan> {
        let mut state = self.state.lock().await;
        state.authorize_transition(caller)?;
        let now = self.clock.now();
        let deal = state.registry.get(index)?.clone();
        deal.ensure_refundable(now)?;

        let gateway = Arc::clone(&state.gateway);
        let plan = plan_refund(gateway.as_ref(), &state.config, &deal).await?;

        let mut batch = TransferBatch::new();
        batch.debit(
            Asset::Utility,
            plan.required,
            state.config.swap_router,
            TransferReason::SettlementSwap,
        );
        state.ensure_funded(index, &batch)?;

        let stable_out = sell_utility(gateway.as_ref(), &state.config, plan.required, now).await?;

        state.custody.commit(batch)?;
        state.registry.get_mut(index)?.mark_settled()?;
        state.record(DealEvent::DeclineSettled(DeclineSettled::new(
            index,
            now,
            stable_out,
            plan.required,
        )));

        info!(
            deal_index = %index,
            refund = %plan.refund,
            stable_out = %stable_out,
            utility_sold = %plan.required,
            shortfall = %plan.shortfall,
            "declined deal refunded"
        );
        Ok(plan)
    }

    // ========== Queries ==========

    /// Returns a copy of the deal at `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` for an unknown index.
    pub async fn get_deal(&self, index: DealIndex) -> ApplicationResult<Deal> {
        let state = self.state.lock().await;
        Ok(state.registry.get(index)?.clone())
    }

    /// Indices of deals with `external_id`, in creation order.
    pub async fn indices_by_external_id(&self, external_id: &str) -> Vec<DealIndex> {
        self.state.lock().await.registry.indices_by_external_id(external_id)
    }

    /// Indices of deals where `account` is buyer or seller, in creation order.
    pub async fn indices_by_participant(&self, account: Address) -> Vec<DealIndex> {
        self.state.lock().await.registry.indices_by_participant(account)
    }

    /// Index of the most recently created deal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if no deal exists.
    pub async fn latest_index(&self) -> ApplicationResult<DealIndex> {
        Ok(self.state.lock().await.registry.latest_index()?)
    }

    /// Quotes the deal's held utility allocation along `path` without
    /// executing a swap.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` for an unknown deal, `GatewayFailure` if the venue
    /// cannot quote.
    pub async fn preview_swap(
        &self,
        index: DealIndex,
        path: &SwapPath,
    ) -> ApplicationResult<Vec<TokenAmount>> {
        let state = self.state.lock().await;
        let held = state.registry.get(index)?.utility_allocated();
        let amounts = state.gateway.amounts_out(held, path).await?;
        debug!(deal_index = %index, %held, "previewed swap");
        Ok(amounts)
    }

    /// Builds the settlement plan the deal would follow now, from live
    /// quotes and without custody checks.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` for an unknown deal, `GatewayFailure` if the venue
    /// cannot quote.
    pub async fn preview_settlement(&self, index: DealIndex) -> ApplicationResult<SettlementPlan> {
        let state = self.state.lock().await;
        let deal = state.registry.get(index)?;
        let gateway = state.gateway.as_ref();
        if deal.accepted() {
            Ok(SettlementPlan::Payout(
                plan_payout(gateway, &state.config, deal).await?,
            ))
        } else {
            Ok(SettlementPlan::Refund(
                plan_refund(gateway, &state.config, deal).await?,
            ))
        }
    }

    /// Custody balance of `asset`.
    pub async fn custody_balance(&self, asset: Asset) -> TokenAmount {
        self.state.lock().await.custody.balance(asset)
    }

    /// Total amount of `asset` custody has sent to `recipient`.
    pub async fn transferred_to(&self, recipient: Address, asset: Asset) -> TokenAmount {
        self.state.lock().await.custody.transferred_to(recipient, asset)
    }

    /// Event journal in emission order.
    pub async fn events(&self) -> Vec<EngineEvent> {
        self.state.lock().await.events.clone()
    }

    /// Removes and returns the journaled events, oldest first.
    pub async fn drain_events(&self) -> Vec<EngineEvent> {
        let drained = std::mem::take(&mut self.state.lock().await.events);
        debug!(count = drained.len(), "event journal drained");
        drained
    }

    /// Returns true while deal operations are paused.
    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.gate.is_paused()
    }

    /// Current configuration.
    pub async fn config(&self) -> EngineConfig {
        self.state.lock().await.config.clone()
    }

    /// Active logic version.
    pub async fn logic_version(&self) -> LogicVersion {
        self.state.lock().await.logic_version
    }

    /// Swap deadline offset in seconds.
    pub async fn swap_deadline(&self) -> u64 {
        self.state.lock().await.config.swap_deadline_secs
    }

    /// Swap slippage tolerance.
    pub async fn slippage_tolerance(&self) -> Percent {
        self.state.lock().await.config.slippage_tolerance
    }

    // ========== Custody ==========

    /// Records a token transfer into custody.
    ///
    /// # Errors
    ///
    /// Returns `Arithmetic` if the balance would overflow.
    pub async fn receive_deposit(
        &self,
        from: Address,
        asset: Asset,
        amount: TokenAmount,
    ) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.custody.deposit(asset, amount, from)?;
        debug!(from = ?from, %asset, %amount, "deposit received");
        Ok(())
    }

    /// Transfers the full stable custody balance to the owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `PendingSettlements` while any deal
    /// is eligible for settlement but unsettled.
    pub async fn withdraw_all_stable(&self, caller: Address) -> ApplicationResult<TokenAmount> {
        self.withdraw_all(caller, Asset::Stable).await
    }

    /// Transfers the full utility custody balance to the owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `PendingSettlements` while any deal
    /// is eligible for settlement but unsettled.
    pub async fn withdraw_all_utility(&self, caller: Address) -> ApplicationResult<TokenAmount> {
        self.withdraw_all(caller, Asset::Utility).await
    }

    async fn withdraw_all(&self, caller: Address, asset: Asset) -> ApplicationResult<TokenAmount> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Owner)?;
        let now = self.clock.now();

        let pending = state.registry.pending_eligible(now).count();
        if pending > 0 {
            warn!(%asset, pending, "withdrawal blocked by unsettled deals");
            return Err(ApplicationError::PendingSettlements { count: pending });
        }

        let amount = state.custody.balance(asset);
        let owner = state.gate.owner();
        let mut batch = TransferBatch::new();
        batch.debit(asset, amount, owner, TransferReason::Withdrawal);
        state.custody.commit(batch)?;
        state.record(AdminEvent::CustodyWithdrawn(CustodyWithdrawn::new(
            asset, amount, owner, now,
        )));

        info!(%asset, %amount, "custody withdrawn to owner");
        Ok(amount)
    }

    // ========== Administration ==========

    /// Pauses creation and the four lifecycle transitions.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Paused` if already paused.
    pub async fn pause(&self, caller: Address) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        state.gate.pause()?;
        let now = self.clock.now();
        state.record(AdminEvent::Paused(EnginePaused::new(caller, now)));
        info!(by = ?caller, "engine paused");
        Ok(())
    }

    /// Resumes deal operations.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Validation` if not paused.
    pub async fn unpause(&self, caller: Address) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        state.gate.unpause()?;
        let now = self.clock.now();
        state.record(AdminEvent::Unpaused(EngineUnpaused::new(caller, now)));
        info!(by = ?caller, "engine unpaused");
        Ok(())
    }

    /// Replaces the stable token.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Configuration` if it equals the
    /// utility token.
    pub async fn update_stable_token(&self, caller: Address, token: Address) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        state.update_config(|config| config.stable_token = token)?;
        self.record_config(&mut state, ConfigParameter::StableToken, format!("{token:?}"), caller);
        Ok(())
    }

    /// Replaces the utility token.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Configuration` if it equals the
    /// stable token.
    pub async fn update_utility_token(&self, caller: Address, token: Address) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        state.update_config(|config| config.utility_token = token)?;
        self.record_config(&mut state, ConfigParameter::UtilityToken, format!("{token:?}"), caller);
        Ok(())
    }

    /// Replaces the swap venue adapter and records its router address.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins.
    pub async fn update_swap_gateway(
        &self,
        caller: Address,
        gateway: Arc<dyn SwapGateway>,
    ) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        let router = gateway.router();
        state.update_config(|config| config.swap_router = router)?;
        state.gateway = gateway;
        self.record_config(&mut state, ConfigParameter::SwapRouter, format!("{router:?}"), caller);
        Ok(())
    }

    /// Sets the swap deadline offset.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Configuration` for zero.
    pub async fn update_swap_deadline(&self, caller: Address, secs: u64) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        state.update_config(|config| config.swap_deadline_secs = secs)?;
        self.record_config(&mut state, ConfigParameter::SwapDeadline, secs, caller);
        Ok(())
    }

    /// Sets the slippage tolerance in whole percent.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-admins, `Validation` above 100.
    pub async fn update_slippage_tolerance(&self, caller: Address, percent: u32) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Admin)?;
        let tolerance =
            Percent::new(percent).map_err(|e| ApplicationError::validation(e.to_string()))?;
        state.update_config(|config| config.slippage_tolerance = tolerance)?;
        self.record_config(&mut state, ConfigParameter::SlippageTolerance, tolerance, caller);
        Ok(())
    }

    fn record_config(
        &self,
        state: &mut EngineState,
        parameter: ConfigParameter,
        value: impl ToString,
        caller: Address,
    ) {
        let event = ConfigUpdated::new(parameter, value, caller, self.clock.now());
        info!(%parameter, value = %event.value, "configuration updated");
        state.record(AdminEvent::ConfigUpdated(event));
    }

    /// Grants admin to `account`. Returns false if it already held it.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners.
    pub async fn grant_admin(&self, caller: Address, account: Address) -> ApplicationResult<bool> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Owner)?;
        let granted = state.gate.grant_admin(account);
        if granted {
            let now = self.clock.now();
            state.record(AdminEvent::AdminGranted(AdminGranted::new(account, now)));
            info!(account = ?account, "admin granted");
        }
        Ok(granted)
    }

    /// Revokes admin from `account`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `Validation` for the owner or a
    /// non-admin.
    pub async fn revoke_admin(&self, caller: Address, account: Address) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Owner)?;
        state.gate.revoke_admin(account)?;
        let now = self.clock.now();
        state.record(AdminEvent::AdminRevoked(AdminRevoked::new(account, now)));
        info!(account = ?account, "admin revoked");
        Ok(())
    }

    /// Upgrades the operation set in place, keeping every deal, index,
    /// balance and setting.
    ///
    /// Upgrading to V2 reserves indices below [`V2_FIRST_INDEX`].
    ///
    /// # Errors
    ///
    /// `Unauthorized` for non-owners, `UnsupportedOperation` unless moving
    /// from V1 to V2.
    pub async fn upgrade(&self, caller: Address, target: LogicVersion) -> ApplicationResult<()> {
        let mut state = self.state.lock().await;
        state.gate.require(caller, Role::Owner)?;
        let from = state.logic_version;
        if !matches!((from, target), (LogicVersion::V1, LogicVersion::V2)) {
            return Err(ApplicationError::unsupported(format!(
                "cannot upgrade from {from} to {target}"
            )));
        }

        state.registry.reserve_until(V2_FIRST_INDEX);
        state.logic_version = target;
        let next_index = state.registry.next_index();
        let now = self.clock.now();
        state.record(AdminEvent::LogicUpgraded(LogicUpgraded::new(
            from, target, next_index, now,
        )));

        info!(%from, to = %target, next_index = %next_index, "logic upgraded");
        Ok(())
    }
}

fn deadline_after(config: &EngineConfig, now: Timestamp) -> ApplicationResult<Timestamp> {
    now.checked_add_secs(config.swap_deadline_secs)
        .ok_or_else(|| ApplicationError::configuration("swap deadline out of range"))
}

/// Utility tokens needed to realise `stable_target`; zero needs no quote.
async fn quote_required(
    gateway: &dyn SwapGateway,
    config: &EngineConfig,
    stable_target: TokenAmount,
) -> ApplicationResult<TokenAmount> {
    if stable_target.is_zero() {
        return Ok(TokenAmount::ZERO);
    }
    let required = gateway
        .quote_in(stable_target, &config.settlement_path()?)
        .await?;
    debug!(%stable_target, %required, "quoted settlement input");
    Ok(required)
}

async fn plan_payout(
    gateway: &dyn SwapGateway,
    config: &EngineConfig,
    deal: &Deal,
) -> ApplicationResult<PayoutPlan> {
    let commission = seller_commission(deal.price_amount(), deal.commission_basis_a())?;
    let required = quote_required(gateway, config, commission).await?;
    Ok(PayoutPlan::compute(
        commission,
        deal.utility_allocated(),
        required,
        deal.commission_basis_b(),
    )?)
}

async fn plan_refund(
    gateway: &dyn SwapGateway,
    config: &EngineConfig,
    deal: &Deal,
) -> ApplicationResult<RefundPlan> {
    let required = quote_required(gateway, config, deal.price_amount()).await?;
    Ok(RefundPlan::compute(
        deal.price_amount(),
        deal.utility_allocated(),
        required,
    ))
}

/// Sells `amount` utility for stable delivered to the payout relay and
/// returns the stable output.
async fn sell_utility(
    gateway: &dyn SwapGateway,
    config: &EngineConfig,
    amount: TokenAmount,
    now: Timestamp,
) -> ApplicationResult<TokenAmount> {
    if amount.is_zero() {
        return Ok(TokenAmount::ZERO);
    }
    let path = config.settlement_path()?;
    let quoted = gateway.quote_out(amount, &path).await?;
    let floor = min_amount_out(quoted, config.slippage_tolerance).map_err(DomainError::from)?;
    debug!(%amount, %quoted, min_out = %floor, "selling utility");

    let order = SwapOrder {
        amount_in: amount,
        min_amount_out: floor,
        path,
        recipient: config.payout_relay,
        deadline: deadline_after(config, now)?,
    };
    let receipt = gateway.swap_exact_in(&order).await?;
    Ok(receipt.amount_out)
}
