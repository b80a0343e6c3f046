//! Session worker that owns the authoritative [`WalletSession`] and
//! [`RunController`].
//!
//! Commands from [`crate::SessionHandle`] are handled without awaiting chain
//! calls. A wallet connect, stake or reward transfer is spawned as a task and
//! its result comes back through an internal channel, so frame ticks keep
//! flowing while a transaction confirms. At most one such operation is
//! outstanding; wallet notifications that arrive meanwhile are queued and
//! applied in order once it resolves.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use client_blockchain_core::{ConnectedAccount, TxHash};
use game_core::{
    Address, ChainId, CollisionKind, CountdownStep, DailyQuota, GameConfig, Notice,
    PendingReward, RewardPolicy, RunController, RunOutcome, RunState, TokenAmount,
    WalletSession,
};

use crate::api::{
    ClaimStatus, Result, RewardError, RuntimeError, SessionSnapshot, StakeError, WalletError,
};
use crate::events::{Event, EventBus, RewardEvent, RunEvent, WalletEvent};
use crate::repository::PersistentQuotaStore;
use crate::services::{BalanceQuery, RewardSettler, StakeGate, WalletConnector};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Commands that can be sent to the session worker
pub enum Command {
    ConnectWallet {
        reply: oneshot::Sender<std::result::Result<ConnectedAccount, WalletError>>,
    },
    RequestStart {
        reply: oneshot::Sender<std::result::Result<RunState, StakeError>>,
    },
    Tick {
        dt: Duration,
        reply: oneshot::Sender<RunState>,
    },
    Collision {
        kind: CollisionKind,
        reply: oneshot::Sender<Option<RunOutcome>>,
    },
    ClaimReward {
        reply: oneshot::Sender<std::result::Result<ClaimStatus, RewardError>>,
    },
    ResetRun {
        reply: oneshot::Sender<Result<RunState>>,
    },
    NetworkChanged {
        chain_id: ChainId,
    },
    AccountsChanged {
        account: Option<Address>,
    },
    RefreshBalance {
        reply: oneshot::Sender<Result<TokenAmount>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Results of spawned work, delivered back to the worker.
enum Internal {
    Connected(std::result::Result<ConnectedAccount, WalletError>),
    StakeResolved(std::result::Result<TxHash, StakeError>),
    RewardResolved(std::result::Result<TxHash, RewardError>),
    CountdownTick { generation: u64 },
}

/// Outstanding chain operation and whoever waits for it.
enum InFlight {
    Connect(oneshot::Sender<std::result::Result<ConnectedAccount, WalletError>>),
    Stake(oneshot::Sender<std::result::Result<RunState, StakeError>>),
    Reward(Option<oneshot::Sender<std::result::Result<ClaimStatus, RewardError>>>),
}

struct PendingOp {
    waiter: InFlight,
    task: JoinHandle<()>,
}

/// Wallet notifications held back while an operation is outstanding.
enum Deferred {
    NetworkChanged(ChainId),
    AccountsChanged(Option<Address>),
}

/// Collaborators the worker drives.
pub(crate) struct SessionServices {
    pub connector: WalletConnector,
    pub gate: StakeGate,
    pub settler: RewardSettler,
    pub balance: BalanceQuery,
    pub quota: PersistentQuotaStore,
}

/// Background task that serializes every session mutation.
pub struct SessionWorker {
    game: GameConfig,
    network_name: String,
    required_chain: ChainId,
    wallet: WalletSession,
    controller: RunController,
    reward: Option<PendingReward>,
    services: SessionServices,
    events: EventBus,
    command_rx: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    pending: Option<PendingOp>,
    deferred: VecDeque<Deferred>,
    countdown: Option<JoinHandle<()>>,
    /// An auto-transfer reward is waiting for the outstanding operation.
    settle_when_idle: bool,
}

impl SessionWorker {
    pub(crate) fn new(
        game: GameConfig,
        network_name: String,
        required_chain: ChainId,
        seed: u64,
        services: SessionServices,
        command_rx: mpsc::Receiver<Command>,
        events: EventBus,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let controller = RunController::new(&game, seed);

        info!(
            max_plays = game.max_plays_per_day,
            policy = %game.reward_policy,
            "SessionWorker initialized"
        );

        Self {
            game,
            network_name,
            required_chain,
            wallet: WalletSession::empty(),
            controller,
            reward: None,
            services,
            events,
            command_rx,
            internal_tx,
            internal_rx,
            pending: None,
            deferred: VecDeque::new(),
            countdown: None,
            settle_when_idle: false,
        }
    }

    /// Main worker loop. Ends when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(msg) = self.internal_rx.recv() => self.handle_internal(msg),
            }
        }
        self.teardown();
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::ConnectWallet { reply } => self.connect_wallet(reply),
            Command::RequestStart { reply } => self.request_start(reply),
            Command::Tick { dt, reply } => {
                let state = self.on_tick(dt);
                if reply.send(state).is_err() {
                    debug!("Tick reply channel closed (caller dropped)");
                }
            }
            Command::Collision { kind, reply } => {
                let outcome = self.on_collision(kind);
                if reply.send(outcome).is_err() {
                    debug!("Collision reply channel closed (caller dropped)");
                }
            }
            Command::ClaimReward { reply } => self.claim_reward(reply),
            Command::ResetRun { reply } => {
                let result = self.reset_run();
                if reply.send(result).is_err() {
                    debug!("ResetRun reply channel closed (caller dropped)");
                }
            }
            Command::NetworkChanged { chain_id } => {
                self.defer_or_apply(Deferred::NetworkChanged(chain_id))
            }
            Command::AccountsChanged { account } => {
                self.defer_or_apply(Deferred::AccountsChanged(account))
            }
            Command::RefreshBalance { reply } => self.refresh_balance(Some(reply)),
            Command::Snapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_internal(&mut self, msg: Internal) {
        match msg {
            Internal::Connected(result) => self.on_connected(result),
            Internal::StakeResolved(result) => self.on_stake_resolved(result),
            Internal::RewardResolved(result) => self.on_reward_resolved(result),
            Internal::CountdownTick { generation } => self.on_countdown_tick(generation),
        }
        if self.pending.is_none() {
            self.drain_deferred();
            if std::mem::take(&mut self.settle_when_idle) {
                self.settle_queued_reward();
            }
        }
    }

    // ------------------------------------------------------------------
    // Wallet
    // ------------------------------------------------------------------

    fn connect_wallet(
        &mut self,
        reply: oneshot::Sender<std::result::Result<ConnectedAccount, WalletError>>,
    ) {
        if self.pending.is_some() {
            let busy = WalletError::Unavailable(StakeError::OperationInProgress.to_string());
            let _ = reply.send(Err(busy));
            return;
        }

        let connector = self.services.connector.clone();
        let internal_tx = self.internal_tx.clone();
        let task = tokio::spawn(async move {
            let result = connector.connect().await;
            let _ = internal_tx.send(Internal::Connected(result));
        });
        self.pending = Some(PendingOp {
            waiter: InFlight::Connect(reply),
            task,
        });
    }

    fn on_connected(&mut self, result: std::result::Result<ConnectedAccount, WalletError>) {
        let Some(PendingOp {
            waiter: InFlight::Connect(reply),
            ..
        }) = self.pending.take()
        else {
            warn!("wallet connect resolved with no connect outstanding");
            return;
        };

        match &result {
            Ok(account) => {
                info!(address = %account.address, chain = %account.chain_id, "wallet connected");
                self.wallet = WalletSession::connected(account.address, account.chain_id);
                self.events.publish(Event::Wallet(WalletEvent::Connected {
                    address: account.address,
                    chain_id: account.chain_id,
                }));
                if let Some(quota) = self.quota_today() {
                    self.events.notice(Notice::PlaysLeft(
                        quota.remaining(self.game.max_plays_per_day),
                    ));
                }
                self.refresh_balance(None);
            }
            Err(err) => {
                warn!("wallet connect failed: {}", err);
                self.events.notice(match err {
                    WalletError::NotFound => Notice::WalletNotFound,
                    _ => Notice::WalletConnectionFailed,
                });
            }
        }

        if reply.send(result).is_err() {
            debug!("ConnectWallet reply channel closed (caller dropped)");
        }
    }

    fn defer_or_apply(&mut self, event: Deferred) {
        if self.pending.is_some() {
            debug!("chain operation outstanding, queueing wallet notification");
            self.deferred.push_back(event);
        } else {
            self.apply(event);
        }
    }

    fn drain_deferred(&mut self) {
        while let Some(event) = self.deferred.pop_front() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: Deferred) {
        match event {
            Deferred::NetworkChanged(chain_id) => self.apply_network_change(chain_id),
            Deferred::AccountsChanged(account) => self.apply_account_change(account),
        }
    }

    fn apply_network_change(&mut self, chain_id: ChainId) {
        if !self.wallet.connected {
            debug!(chain = %chain_id, "network change ignored, wallet not connected");
            return;
        }
        self.wallet.chain_id = Some(chain_id);
        let on_required = chain_id == self.required_chain;
        self.events.publish(Event::Wallet(WalletEvent::NetworkChanged {
            chain_id,
            on_required,
        }));
        if on_required {
            self.refresh_balance(None);
        } else {
            warn!(chain = %chain_id, "wallet left the required network");
            self.events.notice(Notice::SwitchNetwork {
                network: self.network_name.clone(),
            });
        }
    }

    fn apply_account_change(&mut self, account: Option<Address>) {
        match account {
            None => {
                info!("wallet disconnected");
                self.wallet.clear();
                if let Some(reward) = self.reward.take_if(|reward| !reward.settled) {
                    warn!(recipient = %reward.recipient, "abandoning unsettled reward");
                }
                self.events.publish(Event::Wallet(WalletEvent::Disconnected));
            }
            Some(address) if self.wallet.connected => {
                if self.wallet.address == Some(address) {
                    return;
                }
                info!(%address, "wallet account changed");
                self.wallet.address = Some(address);
                if let Some(chain_id) = self.wallet.chain_id {
                    self.events
                        .publish(Event::Wallet(WalletEvent::Connected { address, chain_id }));
                }
                self.refresh_balance(None);
            }
            Some(address) => debug!(%address, "account change ignored, wallet not connected"),
        }
    }

    fn refresh_balance(&mut self, reply: Option<oneshot::Sender<Result<TokenAmount>>>) {
        let Some(address) = self.wallet.active_address() else {
            if let Some(reply) = reply {
                let _ = reply.send(Err(RuntimeError::NotConnected));
            }
            return;
        };
        let balance = self.services.balance.clone();
        tokio::spawn(async move {
            let result = balance.refresh(address).await;
            if let Some(reply) = reply {
                let _ = reply.send(result.map_err(RuntimeError::Balance));
            }
        });
    }

    // ------------------------------------------------------------------
    // Stake and countdown
    // ------------------------------------------------------------------

    fn request_start(&mut self, reply: oneshot::Sender<std::result::Result<RunState, StakeError>>) {
        let checked = if self.pending.is_some() || self.controller.state().is_in_progress() {
            Err(StakeError::OperationInProgress)
        } else {
            self.services.gate.preflight(&self.wallet)
        };

        let payer = match checked.and_then(|payer| {
            self.controller
                .begin_stake()
                .map(|_| payer)
                .map_err(|_| StakeError::OperationInProgress)
        }) {
            Ok(payer) => payer,
            Err(err) => {
                self.reject_stake(&err);
                let _ = reply.send(Err(err));
                return;
            }
        };

        info!(%payer, "collecting stake");
        let gate = self.services.gate.clone();
        let internal_tx = self.internal_tx.clone();
        let task = tokio::spawn(async move {
            let result = gate.collect(payer).await;
            let _ = internal_tx.send(Internal::StakeResolved(result));
        });
        self.pending = Some(PendingOp {
            waiter: InFlight::Stake(reply),
            task,
        });
    }

    fn on_stake_resolved(&mut self, result: std::result::Result<TxHash, StakeError>) {
        let Some(PendingOp {
            waiter: InFlight::Stake(reply),
            ..
        }) = self.pending.take()
        else {
            warn!("stake resolved with no stake outstanding");
            return;
        };

        let result = result.and_then(|tx| {
            let state = self
                .controller
                .stake_confirmed()
                .map_err(|err| StakeError::TransferFailed(err.to_string()))?;
            self.events
                .publish(Event::Run(RunEvent::StakeConfirmed { tx }));
            self.events.notice(Notice::StakeSuccessful);
            match state {
                RunState::Countdown(seconds) => {
                    self.events
                        .publish(Event::Run(RunEvent::CountdownTick(seconds)));
                    self.start_countdown(seconds);
                }
                _ => self.events.publish(Event::Run(RunEvent::Started)),
            }
            Ok(state)
        });

        match &result {
            Ok(_) => self.refresh_balance(None),
            Err(err) => {
                self.controller.abort_stake();
                self.reject_stake(err);
            }
        }

        if reply.send(result).is_err() {
            debug!("RequestStart reply channel closed (caller dropped)");
        }
    }

    fn reject_stake(&self, err: &StakeError) {
        warn!("stake rejected: {}", err);
        self.events.notice(match err {
            StakeError::QuotaExhausted => Notice::NoPlaysLeft,
            StakeError::WalletNotConnected => Notice::ConnectWalletFirst,
            StakeError::WrongNetwork => Notice::SwitchNetwork {
                network: self.network_name.clone(),
            },
            StakeError::InsufficientBalance => self.services.gate.insufficient_balance_notice(),
            StakeError::OperationInProgress => Notice::OperationInProgress,
            other => Notice::StakeFailed {
                reason: other.to_string(),
            },
        });
    }

    fn start_countdown(&mut self, seconds: u32) {
        self.cancel_countdown();
        let generation = self.controller.generation();
        let internal_tx = self.internal_tx.clone();
        self.countdown = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + COUNTDOWN_STEP;
            let mut interval = tokio::time::interval_at(start, COUNTDOWN_STEP);
            for _ in 0..seconds {
                interval.tick().await;
                if internal_tx
                    .send(Internal::CountdownTick { generation })
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    fn cancel_countdown(&mut self) {
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
    }

    fn on_countdown_tick(&mut self, generation: u64) {
        match self.controller.countdown_tick(generation) {
            CountdownStep::Stale => debug!(generation, "dropping stale countdown tick"),
            CountdownStep::Remaining(seconds) => {
                self.events
                    .publish(Event::Run(RunEvent::CountdownTick(seconds)));
            }
            CountdownStep::Started => {
                self.countdown = None;
                info!("run started");
                self.events.publish(Event::Run(RunEvent::Started));
            }
        }
    }

    // ------------------------------------------------------------------
    // Active run
    // ------------------------------------------------------------------

    fn on_tick(&mut self, dt: Duration) -> RunState {
        if let Some(report) = self.controller.tick(dt)
            && !report.is_empty()
        {
            self.events.publish(Event::Run(RunEvent::ObstaclesUpdated {
                spawned: report.spawned,
                removed: report.removed,
            }));
        }
        self.controller.state()
    }

    fn on_collision(&mut self, kind: CollisionKind) -> Option<RunOutcome> {
        let outcome = self.controller.on_collision(kind)?;
        self.cancel_countdown();

        let quota = match self.services.quota.increment() {
            Ok(quota) => Some(quota),
            Err(err) => {
                tracing::error!("failed to record play: {}", err);
                None
            }
        };
        let max_plays = self.game.max_plays_per_day;
        info!(
            %outcome,
            plays_used = quota.map(|q| q.plays_used),
            play_time_ms = self.controller.play_time().as_millis() as u64,
            "run concluded"
        );
        if let Some(quota) = quota {
            self.events
                .publish(Event::Run(RunEvent::Concluded { outcome, quota }));
        }
        let exhausted = quota.is_none_or(|quota| quota.is_exhausted(max_plays));

        match outcome {
            RunOutcome::Lost => {
                self.events.notice(Notice::RunLost);
                if exhausted {
                    self.events.notice(Notice::NoPlaysLeft);
                } else if self.controller.reset().is_ok() {
                    self.events.publish(Event::Run(RunEvent::Reset));
                    if let Some(quota) = quota {
                        self.events
                            .notice(Notice::PlaysLeft(quota.remaining(max_plays)));
                    }
                }
            }
            RunOutcome::Won => self.award(),
        }
        Some(outcome)
    }

    fn award(&mut self) {
        let Some(recipient) = self.wallet.active_address() else {
            warn!("run won without a connected wallet");
            self.events
                .publish(Event::Reward(RewardEvent::Failed(RewardError::NoWallet.to_string())));
            self.events.notice(Notice::RewardFailed {
                reason: RewardError::NoWallet.to_string(),
            });
            return;
        };

        let amount = self.game.reward_amount;
        let reward = match self.reward.take() {
            Some(mut owed) if !owed.settled && owed.recipient == recipient => {
                owed.amount = owed.amount.checked_add(amount).unwrap_or(owed.amount);
                owed
            }
            _ => PendingReward::new(recipient, amount),
        };
        self.reward = Some(reward.clone());

        match self.game.reward_policy {
            RewardPolicy::AutoTransfer if self.pending.is_none() => self.start_settlement(None),
            RewardPolicy::AutoTransfer => {
                debug!("reward settlement queued behind outstanding operation");
                self.settle_when_idle = true;
                self.events.publish(Event::Reward(RewardEvent::Pending(reward)));
            }
            RewardPolicy::ClaimGated => {
                self.events.publish(Event::Reward(RewardEvent::Pending(reward)));
                self.events.notice(Notice::RewardClaimable {
                    amount: self.game.reward_label(),
                });
            }
        }
    }

    /// Starts the auto-transfer held back by [`Self::award`], unless the
    /// wallet moved on or a claim already paid it.
    fn settle_queued_reward(&mut self) {
        let recipient = self.wallet.active_address();
        let owed = self
            .reward
            .as_ref()
            .is_some_and(|reward| !reward.settled && Some(reward.recipient) == recipient);
        if owed {
            self.start_settlement(None);
        } else {
            debug!("queued reward settlement dropped");
        }
    }

    fn claim_reward(
        &mut self,
        reply: oneshot::Sender<std::result::Result<ClaimStatus, RewardError>>,
    ) {
        let status = match (&self.reward, &self.pending) {
            (None, _) => Some(ClaimStatus::NothingToClaim),
            (Some(reward), _) if reward.settled => Some(ClaimStatus::AlreadySettled {
                tx: reward.settlement_tx.clone().map(TxHash),
            }),
            (
                Some(_),
                Some(PendingOp {
                    waiter: InFlight::Reward(_),
                    ..
                }),
            ) => Some(ClaimStatus::InFlight),
            (Some(_), Some(_)) => Some(ClaimStatus::Busy),
            (Some(_), None) => None,
        };

        match status {
            Some(status) => {
                let _ = reply.send(Ok(status));
            }
            None => self.start_settlement(Some(reply)),
        }
    }

    fn start_settlement(
        &mut self,
        reply: Option<oneshot::Sender<std::result::Result<ClaimStatus, RewardError>>>,
    ) {
        let Some(reward) = self.reward.clone() else {
            return;
        };
        info!(recipient = %reward.recipient, amount = reward.amount.units(), "settling reward");
        let settler = self.services.settler.clone();
        let internal_tx = self.internal_tx.clone();
        let task = tokio::spawn(async move {
            let result = settler.settle(&reward).await;
            let _ = internal_tx.send(Internal::RewardResolved(result));
        });
        self.pending = Some(PendingOp {
            waiter: InFlight::Reward(reply),
            task,
        });
    }

    fn on_reward_resolved(&mut self, result: std::result::Result<TxHash, RewardError>) {
        let Some(PendingOp {
            waiter: InFlight::Reward(reply),
            ..
        }) = self.pending.take()
        else {
            warn!("reward resolved with no settlement outstanding");
            return;
        };

        let result = match result {
            Ok(tx) => {
                if let Some(reward) = self.reward.as_mut() {
                    reward.settle(tx.as_str());
                } else {
                    warn!(%tx, "reward settled after it was abandoned");
                }
                self.events
                    .publish(Event::Reward(RewardEvent::Settled { tx: tx.clone() }));
                self.events.notice(Notice::RewardReceived {
                    amount: self.game.reward_label(),
                });
                self.refresh_balance(None);
                Ok(ClaimStatus::Settled { tx })
            }
            Err(err) => {
                warn!("reward settlement failed: {}", err);
                self.events
                    .publish(Event::Reward(RewardEvent::Failed(err.to_string())));
                self.events.notice(Notice::RewardFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        };

        if let Some(reply) = reply
            && reply.send(result).is_err()
        {
            debug!("ClaimReward reply channel closed (caller dropped)");
        }
    }

    fn reset_run(&mut self) -> Result<RunState> {
        let was = self.controller.state();
        self.controller.reset()?;
        if was != RunState::Idle {
            self.cancel_countdown();
            self.events.publish(Event::Run(RunEvent::Reset));
        }
        Ok(self.controller.state())
    }

    // ------------------------------------------------------------------
    // Queries and teardown
    // ------------------------------------------------------------------

    fn quota_today(&self) -> Option<DailyQuota> {
        self.services
            .quota
            .today()
            .inspect_err(|err| tracing::error!("failed to read play quota: {}", err))
            .ok()
    }

    fn snapshot(&self) -> SessionSnapshot {
        let quota = self.quota_today();
        SessionSnapshot {
            wallet: self.wallet.clone(),
            run: self.controller.state(),
            quota,
            plays_remaining: quota
                .map(|quota| quota.remaining(self.game.max_plays_per_day))
                .unwrap_or(0),
            reward: self.reward.clone(),
            obstacles: self.controller.obstacles().to_vec(),
            busy: self.pending.is_some(),
        }
    }

    fn teardown(&mut self) {
        self.cancel_countdown();
        if let Some(op) = self.pending.take() {
            op.task.abort();
        }
        if self.controller.state().is_in_progress() {
            self.controller.abandon();
        }
        if let Some(reward) = self.reward.take_if(|reward| !reward.settled) {
            warn!(recipient = %reward.recipient, "session closed with unsettled reward");
        }
        debug!("SessionWorker stopped");
    }
}
