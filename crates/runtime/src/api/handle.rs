//! Cloneable façade for issuing commands to the session.
//!
//! [`SessionHandle`] is the only entry point the UI layer needs: user
//! gestures, frame ticks, collision reports and wallet notifications go in,
//! replies and topic events come out.
use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use client_blockchain_core::ConnectedAccount;
use game_core::{Address, ChainId, CollisionKind, RunOutcome, RunState, TokenAmount};

use super::errors::{Result, RuntimeError};
use super::types::{ClaimStatus, SessionSnapshot};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Connect the wallet, switching it to the required network if needed.
    pub async fn connect_wallet(&self) -> Result<ConnectedAccount> {
        let result = self
            .request(|reply| Command::ConnectWallet { reply })
            .await?;
        Ok(result?)
    }

    /// Pay the stake and start the countdown.
    ///
    /// Resolves once the stake transaction is confirmed, with the state the
    /// run entered. A call made while another chain operation is outstanding
    /// fails immediately with `StakeError::OperationInProgress`.
    pub async fn request_start(&self) -> Result<RunState> {
        let result = self.request(|reply| Command::RequestStart { reply }).await?;
        Ok(result?)
    }

    /// Advance one rendered frame.
    pub async fn on_tick(&self, dt: Duration) -> Result<RunState> {
        self.request(|reply| Command::Tick { dt, reply }).await
    }

    /// Report that the player overlapped an obstacle or the lighthouse.
    ///
    /// Returns the outcome if this report concluded the run; repeated
    /// reports afterwards return `None`.
    pub async fn on_collision(&self, kind: CollisionKind) -> Result<Option<RunOutcome>> {
        self.request(|reply| Command::Collision { kind, reply }).await
    }

    /// Pay out the pending reward. Repeated claims never send twice.
    pub async fn claim_reward(&self) -> Result<ClaimStatus> {
        let result = self.request(|reply| Command::ClaimReward { reply }).await?;
        Ok(result?)
    }

    /// Return a concluded run to idle.
    pub async fn reset_run(&self) -> Result<RunState> {
        self.request(|reply| Command::ResetRun { reply }).await?
    }

    /// The wallet switched networks.
    pub async fn on_network_changed(&self, chain_id: ChainId) -> Result<()> {
        self.send(Command::NetworkChanged { chain_id }).await
    }

    /// The wallet's selected account changed; `None` means it disconnected.
    pub async fn on_accounts_changed(&self, account: Option<Address>) -> Result<()> {
        self.send(Command::AccountsChanged { account }).await
    }

    /// Query the stake asset balance of the connected wallet.
    pub async fn refresh_balance(&self) -> Result<TokenAmount> {
        self.request(|reply| Command::RefreshBalance { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut notices = handle.subscribe(Topic::Notice);
    /// while let Ok(event) = notices.recv().await {
    ///     // Show the status line
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(command(reply_tx)).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
