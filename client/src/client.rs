//! `CrowdfundClient` — the operation surface exposed to presentation.
//!
//! Every mutating entry point follows the same lifecycle: check the sticky
//! destroyed flag and the active account, mark the operation in flight where
//! it is keyed by campaign, submit to the store, release the marker however
//! the submission settles, then re-pull a full snapshot. `last_error` and
//! `last_success` are the only signalling channel back to presentation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{ClientError, Result};
use crate::router::NotificationRouter;
use crate::session::{SessionMonitor, SessionState};
use crate::store::RemoteStore;
use crate::sync::Synchronizer;
use crate::tracker::{OpKind, TxTracker};
use crate::types::{Account, CampaignId, Shared, ViewState};

pub struct CrowdfundClient {
    store: Arc<dyn RemoteStore>,
    config: Config,
    shared: Arc<Shared>,
    sync: Arc<Synchronizer>,
    tracker: TxTracker,
    router: NotificationRouter,
    session: SessionMonitor,
}

impl CrowdfundClient {
    pub fn new(store: Arc<dyn RemoteStore>, config: Config) -> Self {
        let shared = Arc::new(Shared::new());
        let sync = Arc::new(Synchronizer::new(store.clone(), shared.clone()));
        let tracker = TxTracker::new(shared.clone());
        let router = NotificationRouter::new(store.clone(), sync.clone(), shared.clone());

        CrowdfundClient {
            store,
            config,
            shared,
            sync,
            tracker,
            router,
            session: SessionMonitor::new(),
        }
    }

    // ─────────────────────────────────────────────────────
    // Read surface
    // ─────────────────────────────────────────────────────

    /// Clone of the current view state. Presentation reads this, never
    /// mutates it.
    pub fn view(&self) -> ViewState {
        self.shared.read()
    }

    /// Ticks once per completed view-state update.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.shared.subscribe_changes()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    // ─────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────

    /// Ask the wallet for a session, adopt the first returned account, and
    /// run the initial synchronization. The notification subscription is
    /// established here, exactly once per session.
    pub async fn connect_session(&self) -> Result<()> {
        self.shared.update(|view| {
            view.loading = true;
            view.last_error = None;
            view.last_success = None;
        });

        match self.store.request_session().await {
            Ok(accounts) => {
                let Some(account) = accounts.into_iter().next() else {
                    self.session.mark_disconnected();
                    self.shared.update(|view| {
                        view.loading = false;
                        view.connected = false;
                        view.last_error = Some(ClientError::NoAccount.to_string());
                    });
                    return Err(ClientError::NoAccount);
                };

                info!(%account, store = %self.config.store_address, chain = self.config.chain_id, "session connected");
                self.shared.update(|view| {
                    view.account = Some(account);
                    view.connected = true;
                });
                self.session.mark_connected();
                self.router.start();

                let _ = self.sync.refresh().await;
                self.shared.update(|view| view.loading = false);
                Ok(())
            }
            Err(e) => {
                self.session.mark_disconnected();
                self.shared.update(|view| view.connected = false);
                self.surface(e)
            }
        }
    }

    /// Adopt an already-authorized account without prompting the wallet.
    ///
    /// Startup path for a returning visitor with a standing authorization;
    /// when no account is authorized the client simply stays disconnected,
    /// with nothing recorded in `last_error`. [`Self::connect_session`]
    /// remains the explicit, prompting path. Returns whether a session was
    /// resumed.
    pub async fn resume_session(&self) -> Result<bool> {
        match self.store.accounts().await {
            Ok(accounts) => {
                let Some(account) = accounts.into_iter().next() else {
                    debug!("no authorized account; staying disconnected");
                    return Ok(false);
                };

                info!(%account, "session resumed without prompt");
                self.shared.update(|view| {
                    view.account = Some(account);
                    view.connected = true;
                });
                self.session.mark_connected();
                self.router.start();

                let _ = self.sync.refresh().await;
                Ok(true)
            }
            Err(e) => self.surface(e),
        }
    }

    /// Wallet signal: the active account changed.
    ///
    /// A new non-empty account keeps the session alive and re-synchronizes;
    /// an empty one disconnects, keeps the stale snapshot for display, and
    /// releases the notification subscription.
    pub async fn handle_account_changed(&self, account: Option<Account>) {
        match account {
            Some(account) => {
                info!(%account, "active account changed");
                self.shared.update(|view| {
                    view.account = Some(account);
                    view.connected = true;
                    view.last_error = None;
                    view.last_success = None;
                });
                self.session.mark_connected();
                let _ = self.sync.refresh().await;
            }
            None => {
                self.session.mark_disconnected();
                self.router.stop();
                self.shared.update(|view| {
                    // Invalidated under the same lock as the reset, so a
                    // pull already in flight cannot publish over it.
                    self.shared.discard_in_flight_refreshes();
                    view.account = None;
                    view.connected = false;
                    view.loading = false;
                    view.last_error =
                        Some("Session disconnected. Please connect an account.".to_string());
                });
            }
        }
    }

    /// Wallet signal: the active network changed. Hard discontinuity — all
    /// cached state is discarded and the embedder must bootstrap a fresh
    /// session.
    pub fn handle_network_changed(&self) {
        info!("network changed; discarding session state");
        self.router.stop();
        self.session.mark_disconnected();
        self.shared.update(|view| {
            self.shared.discard_in_flight_refreshes();
            *view = ViewState::default();
            view.last_error =
                Some("Network changed. Restart the session to continue.".to_string());
        });
    }

    // ─────────────────────────────────────────────────────
    // Synchronization
    // ─────────────────────────────────────────────────────

    pub async fn refresh(&self) -> Result<()> {
        self.sync.refresh().await
    }

    // ─────────────────────────────────────────────────────
    // Mutating operations
    // ─────────────────────────────────────────────────────

    /// Create a new campaign, paying the configured creation fee.
    ///
    /// The title is pre-checked against the store; a taken title fails with
    /// [`ClientError::DuplicateTitle`] before any mutation is issued.
    pub async fn submit_create(
        &self,
        title: &str,
        unit_price_wei: u128,
        slot_count: u64,
    ) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };
        self.begin_loading();

        let result = self
            .create_checked(&account, title, unit_price_wei, slot_count)
            .await;
        self.settle(result, "Campaign created successfully!").await
    }

    async fn create_checked(
        &self,
        account: &Account,
        title: &str,
        unit_price_wei: u128,
        slot_count: u64,
    ) -> Result<()> {
        if self.store.title_exists(title).await? {
            return Err(ClientError::DuplicateTitle(title.to_string()));
        }
        self.store
            .create_campaign(
                account,
                title,
                unit_price_wei,
                slot_count,
                self.config.creation_fee_wei,
            )
            .await
    }

    /// Contribute one slot to a live campaign, paying its unit price.
    pub async fn submit_contribute(&self, id: CampaignId) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };

        let unit_price = self.shared.peek(|view| {
            view.snapshot.as_ref().and_then(|snapshot| {
                snapshot
                    .live
                    .iter()
                    .find(|campaign| campaign.id == id)
                    .map(|campaign| campaign.unit_price_wei)
            })
        });
        let Some(unit_price) = unit_price else {
            return self.surface(ClientError::RemoteCallFailed(format!(
                "campaign {id} is not in the live set"
            )));
        };

        let Some(guard) = self.tracker.acquire(id, OpKind::Contribute) else {
            return Err(ClientError::AlreadyInFlight);
        };
        self.clear_messages();

        let result = self.store.contribute(&account, id, unit_price).await;
        // Marker released before the follow-up refresh publishes.
        drop(guard);
        self.settle(result, "Contribution successful!").await
    }

    /// Cancel a live campaign (creator or store owner only, enforced
    /// store-side).
    pub async fn submit_cancel(&self, id: CampaignId) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };

        let Some(guard) = self.tracker.acquire(id, OpKind::Cancel) else {
            return Err(ClientError::AlreadyInFlight);
        };
        self.clear_messages();

        let result = self.store.cancel(&account, id).await;
        drop(guard);
        self.settle(result, "Campaign cancelled successfully!").await
    }

    /// Withdraw accumulated fees to the store owner.
    pub async fn submit_withdraw(&self) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };
        self.begin_loading();

        let result = self.store.withdraw(&account).await;
        self.settle(result, "Funds withdrawn successfully!").await
    }

    /// Hand store ownership to another account.
    pub async fn submit_change_owner(&self, new_owner: Account) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };
        self.begin_loading();

        let result = self.store.change_owner(&account, &new_owner).await;
        self.settle(result, "Owner changed successfully!").await
    }

    /// Ban a campaign creator.
    pub async fn submit_ban(&self, target: Account) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };
        self.begin_loading();

        let result = self.store.ban_creator(&account, &target).await;
        self.settle(result, "Creator banned successfully!").await
    }

    /// Permanently destroy the store. On success the destroyed flag is set
    /// synchronously, before any refresh completes, so mutating affordances
    /// disable without waiting on network latency.
    pub async fn submit_destroy(&self) -> Result<()> {
        let account = match self.ready_account() {
            Ok(account) => account,
            Err(e) => return self.surface(e),
        };
        self.begin_loading();

        let result = self.store.destroy_store(&account).await;
        if result.is_ok() {
            self.shared.update(|view| {
                view.destroyed = true;
                if let Some(snapshot) = &mut view.snapshot {
                    snapshot.destroyed = true;
                }
            });
        }
        self.settle(result, "Store destroyed successfully!").await
    }

    // ─────────────────────────────────────────────────────
    // Shared submission plumbing
    // ─────────────────────────────────────────────────────

    /// Account to submit from, or the error that blocks every mutation.
    fn ready_account(&self) -> Result<Account> {
        self.shared.peek(|view| {
            if view.destroyed {
                return Err(ClientError::StoreDestroyed);
            }
            view.account.clone().ok_or(ClientError::NoAccount)
        })
    }

    fn begin_loading(&self) {
        self.shared.update(|view| {
            view.loading = true;
            view.last_error = None;
            view.last_success = None;
        });
    }

    fn clear_messages(&self) {
        self.shared.update(|view| {
            view.last_error = None;
            view.last_success = None;
        });
    }

    /// Record how a submission settled and re-synchronize on success.
    async fn settle(&self, result: Result<()>, success: &str) -> Result<()> {
        match result {
            Ok(()) => {
                self.shared.update(|view| {
                    view.loading = false;
                    view.last_success = Some(success.to_string());
                });
                let _ = self.sync.refresh().await;
                Ok(())
            }
            Err(e) => self.surface(e),
        }
    }

    /// Surface a failure through `last_error` — except a user-declined
    /// request, which is an expected action and stays out of the view.
    fn surface<T>(&self, e: ClientError) -> Result<T> {
        match &e {
            ClientError::SessionRejected => {
                debug!("user rejected the request");
                self.shared.update(|view| view.loading = false);
            }
            other => {
                let message = other.to_string();
                self.shared.update(|view| {
                    view.loading = false;
                    view.last_error = Some(message);
                });
            }
        }
        Err(e)
    }
}
