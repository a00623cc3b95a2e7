//! Synchronizer — pulls one full consistent snapshot from the remote store
//! and publishes it into the view state.
//!
//! ## Refresh discipline
//!
//! * The destroyed flag is queried first; a destroyed store short-circuits
//!   the rest of the pull, since further queries are meaningless.
//! * Per-campaign contribution counts fan out concurrently and are joined
//!   before publishing; one failed lookup fails the whole refresh.
//! * The snapshot is published in a single view-state update — readers never
//!   observe a torn snapshot. On failure the prior snapshot is kept.
//! * Interleaved refreshes settle last-write-wins: each refresh takes a
//!   sequence number at start and only publishes over a lower one. Session
//!   teardown invalidates every sequence taken so far, so a pull that was
//!   already in flight when the session ended can never publish over the
//!   reset, and a pull taken for a superseded account is discarded too.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::future::{try_join, try_join_all};
use tracing::{debug, warn};

use crate::errors::{ClientError, Result};
use crate::store::RemoteStore;
use crate::types::{Account, Campaign, CampaignRecord, ContractSnapshot, Shared, ViewState};

pub struct Synchronizer {
    store: Arc<dyn RemoteStore>,
    shared: Arc<Shared>,
}

enum Pull {
    Destroyed,
    Snapshot(ContractSnapshot),
}

impl Synchronizer {
    pub fn new(store: Arc<dyn RemoteStore>, shared: Arc<Shared>) -> Self {
        Synchronizer { store, shared }
    }

    /// Re-synchronize the view state with the authoritative store.
    ///
    /// Failures are absorbed into `last_error` (the prior snapshot stays in
    /// place) and additionally returned so programmatic callers can react;
    /// nothing propagates past this boundary by panic.
    pub async fn refresh(&self) -> Result<()> {
        let account = self.shared.peek(|view| view.account.clone());
        let Some(account) = account else {
            self.shared.update(|view| {
                view.connected = false;
                view.last_error = Some(ClientError::NoAccount.to_string());
            });
            return Err(ClientError::NoAccount);
        };

        let seq = self.shared.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.update(|view| {
            view.loading = true;
            view.last_error = None;
        });

        let outcome = self.pull(&account).await;

        match outcome {
            Ok(Pull::Destroyed) => {
                self.shared.update(|view| {
                    view.loading = false;
                    if self.is_stale(seq, &account, view) {
                        return;
                    }
                    debug!("store reports destroyed; leaving remaining fields stale");
                    self.shared.published_seq.store(seq, Ordering::SeqCst);
                    view.destroyed = true;
                    if let Some(snapshot) = &mut view.snapshot {
                        snapshot.destroyed = true;
                    }
                    view.last_error = Some(ClientError::StoreDestroyed.to_string());
                });
                Ok(())
            }
            Ok(Pull::Snapshot(snapshot)) => {
                self.shared.update(|view| {
                    view.loading = false;
                    if self.is_stale(seq, &account, view) {
                        return;
                    }
                    self.shared.published_seq.store(seq, Ordering::SeqCst);
                    debug!(
                        live = snapshot.live.len(),
                        fulfilled = snapshot.fulfilled.len(),
                        "snapshot published"
                    );
                    view.snapshot = Some(snapshot);
                    view.connected = true;
                });
                Ok(())
            }
            Err(e) => {
                warn!("refresh failed: {e}");
                self.shared.update(|view| {
                    view.loading = false;
                    if self.is_stale(seq, &account, view) {
                        return;
                    }
                    view.last_error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    /// True when this refresh lost the race: a newer refresh (or a session
    /// teardown, which invalidates every in-flight pull) already claimed the
    /// sequence, or the account the pull was taken for is no longer active.
    /// A stale result is dropped whole rather than merged.
    fn is_stale(&self, seq: u64, account: &Account, view: &ViewState) -> bool {
        let published = self.shared.published_seq.load(Ordering::SeqCst);
        if seq <= published {
            debug!(seq, published, "stale refresh result discarded");
            return true;
        }
        if view.account.as_ref() != Some(account) {
            debug!(%account, "refresh result for a superseded account discarded");
            return true;
        }
        false
    }

    /// Fetch everything one snapshot needs. No view-state writes in here.
    async fn pull(&self, account: &Account) -> Result<Pull> {
        if self.store.is_destroyed().await? {
            return Ok(Pull::Destroyed);
        }

        let owner = self.store.owner().await?;
        let balance_wei = self.store.balance().await?;
        let reserved_fees_wei = self.store.reserved_fees().await?;
        let live = self.store.live_campaigns().await?;
        let fulfilled = self.store.fulfilled_campaigns().await?;
        let current_account_banned = self.store.is_banned(account).await?;

        // Fan out the per-campaign contribution lookups across both lists,
        // join before publishing.
        let (live, fulfilled) = try_join(
            self.join_contributions(live, account),
            self.join_contributions(fulfilled, account),
        )
        .await?;

        Ok(Pull::Snapshot(ContractSnapshot {
            owner,
            balance_wei,
            reserved_fees_wei,
            destroyed: false,
            live,
            fulfilled,
            current_account_banned,
        }))
    }

    async fn join_contributions(
        &self,
        records: Vec<CampaignRecord>,
        account: &Account,
    ) -> Result<Vec<Campaign>> {
        let counts = try_join_all(
            records
                .iter()
                .map(|record| self.store.contribution_count(record.id, account)),
        )
        .await?;

        Ok(records
            .into_iter()
            .zip(counts)
            .map(|(record, count)| Campaign::from_record(record, count))
            .collect())
    }
}
