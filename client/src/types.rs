//! View-model types — the single mutable snapshot everything the
//! presentation layer reads, plus the shared handle that guards it.
//!
//! `ViewState` is single-writer: only the synchronizer, the transaction
//! tracker, and the session handlers mutate it, always through [`Shared`],
//! which emits exactly one change signal per completed update.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::tracker::OpKind;

// ─────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────

/// A wallet account. Identity is case-insensitive, so the raw string is
/// normalised to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
#[serde(into = "String")]
pub struct Account(String);

impl Account {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Account(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Account {
    fn from(raw: String) -> Self {
        Account::new(raw)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque campaign identifier handed out by the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CampaignId(pub u64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────
// Campaigns
// ─────────────────────────────────────────────────────────

/// A campaign exactly as the store returns it, before the per-session join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: CampaignId,
    pub creator: Account,
    /// Globally unique across the store, case-sensitive.
    pub title: String,
    /// Price of one contribution, in the native currency's smallest unit.
    pub unit_price_wei: u128,
    pub backers_count: u64,
    /// Meaningful only while the campaign is live.
    pub remaining_slots: u64,
}

/// A campaign joined with the current account's own contribution count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub creator: Account,
    pub title: String,
    pub unit_price_wei: u128,
    pub backers_count: u64,
    pub remaining_slots: u64,
    /// How many contributions the current account holds on this campaign.
    pub own_contributions: u64,
}

impl Campaign {
    pub fn from_record(record: CampaignRecord, own_contributions: u64) -> Self {
        Campaign {
            id: record.id,
            creator: record.creator,
            title: record.title,
            unit_price_wei: record.unit_price_wei,
            backers_count: record.backers_count,
            remaining_slots: record.remaining_slots,
            own_contributions,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Snapshot & view state
// ─────────────────────────────────────────────────────────

/// One complete, internally consistent pull of remote store state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub owner: Account,
    pub balance_wei: u128,
    pub reserved_fees_wei: u128,
    pub destroyed: bool,
    pub live: Vec<Campaign>,
    pub fulfilled: Vec<Campaign>,
    pub current_account_banned: bool,
}

/// Everything the presentation layer reads.
///
/// `snapshot == None` means no synchronization has completed yet. `destroyed`
/// is a sticky observation: once set it stays set until the session is torn
/// down by a network change, and every mutating entry point short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub account: Option<Account>,
    pub snapshot: Option<ContractSnapshot>,
    pub in_flight: HashSet<(CampaignId, OpKind)>,
    pub loading: bool,
    pub destroyed: bool,
    pub connected: bool,
    pub last_error: Option<String>,
    pub last_success: Option<String>,
}

impl ViewState {
    /// True while an operation of `kind` is pending on `id`. Presentation
    /// uses this to disable the matching affordance.
    pub fn is_in_flight(&self, id: CampaignId, kind: OpKind) -> bool {
        self.in_flight.contains(&(id, kind))
    }
}

// ─────────────────────────────────────────────────────────
// Shared handle
// ─────────────────────────────────────────────────────────

/// Owner of the view state. Updates go through [`Shared::update`], which
/// holds the lock for the duration of the closure (never across an await)
/// and emits one change signal when the closure returns.
pub struct Shared {
    view: Mutex<ViewState>,
    changed: watch::Sender<u64>,
    /// Monotonic refresh sequence — incremented when a refresh begins.
    pub(crate) refresh_seq: AtomicU64,
    /// Sequence of the refresh whose snapshot was last published.
    pub(crate) published_seq: AtomicU64,
}

impl Shared {
    pub fn new() -> Self {
        let (changed, _) = watch::channel(0);
        Shared {
            view: Mutex::new(ViewState::default()),
            changed,
            refresh_seq: AtomicU64::new(0),
            published_seq: AtomicU64::new(0),
        }
    }

    /// Clone the current view state for a reader.
    pub fn read(&self) -> ViewState {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read a projection of the view state without signalling a change.
    pub(crate) fn peek<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        let view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&view)
    }

    /// Apply one discrete update and signal watchers once.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut view);
        drop(view);
        self.changed.send_modify(|v| *v += 1);
        out
    }

    /// Like [`Shared::update`], but the closure reports whether it changed
    /// anything; watchers are signalled only when it did.
    pub(crate) fn update_if(&self, f: impl FnOnce(&mut ViewState) -> bool) -> bool {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = f(&mut view);
        drop(view);
        if changed {
            self.changed.send_modify(|v| *v += 1);
        }
        changed
    }

    /// Discard the result of every refresh currently in flight: its pull
    /// belongs to a session being torn down and must not publish. Callers
    /// invoke this from inside the same update closure that resets the view,
    /// so the invalidation and the reset land in one critical section.
    pub(crate) fn discard_in_flight_refreshes(&self) {
        self.published_seq
            .store(self.refresh_seq.load(Ordering::SeqCst), Ordering::SeqCst);
    }

    /// Receiver that ticks once per completed view-state update.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }
}

impl Default for Shared {
    fn default() -> Self {
        Shared::new()
    }
}
