//! Contract of the remote crowdfunding registry.
//!
//! The registry itself is an external collaborator — ledger-backed, append
//! only, with unbounded write latency — reached exclusively through
//! [`RemoteStore`]. Queries are side-effect free and may run concurrently;
//! mutations are side-effecting submissions that may still be rejected after
//! they are accepted for inclusion. Notifications arrive at-least-once and
//! carry opaque payloads used only as refresh triggers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::{Account, CampaignId, CampaignRecord};

// ─────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────

/// All recognised notification kinds emitted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new campaign was registered (`CampaignCreated`).
    Created,
    /// A contribution was made to a campaign (`PledgeMade`).
    ContributionMade,
    /// A live campaign was cancelled (`CampaignCancelled`).
    Cancelled,
    /// A campaign filled its last slot (`CampaignFulfilled`).
    Fulfilled,
    /// The store's owner changed (`OwnerChanged`).
    OwnerChanged,
    /// A campaign creator was banned (`EntrepreneurBanned`).
    CreatorBanned,
    /// The store was permanently destroyed (`ContractDestroyed`).
    Destroyed,
    /// The owner withdrew accumulated fees (`FundsWithdrawn`).
    FundsWithdrawn,
    /// An event from this store that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the registry's wire-level event name into an [`EventKind`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "CampaignCreated" => Self::Created,
            "PledgeMade" => Self::ContributionMade,
            "CampaignCancelled" => Self::Cancelled,
            "CampaignFulfilled" => Self::Fulfilled,
            "OwnerChanged" => Self::OwnerChanged,
            "EntrepreneurBanned" => Self::CreatorBanned,
            "ContractDestroyed" => Self::Destroyed,
            "FundsWithdrawn" => Self::FundsWithdrawn,
            _ => Self::Unknown,
        }
    }

    /// Short identifier suitable for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "campaign_created",
            Self::ContributionMade => "contribution_made",
            Self::Cancelled => "campaign_cancelled",
            Self::Fulfilled => "campaign_fulfilled",
            Self::OwnerChanged => "owner_changed",
            Self::CreatorBanned => "creator_banned",
            Self::Destroyed => "store_destroyed",
            Self::FundsWithdrawn => "funds_withdrawn",
            Self::Unknown => "unknown",
        }
    }
}

/// One push notification from the registry. The payload is observed in logs
/// but never used for incremental state surgery — every event triggers a
/// full refresh instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl StoreEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        StoreEvent { kind, payload }
    }

    /// Build an event from the registry's wire-level name.
    pub fn from_wire(name: &str, payload: Value) -> Self {
        StoreEvent {
            kind: EventKind::from_name(name),
            payload,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Store contract
// ─────────────────────────────────────────────────────────

/// Typed request/response and notification-subscription interface to the
/// authoritative registry.
///
/// Implementations wrap whatever transport reaches the ledger (JSON-RPC,
/// websocket provider, in-memory fake). A hung call is the implementation's
/// problem: this layer imposes no timeout and offers no mid-flight abort.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // ── Session ──────────────────────────────────────────

    /// Accounts already authorised for this session, current one first.
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// Ask the wallet to authorise a session. Fails with
    /// [`crate::ClientError::SessionRejected`] when the user declines.
    async fn request_session(&self) -> Result<Vec<Account>>;

    // ── Queries ──────────────────────────────────────────

    async fn is_destroyed(&self) -> Result<bool>;

    async fn owner(&self) -> Result<Account>;

    /// Store balance in wei.
    async fn balance(&self) -> Result<u128>;

    /// Fees reserved for fulfilled campaigns, in wei.
    async fn reserved_fees(&self) -> Result<u128>;

    async fn live_campaigns(&self) -> Result<Vec<CampaignRecord>>;

    async fn fulfilled_campaigns(&self) -> Result<Vec<CampaignRecord>>;

    async fn is_banned(&self, account: &Account) -> Result<bool>;

    /// How many contributions `account` holds on campaign `id`.
    async fn contribution_count(&self, id: CampaignId, account: &Account) -> Result<u64>;

    async fn title_exists(&self, title: &str) -> Result<bool>;

    // ── Mutations ────────────────────────────────────────

    async fn create_campaign(
        &self,
        from: &Account,
        title: &str,
        unit_price_wei: u128,
        slot_count: u64,
        fee_wei: u128,
    ) -> Result<()>;

    async fn contribute(&self, from: &Account, id: CampaignId, value_wei: u128) -> Result<()>;

    async fn cancel(&self, from: &Account, id: CampaignId) -> Result<()>;

    async fn withdraw(&self, from: &Account) -> Result<()>;

    async fn change_owner(&self, from: &Account, new_owner: &Account) -> Result<()>;

    async fn ban_creator(&self, from: &Account, target: &Account) -> Result<()>;

    async fn destroy_store(&self, from: &Account) -> Result<()>;

    // ── Notifications ────────────────────────────────────

    /// Open a fresh notification stream. Each call returns an independent
    /// receiver; dropping it releases the subscription.
    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<StoreEvent>;
}
