//! Crowdfund client — mirrors the authoritative state of a ledger-backed
//! crowdfunding registry into a local view model and mediates user-initiated
//! mutating operations against it.
//!
//! The registry itself (an append-only, event-emitting store with unbounded
//! write latency) is an external collaborator consumed through the
//! [`RemoteStore`] trait. This crate owns the consumer side:
//!
//! | Concern                  | Component                                    |
//! |--------------------------|----------------------------------------------|
//! | View model               | [`ViewState`] behind [`Shared`]              |
//! | Full-snapshot refresh    | [`Synchronizer`]                             |
//! | In-flight submissions    | [`TxTracker`]                                |
//! | Push notifications       | [`NotificationRouter`]                       |
//! | Identity / session       | [`SessionMonitor`]                           |
//! | Operation surface        | [`CrowdfundClient`]                          |
//!
//! Presentation layers read [`ViewState`] clones, watch the change signal,
//! and call the `submit_*` entry points; `last_error`/`last_success` are the
//! only signalling channel back.

mod client;
mod config;
mod errors;
mod router;
mod session;
mod store;
mod sync;
mod tracker;
mod types;


pub use client::CrowdfundClient;
pub use config::{Config, DEFAULT_CREATION_FEE_WEI};
pub use errors::{ClientError, Result};
pub use router::NotificationRouter;
pub use session::{SessionMonitor, SessionState};
pub use store::{EventKind, RemoteStore, StoreEvent};
pub use sync::Synchronizer;
pub use tracker::{OpKind, TxGuard, TxTracker};
pub use types::{
    Account, Campaign, CampaignId, CampaignRecord, ContractSnapshot, Shared, ViewState,
};
