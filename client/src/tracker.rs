//! Per-campaign in-flight operation tracking.
//!
//! A marker keyed by `(campaign, kind)` is set before a mutating submission
//! goes out and cleared when it settles, whatever the outcome. The guard is
//! purely advisory — the registry remains the source of truth on duplicate
//! submissions — but it stops redundant network submissions and drives the
//! disabled state of presentation affordances.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CampaignId, Shared};

/// Kind of mutating operation tracked per campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Contribute,
    Cancel,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contribute => "contribute",
            Self::Cancel => "cancel",
        }
    }
}

/// Advisory busy-guard over the `(campaign, kind)` marker set.
///
/// The marker set lives inside the view state so presentation reads it like
/// any other field; a `begin`/`end` that actually changes the set emits one
/// change signal, a refused or redundant one emits none.
#[derive(Clone)]
pub struct TxTracker {
    shared: Arc<Shared>,
}

impl TxTracker {
    pub fn new(shared: Arc<Shared>) -> Self {
        TxTracker { shared }
    }

    /// Set the marker for `(id, kind)`. Returns `false` — and leaves state
    /// untouched, watchers unsignalled — when a marker for that key already
    /// exists.
    pub fn begin(&self, id: CampaignId, kind: OpKind) -> bool {
        self.shared
            .update_if(|view| view.in_flight.insert((id, kind)))
    }

    /// Clear the marker unconditionally. Idempotent.
    pub fn end(&self, id: CampaignId, kind: OpKind) {
        self.shared
            .update_if(|view| view.in_flight.remove(&(id, kind)));
    }

    pub fn is_in_flight(&self, id: CampaignId, kind: OpKind) -> bool {
        self.shared.peek(|view| view.is_in_flight(id, kind))
    }

    /// `begin` wrapped in a scope guard: the marker is released when the
    /// returned guard drops, on every exit path of the submission.
    pub fn acquire(&self, id: CampaignId, kind: OpKind) -> Option<TxGuard> {
        if !self.begin(id, kind) {
            debug!(campaign = %id, kind = kind.as_str(), "submission refused: already in flight");
            return None;
        }
        Some(TxGuard {
            tracker: self.clone(),
            id,
            kind,
        })
    }
}

/// Releases its `(campaign, kind)` marker on drop.
pub struct TxGuard {
    tracker: TxTracker,
    id: CampaignId,
    kind: OpKind,
}

impl Drop for TxGuard {
    fn drop(&mut self) {
        self.tracker.end(self.id, self.kind);
    }
}
