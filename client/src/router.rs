//! Notification router — drains the registry's push stream and turns every
//! burst of notifications into a full refresh.
//!
//! Payloads are logged but never applied incrementally: partial application
//! of remote events risks divergence from authoritative state, so the policy
//! is full-refresh-on-any-event. The drain loop serializes refreshes, which
//! coalesces a burst of N queued notifications into fewer than N pulls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::ClientError;
use crate::store::{EventKind, RemoteStore, StoreEvent};
use crate::sync::Synchronizer;
use crate::types::Shared;

pub struct NotificationRouter {
    store: Arc<dyn RemoteStore>,
    sync: Arc<Synchronizer>,
    shared: Arc<Shared>,
    subscribed: Arc<AtomicBool>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl NotificationRouter {
    pub fn new(store: Arc<dyn RemoteStore>, sync: Arc<Synchronizer>, shared: Arc<Shared>) -> Self {
        NotificationRouter {
            store,
            sync,
            shared,
            subscribed: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(None),
        }
    }

    /// Subscribe and spawn the drain task. Exactly one subscription exists
    /// per session: repeated calls while one is active are no-ops, so a
    /// reconnect cannot accumulate duplicate refresh streams.
    pub fn start(&self) {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            debug!("notification subscription already active");
            return;
        }

        let token = CancellationToken::new();
        *self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let rx = self.store.subscribe_events();
        info!("notification subscription established");
        tokio::spawn(Self::run(
            rx,
            token,
            self.sync.clone(),
            self.shared.clone(),
            self.subscribed.clone(),
        ));
    }

    /// Cancel the drain task and release the subscription. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
        self.subscribed.store(false, Ordering::SeqCst);
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    async fn run(
        mut rx: mpsc::UnboundedReceiver<StoreEvent>,
        token: CancellationToken,
        sync: Arc<Synchronizer>,
        shared: Arc<Shared>,
        subscribed: Arc<AtomicBool>,
    ) {
        loop {
            let first = tokio::select! {
                _ = token.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    // Stream closed by the store side.
                    None => break,
                },
            };

            // Drain whatever else already arrived so a burst becomes one
            // refresh instead of N.
            let mut batch = vec![first];
            while let Ok(event) = rx.try_recv() {
                batch.push(event);
            }

            for event in &batch {
                debug!(kind = event.kind.as_str(), payload = %event.payload, "store notification");
                if event.kind == EventKind::Destroyed {
                    // Disable mutating affordances right away instead of
                    // waiting on the refresh round-trip.
                    shared.update(|view| {
                        view.destroyed = true;
                        if let Some(snapshot) = &mut view.snapshot {
                            snapshot.destroyed = true;
                        }
                        view.last_error = Some(ClientError::StoreDestroyed.to_string());
                    });
                }
            }

            // Outcome already recorded in the view state by the synchronizer.
            let _ = sync.refresh().await;
        }

        // Only clear the flag when the stream itself closed; on an explicit
        // stop() the flag is already cleared and a new session may have
        // re-subscribed in the meantime.
        if !token.is_cancelled() {
            subscribed.store(false, Ordering::SeqCst);
        }
        debug!("notification router stopped");
    }
}
