// Selection tracking - request tokens so stale responses are dropped
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Identity a fetch was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub vehicle_id: String,
    generation: u64,
}

#[derive(Debug, Default)]
struct Selection {
    vehicle_id: Option<String>,
    generation: u64,
}

/// Current vehicle selection. Every change bumps a generation counter, so a
/// token from an earlier selection of the same vehicle is also stale.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    inner: RwLock<Selection>,
}

impl SelectionTracker {
    pub fn select(&self, vehicle_id: &str) -> RequestToken {
        let mut selection = self.inner.write().unwrap_or_else(|e| e.into_inner());
        selection.generation += 1;
        selection.vehicle_id = Some(vehicle_id.to_string());
        tracing::debug!("Selected vehicle {} (generation {})", vehicle_id, selection.generation);

        RequestToken {
            vehicle_id: vehicle_id.to_string(),
            generation: selection.generation,
        }
    }

    pub fn clear(&self) {
        let mut selection = self.inner.write().unwrap_or_else(|e| e.into_inner());
        selection.generation += 1;
        selection.vehicle_id = None;
    }

    /// Token for a fetch against the current selection
    pub fn issue(&self) -> Option<RequestToken> {
        let selection = self.inner.read().unwrap_or_else(|e| e.into_inner());
        selection.vehicle_id.as_ref().map(|id| RequestToken {
            vehicle_id: id.clone(),
            generation: selection.generation,
        })
    }

    pub fn is_current(&self, token: &RequestToken) -> bool {
        let selection = self.inner.read().unwrap_or_else(|e| e.into_inner());
        selection.generation == token.generation
            && selection.vehicle_id.as_deref() == Some(token.vehicle_id.as_str())
    }

    /// Hand back `value` only if `token` still matches the selection
    pub fn accept<T>(&self, token: &RequestToken, value: T) -> Option<T> {
        if self.is_current(token) {
            Some(value)
        } else {
            tracing::debug!("Discarding stale result for vehicle {}", token.vehicle_id);
            None
        }
    }
}

/// Live-feed selections by client id, so a client can move its running feed
/// to another vehicle. Each client owns at most one active tracker.
#[derive(Debug, Default)]
pub struct SelectionRegistry {
    clients: Mutex<HashMap<String, Arc<SelectionTracker>>>,
}

impl SelectionRegistry {
    /// Fresh tracker for a new feed. A feed the client already had is
    /// cleared, which stops it and drops whatever it has in flight.
    pub fn attach(&self, client_id: &str, vehicle_id: &str) -> Arc<SelectionTracker> {
        let tracker = Arc::new(SelectionTracker::default());
        tracker.select(vehicle_id);

        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        clients.retain(|_, t| t.issue().is_some());
        if let Some(previous) = clients.insert(client_id.to_string(), tracker.clone()) {
            tracing::debug!("Replacing live feed for client {}", client_id);
            previous.clear();
        }
        tracker
    }

    /// Point the client's running feed at another vehicle. `None` when the
    /// client has no live feed.
    pub fn retarget(&self, client_id: &str, vehicle_id: &str) -> Option<RequestToken> {
        let clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        let tracker = clients.get(client_id).filter(|t| t.issue().is_some())?;
        Some(tracker.select(vehicle_id))
    }
}
