// src/pipeline/cache.rs

//! Shared domain list cache.
//!
//! Holds the last discovery result so a freshly opened list can render
//! before its own network pass completes. Every write or invalidation
//! bumps a generation counter; a pass only publishes its result if no
//! newer write happened while it was in flight.

use tokio::sync::RwLock;

use crate::models::{Domain, DomainSnapshot};

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    snapshot: Option<DomainSnapshot>,
}

/// Process-wide domain cache, shared through an `Arc`.
#[derive(Debug, Default)]
pub struct DomainCache {
    state: RwLock<CacheState>,
}

impl DomainCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-filled from a stored snapshot.
    pub fn with_snapshot(snapshot: DomainSnapshot) -> Self {
        Self {
            state: RwLock::new(CacheState {
                generation: 0,
                snapshot: Some(snapshot),
            }),
        }
    }

    /// Current snapshot, if any pass has completed.
    pub async fn snapshot(&self) -> Option<DomainSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// Cached domains, empty when nothing is cached.
    pub async fn domains(&self) -> Vec<Domain> {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .map(|s| s.domains.clone())
            .unwrap_or_default()
    }

    /// Generation to hand to `store_if_current` when a pass starts.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Replace the snapshot if nothing was written since `generation`.
    ///
    /// Returns false when the result is stale and was dropped.
    pub async fn store_if_current(&self, generation: u64, domains: Vec<Domain>) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        state.generation += 1;
        state.snapshot = Some(DomainSnapshot::new(domains));
        true
    }

    /// Drop the snapshot and reject results of passes already in flight.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.snapshot = None;
    }
}
