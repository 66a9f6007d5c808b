//! Per-case indicator cache with optimistic remote mutations
//!
//! The [`IndicatorStore`] owns the authoritative in-memory view of the
//! active case's indicators, split into positive and negative partitions.
//! Mutations apply locally first, then persist remotely; the failure policy
//! differs by operation:
//!
//! - `add`: rolled back on remote failure
//! - `update` / `remove`: local state kept, failure surfaced (user-visible
//!   edits are not silently discarded; divergence resolves on the next
//!   `load`)
//!
//! Cache state lives behind one `std::sync::Mutex` that is never held
//! across an await; remote calls happen between lock scopes, which is what
//! makes the optimistic window observable and the rollback explicit.

use crate::error::StoreError;
use casewell_domain::traits::{CaseStore, IdentityProvider};
use casewell_domain::{CaseId, Indicator, IndicatorDraft, IndicatorId, IndicatorKind, IndicatorPatch};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CacheState {
    case_id: Option<CaseId>,
    positive: Vec<Indicator>,
    negative: Vec<Indicator>,
}

impl CacheState {
    fn partition_mut(&mut self, kind: IndicatorKind) -> &mut Vec<Indicator> {
        match kind {
            IndicatorKind::Positive => &mut self.positive,
            IndicatorKind::Negative => &mut self.negative,
        }
    }

    /// Remove by id from whichever partition holds it
    fn take(&mut self, id: IndicatorId) -> Option<Indicator> {
        for partition in [&mut self.positive, &mut self.negative] {
            if let Some(pos) = partition.iter().position(|i| i.id == id) {
                return Some(partition.remove(pos));
            }
        }
        None
    }
}

/// Authoritative per-case cache of indicators
pub struct IndicatorStore<S, I>
where
    S: CaseStore,
    I: IdentityProvider,
{
    store: Arc<S>,
    identity: Arc<I>,
    state: Mutex<CacheState>,
    // Monotonic token: a load started later always wins over one that
    // resolves later.
    load_token: AtomicU64,
}

impl<S, I> IndicatorStore<S, I>
where
    S: CaseStore,
    I: IdentityProvider,
{
    /// Create an empty cache over the given collaborators
    pub fn new(store: Arc<S>, identity: Arc<I>) -> Self {
        Self {
            store,
            identity,
            state: Mutex::new(CacheState::default()),
            load_token: AtomicU64::new(0),
        }
    }

    /// The case the cache is currently scoped to
    pub fn active_case(&self) -> Option<CaseId> {
        self.lock().case_id
    }

    /// Scope the cache to `case_id`, purging indicators from any other case
    pub fn attach(&self, case_id: CaseId) {
        let mut state = self.lock();
        if state.case_id != Some(case_id) {
            state.positive.clear();
            state.negative.clear();
            state.case_id = Some(case_id);
        }
    }

    /// Detach from the active case and drop all cached indicators
    pub fn clear(&self) {
        let mut state = self.lock();
        state.case_id = None;
        state.positive.clear();
        state.negative.clear();
    }

    /// Fetch all indicators for `case_id` and replace the cache wholesale
    ///
    /// At most one load is authoritative at a time: a load started while
    /// another is pending supersedes it, and the earlier response is
    /// discarded when it finally arrives. On failure the cache is left
    /// unchanged - there is no partial replace.
    pub async fn load(&self, case_id: CaseId) -> Result<(), StoreError> {
        let token = self.load_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.attach(case_id);

        let fetched = self
            .store
            .list_indicators(case_id)
            .await
            .map_err(|e| StoreError::RemoteUnavailable(e.to_string()))?;

        let mut state = self.lock();
        if self.load_token.load(Ordering::SeqCst) != token {
            debug!(%case_id, "discarding superseded indicator load");
            return Ok(());
        }
        if state.case_id != Some(case_id) {
            debug!(%case_id, "case changed during load, discarding result");
            return Ok(());
        }

        let (positive, negative): (Vec<_>, Vec<_>) = fetched
            .into_iter()
            .partition(|i| i.kind == IndicatorKind::Positive);
        info!(
            %case_id,
            positive = positive.len(),
            negative = negative.len(),
            "indicator cache replaced"
        );
        state.positive = positive;
        state.negative = negative;
        Ok(())
    }

    /// Optimistically add an indicator to the active case
    ///
    /// Inserts into the matching partition immediately, then persists. On
    /// remote success the locally generated id is reconciled with the
    /// store-assigned one; on remote failure the optimistic entry is rolled
    /// back and the failure surfaces.
    pub async fn add(&self, draft: IndicatorDraft) -> Result<Indicator, StoreError> {
        self.require_identity()?;
        if draft.text.trim().is_empty() {
            return Err(StoreError::ValidationFailed(
                "indicator text is empty".to_string(),
            ));
        }
        let case_id = self.require_case()?;

        let indicator = Indicator::from_draft(case_id, draft);
        let local_id = indicator.id;
        {
            let mut state = self.lock();
            // Cache order is created_at descending, so new entries go first.
            state.partition_mut(indicator.kind).insert(0, indicator.clone());
        }

        match self.store.create_indicator(&indicator).await {
            Ok(remote_id) => {
                let mut state = self.lock();
                if let Some(entry) = state
                    .partition_mut(indicator.kind)
                    .iter_mut()
                    .find(|i| i.id == local_id)
                {
                    entry.id = remote_id;
                    let reconciled = entry.clone();
                    debug!(%local_id, %remote_id, "indicator persisted");
                    Ok(reconciled)
                } else {
                    // Evicted while the create was in flight (case switch).
                    Ok(indicator)
                }
            }
            Err(e) => {
                let mut state = self.lock();
                state.take(local_id);
                warn!(%local_id, error = %e, "indicator create failed, rolled back");
                Err(StoreError::RemoteUnavailable(e.to_string()))
            }
        }
    }

    /// Apply a partial update to a cached indicator, then persist
    ///
    /// The local value is kept even when the remote write fails; the error
    /// is surfaced so the caller can tell the user, and the divergence is
    /// resolved by the next full `load`.
    pub async fn update(&self, id: IndicatorId, patch: IndicatorPatch) -> Result<(), StoreError> {
        self.require_identity()?;
        let case_id = self.require_case()?;

        {
            let mut state = self.lock();
            let mut entry = state
                .take(id)
                .ok_or_else(|| StoreError::NotFound(format!("indicator {}", id)))?;
            patch.apply(&mut entry);
            // Kind may have changed; reinsert into the partition that now
            // matches.
            state.partition_mut(entry.kind).insert(0, entry);
        }

        if let Err(e) = self.store.update_indicator(case_id, id, &patch).await {
            warn!(%id, error = %e, "indicator update not persisted, local edit kept");
            return Err(StoreError::RemoteUnavailable(e.to_string()));
        }
        Ok(())
    }

    /// Remove a cached indicator, then delete it remotely
    ///
    /// Same keep-on-failure policy as `update`: the local removal stands
    /// even when the remote delete fails.
    pub async fn remove(&self, id: IndicatorId) -> Result<(), StoreError> {
        self.require_identity()?;
        let case_id = self.require_case()?;

        {
            let mut state = self.lock();
            state
                .take(id)
                .ok_or_else(|| StoreError::NotFound(format!("indicator {}", id)))?;
        }

        if let Err(e) = self.store.delete_indicator(case_id, id).await {
            warn!(%id, error = %e, "indicator delete not persisted, local removal kept");
            return Err(StoreError::RemoteUnavailable(e.to_string()));
        }
        Ok(())
    }

    /// Snapshot of one partition; no I/O, never fails
    pub fn get_by_kind(&self, kind: IndicatorKind) -> Vec<Indicator> {
        let state = self.lock();
        match kind {
            IndicatorKind::Positive => state.positive.clone(),
            IndicatorKind::Negative => state.negative.clone(),
        }
    }

    /// Snapshot of both partitions at one instant
    pub fn snapshot(&self) -> (Vec<Indicator>, Vec<Indicator>) {
        let state = self.lock();
        (state.positive.clone(), state.negative.clone())
    }

    /// Replace both partitions wholesale in one step
    ///
    /// Used after a narrative submission re-derives the complete indicator
    /// picture; observers never see one partition updated without the
    /// other.
    pub fn replace(&self, positive: Vec<Indicator>, negative: Vec<Indicator>) {
        let mut state = self.lock();
        state.positive = positive;
        state.negative = negative;
    }

    fn require_identity(&self) -> Result<(), StoreError> {
        if self.identity.current_user().is_none() {
            return Err(StoreError::PreconditionFailed(
                "no authenticated identity".to_string(),
            ));
        }
        Ok(())
    }

    fn require_case(&self) -> Result<CaseId, StoreError> {
        self.lock().case_id.ok_or_else(|| {
            StoreError::PreconditionFailed("no active case".to_string())
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // Cache lock is never held across an await, so poisoning can only
        // come from a panic in a pure section.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
