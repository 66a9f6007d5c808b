//! The per-session controller
//!
//! One [`CaseSession`] is constructed per signed-in (or anonymous) session,
//! with its collaborators injected. It owns the chat timeline and the case
//! list, scopes the indicator cache to the active case, and serializes
//! narrative submission through a single `Submitting` flag so two
//! extractions can never race writes into the same timeline.

use crate::config::{SessionConfig, TITLE_MAX_CHARS};
use crate::error::SessionError;
use casewell_domain::indicator::clamp_scale;
use casewell_domain::prognosis;
use casewell_domain::traits::{AnalysisClient, CaseStore, ExtractedIndicator, IdentityProvider};
use casewell_domain::{
    Case, CaseId, CasePatch, Indicator, IndicatorDraft, IndicatorKind, IndicatorReport, Message,
    PrognosisResult, Sender, UserIdentity,
};
use casewell_notify::Notifier;
use casewell_store::{IndicatorStore, PagedFeed};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// User-facing text of the error message appended when extraction fails
pub const SUBMIT_FAILURE_NOTICE: &str =
    "Failed to analyze the narrative. Please try again.";

/// Source label stamped on indicators derived by the analysis service
const ANALYSIS_SOURCE: &str = "analysis";

#[derive(Debug, Default)]
struct SessionState {
    current_case: Option<Case>,
    cases: Vec<Case>,
    timeline: Vec<Message>,
    submitting: bool,
    generating_sample: bool,
}

impl SessionState {
    /// Append preserving the timeline's non-decreasing timestamp order
    fn push_message(&mut self, mut message: Message) -> Message {
        if let Some(last) = self.timeline.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.timeline.push(message.clone());
        message
    }
}

/// Clears a state-machine flag when dropped, so no failure path can leave
/// the session stuck in `Submitting` or `GeneratingSample`.
struct FlagGuard<'a> {
    state: &'a Mutex<SessionState>,
    clear: fn(&mut SessionState),
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (self.clear)(&mut state);
    }
}

/// Top-level orchestrator for one case-management session
pub struct CaseSession<S, A, I>
where
    S: CaseStore,
    A: AnalysisClient,
    I: IdentityProvider,
{
    store: Arc<S>,
    analysis: Arc<A>,
    identity: Arc<I>,
    indicators: IndicatorStore<S, I>,
    cases_feed: PagedFeed,
    messages_feed: PagedFeed,
    notifier: Notifier,
    state: Mutex<SessionState>,
}

impl<S, A, I> CaseSession<S, A, I>
where
    S: CaseStore,
    A: AnalysisClient,
    I: IdentityProvider,
{
    /// Create a session with default configuration
    pub fn new(store: Arc<S>, analysis: Arc<A>, identity: Arc<I>) -> Self {
        Self::with_config(store, analysis, identity, SessionConfig::default())
    }

    /// Create a session with explicit configuration
    pub fn with_config(
        store: Arc<S>,
        analysis: Arc<A>,
        identity: Arc<I>,
        config: SessionConfig,
    ) -> Self {
        let indicators = IndicatorStore::new(Arc::clone(&store), Arc::clone(&identity));
        Self {
            store,
            analysis,
            identity,
            indicators,
            cases_feed: PagedFeed::new(config.page_size),
            messages_feed: PagedFeed::new(config.page_size),
            notifier: Notifier::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    // --- snapshots (no I/O, never fail) ---

    /// The chat timeline of the active case, oldest first
    pub fn timeline(&self) -> Vec<Message> {
        self.lock().timeline.clone()
    }

    /// The cached case list, newest first
    pub fn cases(&self) -> Vec<Case> {
        self.lock().cases.clone()
    }

    /// The active case, if any
    pub fn current_case(&self) -> Option<Case> {
        self.lock().current_case.clone()
    }

    /// Whether a narrative submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    /// Whether a sample narrative is being generated
    pub fn is_generating_sample(&self) -> bool {
        self.lock().generating_sample
    }

    /// The per-case indicator cache
    pub fn indicators(&self) -> &IndicatorStore<S, I> {
        &self.indicators
    }

    /// The session's notification queue, for the UI to render
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // --- narrative submission ---

    /// Submit a narrative for indicator extraction
    ///
    /// Appends the user's message optimistically, calls the analysis
    /// service, and on success appends a system message with the structured
    /// indicators and replaces both indicator partitions wholesale. On
    /// extraction failure an error message is appended instead and the
    /// indicator cache is left untouched.
    ///
    /// A blank narrative is rejected with `ValidationFailed`; a call while
    /// another submission is in flight is ignored (the timeline is not
    /// touched).
    pub async fn submit_narrative(&self, text: &str) -> Result<(), SessionError> {
        let narrative = text.trim();
        if narrative.is_empty() {
            return Err(SessionError::ValidationFailed(
                "narrative is empty".to_string(),
            ));
        }

        {
            let mut state = self.lock();
            if state.submitting {
                debug!("submission already in flight, ignoring");
                return Ok(());
            }
            if state.generating_sample {
                return Err(SessionError::Busy("sample generation"));
            }
            state.submitting = true;
        }
        let _guard = FlagGuard {
            state: &self.state,
            clear: |s| s.submitting = false,
        };

        let user = self.identity.current_user();
        let case = self.ensure_case(user.as_ref(), narrative).await;
        let sender = match &user {
            Some(u) => Sender::User(u.uid.clone()),
            None => Sender::Anonymous,
        };

        let user_message = {
            let mut state = self.lock();
            state.push_message(Message::user(case.id, narrative, sender))
        };
        self.persist_message(&user_message, user.is_some()).await;

        info!(case_id = %case.id, chars = narrative.len(), "submitting narrative");

        match self.analysis.extract(narrative).await {
            Ok(outcome) => {
                let positive =
                    materialize(case.id, IndicatorKind::Positive, outcome.positive_indicators);
                let negative =
                    materialize(case.id, IndicatorKind::Negative, outcome.negative_indicators);

                let result = match outcome.overall_prognosis {
                    Some(p) => match p.score {
                        Some(score) => PrognosisResult {
                            score: clamp_scale(score),
                            assessment: p.assessment,
                        },
                        None => prognosis::score(&positive, &negative)
                            .with_assessment(p.assessment),
                    },
                    None => prognosis::score(&positive, &negative),
                };

                info!(
                    positive = positive.len(),
                    negative = negative.len(),
                    score = result.score,
                    "extraction complete"
                );

                let content = format!(
                    "Identified {} positive and {} negative indicators. Prognosis: {}.",
                    positive.len(),
                    negative.len(),
                    result.assessment
                );
                let system_message = {
                    let mut state = self.lock();
                    // The user may have selected another case while the
                    // extraction was in flight; its result belongs to the
                    // old case and must not leak into the new timeline or
                    // indicator cache.
                    if state.current_case.as_ref().map(|c| c.id) != Some(case.id) {
                        debug!(case_id = %case.id, "case changed during submission, discarding result");
                        return Ok(());
                    }
                    state.push_message(Message::report(
                        case.id,
                        content,
                        IndicatorReport {
                            positive: positive.clone(),
                            negative: negative.clone(),
                            prognosis: Some(result),
                        },
                    ))
                };

                // Each submission re-derives the complete indicator picture:
                // full replace, never a merge, and both partitions swap in
                // one step.
                self.indicators.attach(case.id);
                self.indicators.replace(positive, negative);

                self.persist_message(&system_message, user.is_some()).await;
                self.notifier.success("Narrative analyzed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "extraction failed");
                {
                    let mut state = self.lock();
                    if state.current_case.as_ref().map(|c| c.id) == Some(case.id) {
                        state.push_message(Message::failure(case.id, SUBMIT_FAILURE_NOTICE));
                    }
                }
                self.notifier.error(SUBMIT_FAILURE_NOTICE);
                Err(SessionError::ExtractionFailed(e.to_string()))
            }
        }
    }

    /// Fetch a sample narrative for prefilling the input
    ///
    /// Mutually exclusive with narrative submission; the timeline is never
    /// touched, and a failure surfaces to the caller.
    pub async fn generate_sample_narrative(&self) -> Result<String, SessionError> {
        {
            let mut state = self.lock();
            if state.submitting {
                return Err(SessionError::Busy("narrative submission"));
            }
            if state.generating_sample {
                return Err(SessionError::Busy("sample generation"));
            }
            state.generating_sample = true;
        }
        let _guard = FlagGuard {
            state: &self.state,
            clear: |s| s.generating_sample = false,
        };

        self.analysis
            .generate_sample()
            .await
            .map_err(|e| SessionError::ExtractionFailed(e.to_string()))
    }

    // --- case management ---

    /// Make `case_id` the active case and load its history
    ///
    /// The previous case's timeline is cleared before the new history
    /// arrives, so two cases' messages never interleave; the indicator
    /// cache is re-scoped and reloaded for the new case.
    pub async fn select_case(&self, case_id: CaseId) -> Result<(), SessionError> {
        let selected = self
            .lock()
            .cases
            .iter()
            .find(|c| c.id == case_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(format!("case {}", case_id)))?;

        {
            let mut state = self.lock();
            state.current_case = Some(selected);
            state.timeline.clear();
        }
        self.messages_feed.reset().await;

        loop {
            let page = self
                .messages_feed
                .load_page(|cursor, limit| {
                    let store = Arc::clone(&self.store);
                    async move { store.list_messages(case_id, limit, cursor.as_ref()).await }
                })
                .await
                .map_err(|e| SessionError::RemoteUnavailable(e.to_string()))?;

            let mut state = self.lock();
            // The user may have switched again while this page was in
            // flight; never interleave another case's messages.
            if state.current_case.as_ref().map(|c| c.id) != Some(case_id) {
                debug!(%case_id, "case changed during history load, discarding page");
                return Ok(());
            }
            state.timeline.extend(page.items);
            if !page.has_more {
                break;
            }
        }

        self.indicators
            .load(case_id)
            .await
            .map_err(|e| SessionError::RemoteUnavailable(e.to_string()))?;

        info!(%case_id, "case selected");
        Ok(())
    }

    /// Create a new active case and make it current
    ///
    /// Optimistic: the case appears in the list and becomes current before
    /// the remote create confirms; on remote failure the insertion is
    /// rolled back and the failure surfaces.
    pub async fn create_case(&self, title: &str) -> Result<Case, SessionError> {
        let user = self.require_identity()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::ValidationFailed("case title is empty".to_string()));
        }

        let case = Case::new(&user.uid, title);
        let local_id = case.id;
        {
            let mut state = self.lock();
            state.cases.insert(0, case.clone());
            state.current_case = Some(case.clone());
            state.timeline.clear();
        }
        self.indicators.attach(local_id);
        self.messages_feed.reset().await;

        match self.store.create_case(&case).await {
            Ok(remote_id) => {
                let created = {
                    let mut state = self.lock();
                    if let Some(entry) = state.cases.iter_mut().find(|c| c.id == local_id) {
                        entry.id = remote_id;
                    }
                    if let Some(current) = &mut state.current_case {
                        if current.id == local_id {
                            current.id = remote_id;
                        }
                    }
                    let mut created = case;
                    created.id = remote_id;
                    created
                };
                self.indicators.attach(remote_id);
                info!(case_id = %remote_id, "case created");
                Ok(created)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    state.cases.retain(|c| c.id != local_id);
                    if state.current_case.as_ref().map(|c| c.id) == Some(local_id) {
                        state.current_case = None;
                    }
                }
                self.indicators.clear();
                warn!(error = %e, "case create failed, rolled back");
                self.notifier.error("Failed to create case. Please try again.");
                Err(SessionError::RemoteUnavailable(e.to_string()))
            }
        }
    }

    /// Apply a partial update to a case
    ///
    /// The local edit is kept even when the remote write fails; the error
    /// is surfaced and the divergence resolves on the next reload.
    pub async fn update_case(&self, case_id: CaseId, patch: CasePatch) -> Result<(), SessionError> {
        self.require_identity()?;

        {
            let mut state = self.lock();
            let entry = state
                .cases
                .iter_mut()
                .find(|c| c.id == case_id)
                .ok_or_else(|| SessionError::NotFound(format!("case {}", case_id)))?;
            patch.apply(entry);
            if let Some(current) = &mut state.current_case {
                if current.id == case_id {
                    patch.apply(current);
                }
            }
        }

        if let Err(e) = self.store.update_case(case_id, &patch).await {
            warn!(%case_id, error = %e, "case update not persisted, local edit kept");
            self.notifier.warning("Case changes saved locally only.");
            return Err(SessionError::RemoteUnavailable(e.to_string()));
        }
        Ok(())
    }

    /// Fetch the next page of the owner's case history
    ///
    /// Returns the cases newly appended to the cached list.
    pub async fn load_more_cases(&self) -> Result<Vec<Case>, SessionError> {
        let user = self.require_identity()?;

        let page = self
            .cases_feed
            .load_page(|cursor, limit| {
                let store = Arc::clone(&self.store);
                let owner = user.uid.clone();
                async move { store.list_cases(&owner, limit, cursor.as_ref()).await }
            })
            .await
            .map_err(|e| SessionError::RemoteUnavailable(e.to_string()))?;

        let mut state = self.lock();
        // An optimistically created case may come back in a later page
        // under its reconciled id; skip anything already cached.
        let fresh: Vec<Case> = page
            .items
            .into_iter()
            .filter(|c| state.cases.iter().all(|have| have.id != c.id))
            .collect();
        state.cases.extend(fresh.iter().cloned());
        Ok(fresh)
    }

    /// Reload the case list from the beginning
    pub async fn reload_cases(&self) -> Result<Vec<Case>, SessionError> {
        self.cases_feed.reset().await;
        self.lock().cases.clear();
        self.load_more_cases().await
    }

    /// Clear all session state, e.g. when the identity provider reports
    /// sign-out
    pub async fn sign_out_reset(&self) {
        {
            let mut state = self.lock();
            *state = SessionState::default();
        }
        self.indicators.clear();
        self.cases_feed.reset().await;
        self.messages_feed.reset().await;
        info!("session state cleared");
    }

    // --- internals ---

    /// The active case, auto-creating a local one on first submission
    ///
    /// The auto-created case persists remotely only when an identity is
    /// present; an anonymous session keeps it local.
    async fn ensure_case(&self, user: Option<&UserIdentity>, narrative: &str) -> Case {
        let existing = self.lock().current_case.clone();
        if let Some(case) = existing {
            let patch = CasePatch {
                narrative: Some(narrative.to_string()),
                ..Default::default()
            };
            let mut state = self.lock();
            if let Some(current) = &mut state.current_case {
                patch.apply(current);
                return current.clone();
            }
            return case;
        }

        let owner = user.map(|u| u.uid.as_str()).unwrap_or("anonymous");
        let mut case = Case::new(owner, derive_title(narrative));
        case.narrative = narrative.to_string();
        let local_id = case.id;

        {
            let mut state = self.lock();
            state.cases.insert(0, case.clone());
            state.current_case = Some(case.clone());
        }
        self.indicators.attach(local_id);

        if user.is_some() {
            match self.store.create_case(&case).await {
                Ok(remote_id) if remote_id != local_id => {
                    let mut state = self.lock();
                    if let Some(entry) = state.cases.iter_mut().find(|c| c.id == local_id) {
                        entry.id = remote_id;
                    }
                    if let Some(current) = &mut state.current_case {
                        if current.id == local_id {
                            current.id = remote_id;
                        }
                    }
                    case.id = remote_id;
                    self.indicators.attach(remote_id);
                }
                Ok(_) => {}
                Err(e) => {
                    // Keep the local case: the narrative flow must not be
                    // blocked by a store outage.
                    warn!(error = %e, "auto-created case not persisted");
                }
            }
        }
        case
    }

    async fn persist_message(&self, message: &Message, signed_in: bool) {
        if !signed_in {
            return;
        }
        match self.store.create_message(message).await {
            Ok(remote_id) => {
                if remote_id != message.id {
                    let mut state = self.lock();
                    if let Some(entry) =
                        state.timeline.iter_mut().find(|m| m.id == message.id)
                    {
                        entry.id = remote_id;
                    }
                }
            }
            Err(e) => {
                // Keep-on-failure: the timeline entry stands, the store
                // catches up on the next history load.
                warn!(error = %e, "message not persisted");
            }
        }
    }

    fn require_identity(&self) -> Result<UserIdentity, SessionError> {
        self.identity.current_user().ok_or_else(|| {
            SessionError::PreconditionFailed("no authenticated identity".to_string())
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Turn extracted indicators into cache entities with defaults applied
fn materialize(
    case_id: CaseId,
    kind: IndicatorKind,
    extracted: Vec<ExtractedIndicator>,
) -> Vec<Indicator> {
    extracted
        .into_iter()
        .map(|e| {
            let mut draft = IndicatorDraft::new(kind, e.description);
            draft.category = e.category;
            draft.source = Some(ANALYSIS_SOURCE.to_string());
            if let Some(weight) = e.weight {
                draft.weight = weight;
            }
            if let Some(score) = e.score {
                draft.score = score;
            }
            draft.confidence = e.confidence;
            Indicator::from_draft(case_id, draft)
        })
        .collect()
}

fn derive_title(narrative: &str) -> String {
    let first_line = narrative.lines().next().unwrap_or(narrative);
    first_line.chars().take(TITLE_MAX_CHARS).collect()
}
